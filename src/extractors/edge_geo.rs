use axum::http::HeaderMap;
use crate::model::{is_valid_coordinate_pair, Accuracy, Location};

pub const COUNTRY_HEADER: &str = "cf-ipcountry";
pub const CITY_HEADER: &str = "cf-ipcity";
pub const REGION_HEADER: &str = "cf-region";
pub const LATITUDE_HEADER: &str = "cf-iplatitude";
pub const LONGITUDE_HEADER: &str = "cf-iplongitude";

/// What the edge network told us about the caller.
///
/// Country is sent on every plan, coordinates only on the higher tiers.
/// Country alone is not enough to place someone, so it travels on as a hint
/// for the IP lookup instead of becoming a [`Location`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeGeo {
	pub location: Option<Location>,
	pub country_hint: Option<String>,
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
	headers.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
		.filter(|v| !v.is_empty())
		.map(str::to_owned)
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
	headers.get(name)
		.and_then(|v| v.to_str().ok())
		.and_then(|v| v.trim().parse::<f64>().ok())
}

pub fn read_edge_geo(headers: &HeaderMap) -> EdgeGeo {
	let country = header_string(headers, COUNTRY_HEADER);
	let lat = header_f64(headers, LATITUDE_HEADER);
	let lng = header_f64(headers, LONGITUDE_HEADER);
	match (lat, lng) {
		(Some(lat), Some(lng)) if is_valid_coordinate_pair(lat, lng) => EdgeGeo {
			location: Some(Location {
				lat,
				lng,
				city: header_string(headers, CITY_HEADER),
				state: header_string(headers, REGION_HEADER),
				country,
				accuracy: Accuracy::City,
			}),
			country_hint: None,
		},
		_ => EdgeGeo {
			location: None,
			country_hint: country,
		},
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;
	use super::*;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut headers = HeaderMap::new();
		for (name, value) in pairs {
			headers.insert(*name, HeaderValue::from_static(*value));
		}
		headers
	}

	#[test]
	fn builds_location_from_enterprise_headers() {
		let geo = read_edge_geo(&headers(&[
			("cf-iplatitude", "40.7"),
			("cf-iplongitude", "-74.0"),
			("cf-ipcity", "New York"),
			("cf-region", "NY"),
			("cf-ipcountry", "US"),
		]));
		let location = geo.location.expect("location");
		assert_eq!(location.lat, 40.7);
		assert_eq!(location.lng, -74.0);
		assert_eq!(location.city.as_deref(), Some("New York"));
		assert_eq!(location.state.as_deref(), Some("NY"));
		assert_eq!(location.country.as_deref(), Some("US"));
		assert_eq!(location.accuracy, Accuracy::City);
		assert_eq!(geo.country_hint, None);
	}

	#[test]
	fn coordinates_without_city_are_enough() {
		let geo = read_edge_geo(&headers(&[
			("cf-iplatitude", "51.5"),
			("cf-iplongitude", "-0.12"),
		]));
		let location = geo.location.expect("location");
		assert_eq!(location.city, None);
		assert_eq!(location.country, None);
	}

	#[test]
	fn country_only_becomes_a_hint() {
		let geo = read_edge_geo(&headers(&[("cf-ipcountry", "US")]));
		assert_eq!(geo.location, None);
		assert_eq!(geo.country_hint.as_deref(), Some("US"));
	}

	#[test]
	fn unparsable_coordinates_are_ignored() {
		let geo = read_edge_geo(&headers(&[
			("cf-iplatitude", "north"),
			("cf-iplongitude", "-74.0"),
			("cf-ipcountry", "CA"),
		]));
		assert_eq!(geo.location, None);
		assert_eq!(geo.country_hint.as_deref(), Some("CA"));

		let geo = read_edge_geo(&headers(&[
			("cf-iplatitude", "123.0"),
			("cf-iplongitude", "-74.0"),
		]));
		assert_eq!(geo, EdgeGeo::default());
	}
}
