use std::sync::Arc;
use ahash::AHashMap;
use axum::http::HeaderMap;
use crate::model::{Accuracy, Location};

pub const TIMEZONE_HEADER: &str = "x-timezone";

const ZONES: &[(&str, f64, f64, &str, &str)] = &[
	("America/New_York", 40.7128, -74.0060, "New York", "NY"),
	("America/Chicago", 41.8781, -87.6298, "Chicago", "IL"),
	("America/Denver", 39.7392, -104.9903, "Denver", "CO"),
	("America/Los_Angeles", 34.0522, -118.2437, "Los Angeles", "CA"),
	("America/Phoenix", 33.4484, -112.0740, "Phoenix", "AZ"),
	("America/Detroit", 42.3314, -83.0458, "Detroit", "MI"),
	("America/Indiana/Indianapolis", 39.7684, -86.1581, "Indianapolis", "IN"),
	("America/Kentucky/Louisville", 38.2527, -85.7585, "Louisville", "KY"),
	("America/Anchorage", 61.2181, -149.9003, "Anchorage", "AK"),
	("Pacific/Honolulu", 21.3099, -157.8581, "Honolulu", "HI"),
];

/// Rough placement from an IANA timezone the browser reported.
pub struct TimezoneService {
	zones: AHashMap<&'static str, Location>,
}

impl TimezoneService {
	pub fn new() -> Arc<Self> {
		let zones = ZONES.iter()
			.map(|&(zone, lat, lng, city, state)| (zone, Location {
				lat,
				lng,
				city: Some(city.to_owned()),
				state: Some(state.to_owned()),
				country: Some("US".to_owned()),
				accuracy: Accuracy::Region,
			}))
			.collect();
		Arc::new(Self {
			zones,
		})
	}

	pub fn lookup(&self, zone: &str) -> Option<Location> {
		self.zones.get(zone.trim()).cloned()
	}

	pub fn lookup_headers(&self, headers: &HeaderMap) -> Option<Location> {
		let zone = headers.get(TIMEZONE_HEADER)?.to_str().ok()?;
		self.lookup(zone)
	}
}
