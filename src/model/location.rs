use serde::{Deserialize, Serialize};

/// Confidence tier of a [`Location`], ordered from least to most precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accuracy {
	Default,
	Country,
	Region,
	City,
	Precise,
}

impl Accuracy {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Default => "default",
			Self::Country => "country",
			Self::Region => "region",
			Self::City => "city",
			Self::Precise => "precise",
		}
	}
}

/// A resolved geographic position. Strategies never mutate one in place;
/// they build a new value, see [`Location::with_accuracy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
	pub lat: f64,
	pub lng: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	pub accuracy: Accuracy,
}

impl Location {
	/// Clearwater, FL. Served when every other strategy comes up empty.
	pub fn fallback() -> Self {
		Self {
			lat: 27.9506,
			lng: -82.4572,
			city: Some("Clearwater".to_owned()),
			state: Some("FL".to_owned()),
			country: Some("US".to_owned()),
			accuracy: Accuracy::Default,
		}
	}

	pub fn with_accuracy(self, accuracy: Accuracy) -> Self {
		Self {
			accuracy,
			..self
		}
	}
}

pub fn is_valid_coordinate_pair(lat: f64, lng: f64) -> bool {
	lat.is_finite() && lng.is_finite()
		&& (-90.0..=90.0).contains(&lat)
		&& (-180.0..=180.0).contains(&lng)
}

/// A catalog entry. Owned by the catalog, read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
	pub slug: String,
	pub city: String,
	pub state: String,
	pub lat: f64,
	pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityDistance {
	pub slug: String,
	pub distance_miles: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
	Exact,
	NarrowRadius,
	WideRadius,
	Default,
}

impl MatchStage {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Exact => "exact",
			Self::NarrowRadius => "narrow",
			Self::WideRadius => "wide",
			Self::Default => "default",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityMatch {
	pub slug: String,
	pub stage: MatchStage,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance_miles: Option<f64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accuracy_tiers_are_ordered() {
		assert!(Accuracy::Precise > Accuracy::City);
		assert!(Accuracy::City > Accuracy::Region);
		assert!(Accuracy::Region > Accuracy::Country);
		assert!(Accuracy::Country > Accuracy::Default);
	}

	#[test]
	fn with_accuracy_keeps_other_fields() {
		let location = Location::fallback().with_accuracy(Accuracy::Precise);
		assert_eq!(location.accuracy, Accuracy::Precise);
		assert_eq!(location.city.as_deref(), Some("Clearwater"));
		assert_eq!(location.lat, 27.9506);
	}

	#[test]
	fn serializes_accuracy_lowercase_and_skips_missing_fields() {
		let location = Location {
			lat: 1.0,
			lng: 2.0,
			city: None,
			state: None,
			country: Some("US".to_owned()),
			accuracy: Accuracy::City,
		};
		let json = serde_json::to_value(&location).unwrap();
		assert_eq!(json, serde_json::json!({
			"lat": 1.0,
			"lng": 2.0,
			"country": "US",
			"accuracy": "city",
		}));
	}

	#[test]
	fn rejects_out_of_range_coordinates() {
		assert!(is_valid_coordinate_pair(40.7, -74.0));
		assert!(!is_valid_coordinate_pair(91.0, 0.0));
		assert!(!is_valid_coordinate_pair(0.0, -180.5));
		assert!(!is_valid_coordinate_pair(f64::NAN, 0.0));
	}
}
