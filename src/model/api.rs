use serde::{Deserialize, Serialize};
use crate::model::{CommunityMatch, Location, MatchStage};

#[derive(Debug, Clone, Serialize)]
pub struct LocatorStatus {
	pub cached_locations: usize,
	pub communities: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IpDetectResult {
	pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationResult {
	pub location: Location,
	pub community: String,
}

/// Body of `PUT /api/location`. Same fields as the saved-location cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLocation {
	pub lat: f64,
	pub lng: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
}

impl From<&Location> for SavedLocation {
	fn from(location: &Location) -> Self {
		Self {
			lat: location.lat,
			lng: location.lng,
			city: location.city.clone(),
			state: location.state.clone(),
			country: location.country.clone(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommunityMatchQuery {
	pub lat: f64,
	pub lng: f64,
	pub city: Option<String>,
	pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommunityMatchResult {
	pub community: String,
	pub stage: MatchStage,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance_miles: Option<f64>,
}

impl From<CommunityMatch> for CommunityMatchResult {
	fn from(found: CommunityMatch) -> Self {
		Self {
			community: found.slug,
			stage: found.stage,
			distance_miles: found.distance_miles,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogReloadResult {
	pub communities: usize,
}
