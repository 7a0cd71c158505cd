use std::sync::Arc;
use log::{debug, error};
use crate::model::{CommunityDistance, CommunityMatch, Location, MatchStage};
use crate::state::{CatalogError, CommunityCatalog};

/// Attaches a [`Location`] to a community: exact city/state first, then
/// nearest within each search radius in turn, then the default slug.
pub struct CommunityMatcher {
	catalog: Arc<dyn CommunityCatalog>,
	radii_miles: Vec<f64>,
	default_slug: String,
}

impl CommunityMatcher {
	pub fn new(
		catalog: Arc<dyn CommunityCatalog>,
		radii_miles: Vec<f64>,
		default_slug: impl Into<String>,
	) -> Arc<Self> {
		Arc::new(Self {
			catalog,
			radii_miles,
			default_slug: default_slug.into(),
		})
	}

	/// Never fails; a broken catalog degrades to the default slug.
	pub fn match_community(&self, location: &Location) -> String {
		match self.try_match(location) {
			Ok(found) => found.slug,
			Err(err) => {
				error!("Community lookup failed, using {}: {err}", self.default_slug);
				self.default_slug.clone()
			}
		}
	}

	pub fn try_match(&self, location: &Location) -> Result<CommunityMatch, CatalogError> {
		let found = self.find(location)?;
		metrics::counter!("community_matches_total", "stage" => found.stage.as_str()).increment(1);
		Ok(found)
	}

	fn find(&self, location: &Location) -> Result<CommunityMatch, CatalogError> {
		if let (Some(city), Some(state)) = (&location.city, &location.state)
			&& let Some(slug) = self.catalog.find_exact(city, state)?
		{
			debug!("Exact community match for {city}, {state}: {slug}");
			return Ok(CommunityMatch {
				slug,
				stage: MatchStage::Exact,
				distance_miles: None,
			});
		}
		for (i, &radius) in self.radii_miles.iter().enumerate() {
			let results = self.catalog.find_nearest(location.lat, location.lng, radius)?;
			let Some(nearest) = Self::nearest(&results, radius)? else {
				debug!("No community within {radius} miles of ({}, {})", location.lat, location.lng);
				continue;
			};
			debug!("Nearest community: {} ({:.0} miles away)", nearest.slug, nearest.distance_miles);
			return Ok(CommunityMatch {
				slug: nearest.slug.clone(),
				stage: if i == 0 { MatchStage::NarrowRadius } else { MatchStage::WideRadius },
				distance_miles: Some(nearest.distance_miles),
			});
		}
		debug!("Using default community {}", self.default_slug);
		Ok(CommunityMatch {
			slug: self.default_slug.clone(),
			stage: MatchStage::Default,
			distance_miles: None,
		})
	}

	/// First entry with the smallest distance, so equal distances keep the
	/// catalog's own order.
	fn nearest(
		results: &[CommunityDistance],
		radius: f64,
	) -> Result<Option<&CommunityDistance>, CatalogError> {
		if let Some(bad) = results.iter().find(|r| {
			r.distance_miles.is_nan() || r.distance_miles < 0.0 || r.distance_miles > radius
		}) {
			return Err(CatalogError::ContractViolation(format!(
				"{} reported at {} miles for a {radius} mile query",
				bad.slug,
				bad.distance_miles,
			)));
		}
		Ok(results.iter().min_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles)))
	}
}
