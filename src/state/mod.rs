mod cache;
mod catalog;
mod geolocation;
mod matcher;
mod resolver;
mod timezones;

pub use cache::*;
pub use catalog::*;
pub use geolocation::*;
pub use matcher::*;
pub use resolver::*;
pub use timezones::*;

use std::sync::Arc;
use reqwest::Client;
use crate::config::AppConfig;
use crate::extractors::SavedLocationCodec;

pub struct AppState {
	pub config: Arc<AppConfig>,
	pub cache: Arc<LocationCache>,
	pub resolver: Arc<LocationResolver>,
	pub catalog: Arc<InMemoryCatalog>,
	pub matcher: Arc<CommunityMatcher>,
}

impl AppState {
	pub fn new(config: Arc<AppConfig>) -> Result<Arc<Self>, CatalogError> {
		let catalog = match &config.catalog_path {
			Some(path) => InMemoryCatalog::load(path, config.catalog_tie_break)?,
			None => InMemoryCatalog::new(Vec::new(), config.catalog_tie_break),
		};
		Ok(Self::with_catalog(config, catalog))
	}

	pub fn with_catalog(config: Arc<AppConfig>, catalog: Arc<InMemoryCatalog>) -> Arc<Self> {
		let client = Client::new();
		let cache = LocationCache::new(config.cache_ttl, config.cache_high_water);
		let geolocation = IpGeolocationClient::from_config(&config, client);
		let timezones = config.timezone_fallback.then(TimezoneService::new);
		let resolver = LocationResolver::new(
			SavedLocationCodec::new(config.cookie_name.clone(), config.cookie_days),
			cache.clone(),
			geolocation,
			timezones,
		);
		let matcher = CommunityMatcher::new(
			catalog.clone(),
			config.search_radii_miles.clone(),
			config.default_community.clone(),
		);

		Arc::new(Self {
			config,
			cache,
			resolver,
			catalog,
			matcher,
		})
	}
}
