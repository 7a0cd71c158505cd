use std::sync::Arc;
use axum::http::HeaderMap;
use log::debug;
use crate::extractors::{extract_client_ip, is_loopback, read_edge_geo, SavedLocationCodec};
use crate::model::{Accuracy, Location};
use crate::state::{IpGeolocationClient, LocationCache, TimezoneService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
	Saved,
	Edge,
	Cache,
	Lookup,
	Timezone,
	Default,
}

impl LocationSource {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Saved => "saved",
			Self::Edge => "edge",
			Self::Cache => "cache",
			Self::Lookup => "lookup",
			Self::Timezone => "timezone",
			Self::Default => "default",
		}
	}
}

/// State handed from one strategy to the next within a single resolve.
#[derive(Debug, Default)]
struct ResolveContext {
	country_hint: Option<String>,
}

/// Turns request headers into a [`Location`]. Strategies run in a fixed
/// order and the first one that produces something wins:
/// saved cookie, edge headers, IP lookup (cached), then the fallback city.
pub struct LocationResolver {
	codec: SavedLocationCodec,
	cache: Arc<LocationCache>,
	geolocation: Arc<IpGeolocationClient>,
	timezones: Option<Arc<TimezoneService>>,
}

impl LocationResolver {
	pub fn new(
		codec: SavedLocationCodec,
		cache: Arc<LocationCache>,
		geolocation: Arc<IpGeolocationClient>,
		timezones: Option<Arc<TimezoneService>>,
	) -> Arc<Self> {
		Arc::new(Self {
			codec,
			cache,
			geolocation,
			timezones,
		})
	}

	pub fn codec(&self) -> &SavedLocationCodec {
		&self.codec
	}

	/// Always produces a location; strategy failures fall through silently.
	pub async fn resolve(&self, headers: &HeaderMap) -> Location {
		self.resolve_with_source(headers).await.0
	}

	pub async fn resolve_with_source(&self, headers: &HeaderMap) -> (Location, LocationSource) {
		let (location, source) = self.run_strategies(headers).await;
		debug!(
			"Resolved {} location via {} (lat={}, lng={}, city={:?}, state={:?})",
			location.accuracy.as_str(),
			source.as_str(),
			location.lat,
			location.lng,
			location.city,
			location.state,
		);
		metrics::counter!("location_resolutions_total", "strategy" => source.as_str()).increment(1);
		(location, source)
	}

	async fn run_strategies(&self, headers: &HeaderMap) -> (Location, LocationSource) {
		if let Some(location) = self.codec.decode(headers) {
			return (location.with_accuracy(Accuracy::Precise), LocationSource::Saved);
		}
		let mut ctx = ResolveContext::default();
		let edge = read_edge_geo(headers);
		if let Some(location) = edge.location {
			return (location.with_accuracy(Accuracy::City), LocationSource::Edge);
		}
		if let Some(country) = edge.country_hint {
			debug!("Edge network reports country {country}");
			ctx.country_hint = Some(country);
		}
		if let Some(found) = self.locate_ip(headers, &ctx).await {
			return found;
		}
		if let Some(timezones) = &self.timezones
			&& let Some(location) = timezones.lookup_headers(headers)
		{
			return (location.with_accuracy(Accuracy::Region), LocationSource::Timezone);
		}
		(Location::fallback(), LocationSource::Default)
	}

	async fn locate_ip(
		&self,
		headers: &HeaderMap,
		ctx: &ResolveContext,
	) -> Option<(Location, LocationSource)> {
		let Some(ip) = extract_client_ip(headers) else {
			debug!("No valid client IP, skipping geolocation");
			return None;
		};
		if is_loopback(&ip) {
			debug!("Local IP {ip} detected, skipping geolocation");
			return None;
		}
		if let Some(location) = self.cache.get(&ip) {
			return Some((location, LocationSource::Cache));
		}
		let location = self.geolocation
			.lookup(&ip, ctx.country_hint.as_deref())
			.await?
			.with_accuracy(Accuracy::City);
		self.cache.put(&ip, location.clone());
		Some((location, LocationSource::Lookup))
	}
}
