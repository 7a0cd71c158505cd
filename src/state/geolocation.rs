use std::sync::Arc;
use std::time::Duration;
use log::{debug, warn};
use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use crate::config::{AppConfig, PROVIDER_URL_IP_PLACEHOLDER, USER_AGENT};
use crate::model::{is_valid_coordinate_pair, Accuracy, IpApiCoResponse, IpApiComResponse, Location};

#[derive(Debug, Error)]
pub enum GeoProviderError {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),

	#[error("HTTP error (status={0})")]
	HttpError(StatusCode),

	#[error("Lookup rejected: {0}")]
	Rejected(String),

	#[error("Response has no coordinates")]
	MissingCoordinates,

	#[error("Coordinates out of range ({0}, {1})")]
	InvalidCoordinates(f64, f64),
}

fn checked_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(f64, f64), GeoProviderError> {
	let (Some(lat), Some(lng)) = (lat, lng) else {
		return Err(GeoProviderError::MissingCoordinates);
	};
	if !is_valid_coordinate_pair(lat, lng) {
		return Err(GeoProviderError::InvalidCoordinates(lat, lng));
	}
	Ok((lat, lng))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoProviderKind {
	/// ipapi.co
	IpApiCo,
	/// ip-api.com
	IpApiCom,
}

impl GeoProviderKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::IpApiCo => "ipapi.co",
			Self::IpApiCom => "ip-api.com",
		}
	}
}

#[derive(Debug, Clone)]
pub struct GeoProvider {
	pub kind: GeoProviderKind,
	pub url_template: String,
	pub timeout: Duration,
}

impl GeoProvider {
	fn url(&self, ip: &str) -> String {
		self.url_template.replace(PROVIDER_URL_IP_PLACEHOLDER, ip)
	}
}

/// Looks an IP address up against each provider in turn until one answers.
///
/// Failures are logged and swallowed; running out of providers is a normal
/// outcome, not an error. No caching happens here.
pub struct IpGeolocationClient {
	client: Client,
	providers: Vec<GeoProvider>,
}

impl IpGeolocationClient {
	pub fn new(client: Client, providers: Vec<GeoProvider>) -> Arc<Self> {
		Arc::new(Self {
			client,
			providers,
		})
	}

	pub fn from_config(config: &AppConfig, client: Client) -> Arc<Self> {
		Self::new(client, vec![
			GeoProvider {
				kind: GeoProviderKind::IpApiCo,
				url_template: config.primary_provider_url.clone(),
				timeout: config.primary_provider_timeout,
			},
			GeoProvider {
				kind: GeoProviderKind::IpApiCom,
				url_template: config.secondary_provider_url.clone(),
				timeout: config.secondary_provider_timeout,
			},
		])
	}

	pub async fn lookup(&self, ip: &str, country_hint: Option<&str>) -> Option<Location> {
		for provider in &self.providers {
			match self.lookup_with(provider, ip).await {
				Ok(mut location) => {
					if location.country.is_none() {
						location.country = country_hint.map(str::to_owned);
					}
					debug!("Located {ip} via {}", provider.kind.as_str());
					return Some(location);
				}
				Err(err) => {
					warn!("Geolocation provider {} failed for {ip}: {err}", provider.kind.as_str());
					metrics::counter!(
						"geolocation_provider_failures_total",
						"provider" => provider.kind.as_str()
					).increment(1);
				}
			}
		}
		None
	}

	async fn lookup_with(
		&self,
		provider: &GeoProvider,
		ip: &str,
	) -> Result<Location, GeoProviderError> {
		let res = self.client.get(provider.url(ip))
			.header(header::USER_AGENT, USER_AGENT)
			.timeout(provider.timeout)
			.send()
			.await?;
		if !res.status().is_success() {
			return Err(GeoProviderError::HttpError(res.status()));
		}
		match provider.kind {
			GeoProviderKind::IpApiCo => Self::normalize_ipapi_co(res.json().await?),
			GeoProviderKind::IpApiCom => Self::normalize_ip_api_com(res.json().await?),
		}
	}

	fn normalize_ipapi_co(res: IpApiCoResponse) -> Result<Location, GeoProviderError> {
		if res.error {
			return Err(GeoProviderError::Rejected(
				res.reason.unwrap_or_else(|| "unknown reason".to_owned()),
			));
		}
		let (lat, lng) = checked_coordinates(res.latitude, res.longitude)?;
		Ok(Location {
			lat,
			lng,
			city: res.city,
			state: res.region_code.or(res.region),
			country: res.country_code,
			accuracy: Accuracy::City,
		})
	}

	fn normalize_ip_api_com(res: IpApiComResponse) -> Result<Location, GeoProviderError> {
		if res.status.as_deref() != Some("success") {
			return Err(GeoProviderError::Rejected(
				res.message.unwrap_or_else(|| "unknown reason".to_owned()),
			));
		}
		let (lat, lng) = checked_coordinates(res.lat, res.lon)?;
		Ok(Location {
			lat,
			lng,
			city: res.city,
			state: res.region.or(res.region_name),
			country: res.country_code,
			accuracy: Accuracy::City,
		})
	}
}
