use std::env;
use std::fmt::{Debug, Display};
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const PROVIDER_URL_IP_PLACEHOLDER: &str = "{ip}";
const PRIMARY_PROVIDER_URL: &str = "https://ipapi.co/{ip}/json/";
const SECONDARY_PROVIDER_URL: &str = "http://ip-api.com/json/{ip}\
	?fields=status,message,country,countryCode,region,regionName,city,lat,lon";
const DEFAULT_COMMUNITY: &str = "clearwater";
const DEFAULT_COOKIE_NAME: &str = "wtf_location";
pub const MAX_COOKIE_DAYS: i64 = 3650;
const MAX_CACHE_TTL_HOURS: u64 = 24 * 366;
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
	CatalogOrder,
	Slug,
}

impl FromStr for TieBreak {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"catalog" => Ok(Self::CatalogOrder),
			"slug" => Ok(Self::Slug),
			other => Err(format!("unknown tie-break {other:?}")),
		}
	}
}

#[derive(Debug, Clone)]
pub struct AppConfig {
	pub listen_addr: SocketAddr,
	pub api_key: Option<String>,
	pub catalog_path: Option<PathBuf>,
	pub catalog_tie_break: TieBreak,
	pub default_community: String,
	pub search_radii_miles: Vec<f64>,
	pub cookie_name: String,
	pub cookie_days: i64,
	pub cache_ttl: Duration,
	pub cache_high_water: usize,
	pub primary_provider_url: String,
	pub primary_provider_timeout: Duration,
	pub secondary_provider_url: String,
	pub secondary_provider_timeout: Duration,
	pub timezone_fallback: bool,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
			api_key: None,
			catalog_path: None,
			catalog_tie_break: TieBreak::CatalogOrder,
			default_community: DEFAULT_COMMUNITY.to_owned(),
			search_radii_miles: vec![100.0, 300.0],
			cookie_name: DEFAULT_COOKIE_NAME.to_owned(),
			cookie_days: 30,
			cache_ttl: Duration::from_secs(24 * 60 * 60),
			cache_high_water: 1000,
			primary_provider_url: PRIMARY_PROVIDER_URL.to_owned(),
			primary_provider_timeout: Duration::from_millis(3000),
			secondary_provider_url: SECONDARY_PROVIDER_URL.to_owned(),
			secondary_provider_timeout: Duration::from_millis(2000),
			timezone_fallback: false,
		}
	}
}

impl AppConfig {
	pub fn load_from_env() -> Arc<Self> {
		let defaults = Self::default();
		let listen_addr = env_parse("LISTEN_ADDR").unwrap_or(defaults.listen_addr);
		let api_key = env::var("API_KEY").ok().filter(|key| !key.is_empty());
		let catalog_path = env::var("CATALOG_PATH").ok().map(PathBuf::from);
		let catalog_tie_break = env_parse("CATALOG_TIE_BREAK")
			.unwrap_or(defaults.catalog_tie_break);
		let default_community = env::var("DEFAULT_COMMUNITY").ok()
			.unwrap_or(defaults.default_community);
		let search_radii_miles = env::var("SEARCH_RADII_MILES").ok()
			.map(|radii| radii
				.split(',')
				.map(str::trim)
				.map(|radius| radius.parse::<f64>()
					.expect("SEARCH_RADII_MILES must be a comma-separated list of numbers"))
				.collect())
			.unwrap_or(defaults.search_radii_miles);
		let cookie_name = env::var("LOCATION_COOKIE_NAME").ok()
			.unwrap_or(defaults.cookie_name);
		let cookie_days = env_parse("LOCATION_COOKIE_DAYS")
			.map(|days| bounded("LOCATION_COOKIE_DAYS", days, 0..=MAX_COOKIE_DAYS))
			.unwrap_or(defaults.cookie_days);
		let cache_ttl = env_parse::<u64>("CACHE_TTL_HOURS")
			.map(|hours| bounded("CACHE_TTL_HOURS", hours, 0..=MAX_CACHE_TTL_HOURS))
			.map(|hours| Duration::from_secs(hours * 60 * 60))
			.unwrap_or(defaults.cache_ttl);
		let cache_high_water = env_parse("CACHE_HIGH_WATER").unwrap_or(defaults.cache_high_water);
		let primary_provider_url = env::var("PRIMARY_PROVIDER_URL").ok()
			.unwrap_or(defaults.primary_provider_url);
		let primary_provider_timeout = env_parse("PRIMARY_PROVIDER_TIMEOUT_MS")
			.map(Duration::from_millis)
			.unwrap_or(defaults.primary_provider_timeout);
		let secondary_provider_url = env::var("SECONDARY_PROVIDER_URL").ok()
			.unwrap_or(defaults.secondary_provider_url);
		let secondary_provider_timeout = env_parse("SECONDARY_PROVIDER_TIMEOUT_MS")
			.map(Duration::from_millis)
			.unwrap_or(defaults.secondary_provider_timeout);
		let timezone_fallback = env_parse("TIMEZONE_FALLBACK").unwrap_or(defaults.timezone_fallback);

		Arc::new(Self {
			listen_addr,
			api_key,
			catalog_path,
			catalog_tie_break,
			default_community,
			search_radii_miles,
			cookie_name,
			cookie_days,
			cache_ttl,
			cache_high_water,
			primary_provider_url,
			primary_provider_timeout,
			secondary_provider_url,
			secondary_provider_timeout,
			timezone_fallback,
		})
	}
}

fn env_parse<T>(name: &str) -> Option<T>
where
	T: FromStr,
	T::Err: Debug,
{
	let value = env::var(name).ok()?;
	match value.trim().parse() {
		Ok(value) => Some(value),
		Err(err) => panic!("{name} has an invalid value {value:?}: {err:?}"),
	}
}

fn bounded<T: PartialOrd + Display>(name: &str, value: T, range: RangeInclusive<T>) -> T {
	if !range.contains(&value) {
		panic!("{name} must be between {} and {}, got {value}", range.start(), range.end());
	}
	value
}
