use std::string::FromUtf8Error;
use std::time::UNIX_EPOCH;
use axum::http::HeaderMap;
use axum_extra::headers::{Cookie, HeaderMapExt};
use chrono::{DateTime, TimeDelta, Utc};
use log::warn;
use thiserror::Error;
use crate::config::MAX_COOKIE_DAYS;
use crate::model::{is_valid_coordinate_pair, Accuracy, Location, SavedLocation};

#[derive(Debug, Error)]
pub enum SavedLocationError {
	#[error(transparent)]
	Decode(#[from] FromUtf8Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error("Coordinates out of range")]
	InvalidCoordinates,
}

/// Reads and writes the cookie holding a location the user confirmed.
///
/// A location read back from the cookie is always [`Accuracy::Precise`]:
/// the user picked it, so it is trusted for the cookie's whole lifetime.
#[derive(Debug, Clone)]
pub struct SavedLocationCodec {
	cookie_name: String,
	lifetime: TimeDelta,
}

impl SavedLocationCodec {
	pub fn new(cookie_name: impl Into<String>, lifetime_days: i64) -> Self {
		Self {
			cookie_name: cookie_name.into(),
			lifetime: TimeDelta::days(lifetime_days.clamp(0, MAX_COOKIE_DAYS)),
		}
	}

	pub fn decode(&self, headers: &HeaderMap) -> Option<Location> {
		let cookie = headers.typed_get::<Cookie>()?;
		let value = cookie.get(&self.cookie_name)?;
		match Self::decode_value(value) {
			Ok(location) => Some(location),
			Err(err) => {
				warn!("Ignoring malformed {} cookie: {err}", self.cookie_name);
				None
			}
		}
	}

	pub fn decode_value(value: &str) -> Result<Location, SavedLocationError> {
		let json = urlencoding::decode(value)?;
		let saved: SavedLocation = serde_json::from_str(&json)?;
		if !is_valid_coordinate_pair(saved.lat, saved.lng) {
			return Err(SavedLocationError::InvalidCoordinates);
		}
		Ok(Location {
			lat: saved.lat,
			lng: saved.lng,
			city: saved.city,
			state: saved.state,
			country: saved.country,
			accuracy: Accuracy::Precise,
		})
	}

	pub fn encode(&self, location: &Location) -> String {
		self.encode_at(location, Utc::now())
	}

	pub fn encode_at(&self, location: &Location, now: DateTime<Utc>) -> String {
		// Serializing plain floats and strings cannot fail.
		let json = serde_json::to_string(&SavedLocation::from(location)).unwrap_or_default();
		let expires = httpdate::fmt_http_date((now + self.lifetime).into());
		format!(
			"{}={}; Path=/; Expires={expires}; SameSite=Lax; Secure",
			self.cookie_name,
			urlencoding::encode(&json),
		)
	}

	pub fn clear(&self) -> String {
		format!(
			"{}=; Path=/; Expires={}; SameSite=Lax; Secure",
			self.cookie_name,
			httpdate::fmt_http_date(UNIX_EPOCH),
		)
	}
}
