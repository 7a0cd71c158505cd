use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use ahash::AHashMap;
use chrono::Utc;
use log::debug;
use crate::model::Location;

pub trait Clock: Send + Sync {
	fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_millis(&self) -> i64 {
		Utc::now().timestamp_millis()
	}
}

#[derive(Debug, Clone)]
struct CacheEntry {
	location: Location,
	expires_at_millis: i64,
}

/// IP address to [`Location`] cache shared by every request.
///
/// Expired entries are dropped lazily on `get`. A full sweep only happens
/// from `put`, once the map grows past the high-water mark.
pub struct LocationCache {
	entries: Mutex<AHashMap<String, CacheEntry>>,
	ttl_millis: i64,
	high_water: usize,
	clock: Arc<dyn Clock>,
}

impl LocationCache {
	pub fn new(ttl: Duration, high_water: usize) -> Arc<Self> {
		Self::with_clock(ttl, high_water, Arc::new(SystemClock))
	}

	pub fn with_clock(ttl: Duration, high_water: usize, clock: Arc<dyn Clock>) -> Arc<Self> {
		Arc::new(Self {
			entries: Mutex::new(AHashMap::new()),
			ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
			high_water,
			clock,
		})
	}

	fn lock(&self) -> MutexGuard<'_, AHashMap<String, CacheEntry>> {
		// A panic while holding the lock cannot leave an entry half-written.
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn get(&self, ip: &str) -> Option<Location> {
		let now = self.clock.now_millis();
		let mut entries = self.lock();
		let entry = entries.get(ip)?;
		if now > entry.expires_at_millis {
			entries.remove(ip);
			debug!("Cached location for {ip} expired");
			return None;
		}
		Some(entry.location.clone())
	}

	pub fn put(&self, ip: &str, location: Location) {
		let now = self.clock.now_millis();
		let mut entries = self.lock();
		entries.insert(ip.to_owned(), CacheEntry {
			location,
			expires_at_millis: now.saturating_add(self.ttl_millis),
		});
		if entries.len() > self.high_water {
			let before = entries.len();
			entries.retain(|_, entry| entry.expires_at_millis >= now);
			debug!("Swept {} expired cache entries", before - entries.len());
		}
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
