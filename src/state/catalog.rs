use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use arc_swap::ArcSwap;
use log::info;
use serde::Deserialize;
use thiserror::Error;
use crate::config::TieBreak;
use crate::model::{Community, CommunityDistance};

const EARTH_RADIUS_MILES: f64 = 3958.8;

#[derive(Debug, Error)]
pub enum CatalogError {
	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Yaml(#[from] serde_yaml::Error),

	#[error("Catalog contract violation: {0}")]
	ContractViolation(String),

	#[error("No catalog file configured")]
	NoSource,
}

/// Read side of the community catalog.
///
/// `find_nearest` returns communities within `max_distance_miles`, nearest
/// first. Equidistant entries keep whatever order the implementation
/// chooses; callers must not impose their own.
pub trait CommunityCatalog: Send + Sync {
	fn find_exact(&self, city: &str, state: &str) -> Result<Option<String>, CatalogError>;

	fn find_nearest(
		&self,
		lat: f64,
		lng: f64,
		max_distance_miles: f64,
	) -> Result<Vec<CommunityDistance>, CatalogError>;

	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
	#[serde(default)]
	communities: Vec<Community>,
}

/// Great-circle distance in miles.
pub fn haversine_miles(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
	let lat1_rad = lat1.to_radians();
	let lat2_rad = lat2.to_radians();
	let delta_lat = (lat2 - lat1).to_radians();
	let delta_lng = (lng2 - lng1).to_radians();
	let a = (delta_lat / 2.0).sin().powi(2)
		+ lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
	let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
	EARTH_RADIUS_MILES * c
}

/// Catalog held in memory and swapped wholesale on reload.
pub struct InMemoryCatalog {
	path: Option<PathBuf>,
	tie_break: TieBreak,
	communities: ArcSwap<Vec<Community>>,
}

impl InMemoryCatalog {
	pub fn new(communities: Vec<Community>, tie_break: TieBreak) -> Arc<Self> {
		Arc::new(Self {
			path: None,
			tie_break,
			communities: ArcSwap::from_pointee(communities),
		})
	}

	pub fn load(path: &Path, tie_break: TieBreak) -> Result<Arc<Self>, CatalogError> {
		let communities = Self::read(path)?;
		Ok(Arc::new(Self {
			path: Some(path.to_path_buf()),
			tie_break,
			communities: ArcSwap::from_pointee(communities),
		}))
	}

	fn read(path: &Path) -> Result<Vec<Community>, CatalogError> {
		let text = std::fs::read_to_string(path)?;
		let file: CatalogFile = serde_yaml::from_str(&text)?;
		info!("Loaded {} communities from {}", file.communities.len(), path.display());
		Ok(file.communities)
	}

	/// Re-reads the backing file. The old snapshot stays in place on error.
	pub fn reload(&self) -> Result<usize, CatalogError> {
		let path = self.path.as_deref().ok_or(CatalogError::NoSource)?;
		let communities = Self::read(path)?;
		let count = communities.len();
		self.communities.store(Arc::new(communities));
		Ok(count)
	}

	fn compare(&self, a: &(f64, &Community), b: &(f64, &Community)) -> Ordering {
		let by_distance = a.0.total_cmp(&b.0);
		match self.tie_break {
			TieBreak::CatalogOrder => by_distance,
			TieBreak::Slug => by_distance.then_with(|| a.1.slug.cmp(&b.1.slug)),
		}
	}
}

fn same_name(a: &str, b: &str) -> bool {
	a.trim().eq_ignore_ascii_case(b.trim())
}

impl CommunityCatalog for InMemoryCatalog {
	fn find_exact(&self, city: &str, state: &str) -> Result<Option<String>, CatalogError> {
		Ok(self.communities.load()
			.iter()
			.find(|c| same_name(&c.city, city) && same_name(&c.state, state))
			.map(|c| c.slug.clone()))
	}

	fn find_nearest(
		&self,
		lat: f64,
		lng: f64,
		max_distance_miles: f64,
	) -> Result<Vec<CommunityDistance>, CatalogError> {
		let communities = self.communities.load();
		let mut found: Vec<(f64, &Community)> = communities.iter()
			.map(|c| (haversine_miles(lat, lng, c.lat, c.lng), c))
			.filter(|(distance, _)| *distance <= max_distance_miles)
			.collect();
		// Stable, so CatalogOrder keeps file order among equal distances.
		found.sort_by(|a, b| self.compare(a, b));
		Ok(found.into_iter()
			.map(|(distance_miles, c)| CommunityDistance {
				slug: c.slug.clone(),
				distance_miles,
			})
			.collect())
	}

	fn len(&self) -> usize {
		self.communities.load().len()
	}
}
