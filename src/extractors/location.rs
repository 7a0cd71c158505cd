use std::convert::Infallible;
use std::sync::Arc;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use crate::model::Location;
use crate::state::AppState;

/// The caller's location, resolved from the request headers. Never rejects.
#[derive(Debug, Clone)]
pub struct ResolvedLocation(pub Location);

impl FromRequestParts<Arc<AppState>> for ResolvedLocation {
	type Rejection = Infallible;

	async fn from_request_parts(
		parts: &mut Parts,
		state: &Arc<AppState>,
	) -> Result<Self, Self::Rejection> {
		Ok(Self(state.resolver.resolve(&parts.headers).await))
	}
}
