use std::sync::Arc;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use crate::extractors::{Auth, ClientIp, ResolvedLocation};
use crate::model::{
	is_valid_coordinate_pair, Accuracy, CatalogReloadResult, CommunityMatchQuery,
	CommunityMatchResult, ErrorDTO, IpDetectResult, Location, LocationResult, LocatorStatus,
	SavedLocation,
};
use crate::state::{AppState, CommunityCatalog};

pub fn build_router(state: Arc<AppState>) -> Router {
	Router::new()
		.route("/api/status", get(get_status))
		.route("/api/ip", get(detect_ip))
		.route("/api/location", get(get_location).put(save_location).delete(forget_location))
		.route("/api/communities/match", get(match_community))
		.route("/api/catalog/reload", post(reload_catalog))
		.with_state(state)
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<LocatorStatus> {
	Json(LocatorStatus {
		cached_locations: state.cache.len(),
		communities: state.catalog.len(),
	})
}

async fn detect_ip(ClientIp(client_ip): ClientIp) -> Json<IpDetectResult> {
	Json(IpDetectResult {
		ip: client_ip,
	})
}

async fn get_location(
	State(state): State<Arc<AppState>>,
	ResolvedLocation(location): ResolvedLocation,
) -> Json<LocationResult> {
	let community = state.matcher.match_community(&location);
	Json(LocationResult {
		location,
		community,
	})
}

async fn save_location(
	State(state): State<Arc<AppState>>,
	Json(saved): Json<SavedLocation>,
) -> Result<impl IntoResponse, ErrorDTO> {
	if !is_valid_coordinate_pair(saved.lat, saved.lng) {
		return Err(ErrorDTO::invalid_coordinates());
	}
	let location = Location {
		lat: saved.lat,
		lng: saved.lng,
		city: saved.city,
		state: saved.state,
		country: saved.country,
		accuracy: Accuracy::Precise,
	};
	let cookie = state.resolver.codec().encode(&location);
	let community = state.matcher.match_community(&location);
	Ok((
		[(header::SET_COOKIE, cookie)],
		Json(LocationResult {
			location,
			community,
		}),
	))
}

async fn forget_location(State(state): State<Arc<AppState>>) -> impl IntoResponse {
	(
		StatusCode::NO_CONTENT,
		[(header::SET_COOKIE, state.resolver.codec().clear())],
	)
}

async fn match_community(
	State(state): State<Arc<AppState>>,
	Query(query): Query<CommunityMatchQuery>,
) -> Result<Json<CommunityMatchResult>, ErrorDTO> {
	if !is_valid_coordinate_pair(query.lat, query.lng) {
		return Err(ErrorDTO::invalid_coordinates());
	}
	let found = state.matcher.try_match(&query_location(query))?;
	Ok(Json(found.into()))
}

fn query_location(query: CommunityMatchQuery) -> Location {
	Location {
		lat: query.lat,
		lng: query.lng,
		city: query.city,
		state: query.state,
		country: None,
		accuracy: Accuracy::Default,
	}
}

async fn reload_catalog(
	_auth: Auth,
	State(state): State<Arc<AppState>>,
) -> Result<Json<CatalogReloadResult>, ErrorDTO> {
	let catalog = state.catalog.clone();
	let communities = tokio::task::spawn_blocking(move || catalog.reload()).await??;
	info!("Community catalog reloaded ({communities} entries)");
	Ok(Json(CatalogReloadResult {
		communities,
	}))
}

#[cfg(test)]
mod tests {
	use axum::body::{to_bytes, Body};
	use axum::http::{HeaderValue, Request, Response};
	use serde_json::{json, Value};
	use tower::ServiceExt;
	use crate::config::{AppConfig, TieBreak};
	use crate::model::Community;
	use crate::state::InMemoryCatalog;
	use super::*;

	fn community(slug: &str, city: &str, lat: f64, lng: f64) -> Community {
		Community {
			slug: slug.to_owned(),
			city: city.to_owned(),
			state: "FL".to_owned(),
			lat,
			lng,
		}
	}

	fn router(config: AppConfig) -> Router {
		let catalog = InMemoryCatalog::new(vec![
			community("clearwater", "Clearwater", 27.9659, -82.8001),
			community("tampa", "Tampa", 27.9506, -82.4572),
			community("jacksonville", "Jacksonville", 30.3322, -81.6557),
		], TieBreak::CatalogOrder);
		build_router(AppState::with_catalog(Arc::new(config), catalog))
	}

	async fn body_json(response: Response<Body>) -> Value {
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[tokio::test]
	async fn resolves_and_matches_from_edge_headers() {
		let response = router(AppConfig::default())
			.oneshot(Request::get("/api/location")
				.header("cf-iplatitude", "27.96")
				.header("cf-iplongitude", "-82.47")
				.header("cf-ipcountry", "US")
				.body(Body::empty())
				.unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let body = body_json(response).await;
		assert_eq!(body["community"], "tampa");
		assert_eq!(body["location"]["accuracy"], "city");
		assert_eq!(body["location"]["country"], "US");
	}

	#[tokio::test]
	async fn anonymous_local_request_gets_defaults() {
		let response = router(AppConfig::default())
			.oneshot(Request::get("/api/location")
				.header("x-forwarded-for", "127.0.0.1")
				.body(Body::empty())
				.unwrap())
			.await
			.unwrap();
		let body = body_json(response).await;
		assert_eq!(body["location"]["accuracy"], "default");
		assert_eq!(body["location"]["city"], "Clearwater");
		assert_eq!(body["community"], "clearwater");
	}

	#[tokio::test]
	async fn saving_a_location_sets_the_cookie() {
		let response = router(AppConfig::default())
			.oneshot(Request::put("/api/location")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(json!({
					"lat": 30.33,
					"lng": -81.66,
					"city": "jacksonville",
					"state": "fl",
				}).to_string()))
				.unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let cookie = response.headers()
			.get(header::SET_COOKIE)
			.and_then(|v| v.to_str().ok())
			.unwrap()
			.to_owned();
		assert!(cookie.starts_with("wtf_location=%7B"));
		assert!(cookie.ends_with("SameSite=Lax; Secure"));
		let body = body_json(response).await;
		assert_eq!(body["community"], "jacksonville");
		assert_eq!(body["location"]["accuracy"], "precise");
	}

	#[tokio::test]
	async fn rejects_invalid_saved_coordinates() {
		let response = router(AppConfig::default())
			.oneshot(Request::put("/api/location")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(json!({"lat": 95.0, "lng": 0.0}).to_string()))
				.unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}

	#[tokio::test]
	async fn forgetting_clears_the_cookie() {
		let response = router(AppConfig::default())
			.oneshot(Request::delete("/api/location").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::NO_CONTENT);
		let cookie = response.headers().get(header::SET_COOKIE).unwrap();
		assert!(cookie.to_str().unwrap().starts_with("wtf_location=;"));
	}

	#[tokio::test]
	async fn match_endpoint_reports_stage() {
		let response = router(AppConfig::default())
			.oneshot(Request::get("/api/communities/match?lat=29.65&lng=-82.32")
				.body(Body::empty())
				.unwrap())
			.await
			.unwrap();
		let body = body_json(response).await;
		assert_eq!(body["community"], "jacksonville");
		assert_eq!(body["stage"], "narrow_radius");
		assert!(body["distance_miles"].as_f64().unwrap() < 100.0);
	}

	#[test]
	fn queried_coordinates_carry_no_strategy_accuracy() {
		let location = query_location(CommunityMatchQuery {
			lat: 29.65,
			lng: -82.32,
			city: Some("Gainesville".to_owned()),
			state: Some("FL".to_owned()),
		});
		assert_eq!(location.accuracy, Accuracy::Default);
		assert_eq!(location.country, None);
		assert_eq!(location.city.as_deref(), Some("Gainesville"));
	}

	#[tokio::test]
	async fn detects_client_ip() {
		let response = router(AppConfig::default())
			.oneshot(Request::get("/api/ip")
				.header("x-forwarded-for", "198.51.100.1, 10.0.0.1")
				.body(Body::empty())
				.unwrap())
			.await
			.unwrap();
		assert_eq!(body_json(response).await, json!({"ip": "198.51.100.1"}));
	}

	#[tokio::test]
	async fn reload_requires_api_key_when_configured() {
		let config = AppConfig {
			api_key: Some("secret".to_owned()),
			..AppConfig::default()
		};
		let app = router(config);
		let response = app.clone()
			.oneshot(Request::post("/api/catalog/reload").body(Body::empty()).unwrap())
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

		let mut request = Request::post("/api/catalog/reload").body(Body::empty()).unwrap();
		request.headers_mut().insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer secret"));
		let response = app.oneshot(request).await.unwrap();
		assert_eq!(response.status(), StatusCode::CONFLICT);
	}
}
