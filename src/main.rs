use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use community_locator::config::AppConfig;
use community_locator::handlers::build_router;
use community_locator::state::AppState;
use log::info;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
	let _ = dotenvy::dotenv();
	env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
	let config = AppConfig::load_from_env();
	let state = AppState::new(config.clone())
		.expect("Unable to load community catalog");
	let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
	let router = build_router(state)
		.route("/metrics", get(|| async move { metric_handle.render() }))
		.layer(prometheus_layer);
	let listener = TcpListener::bind(config.listen_addr)
		.await
		.expect("Unable to bind TCP listener");
	info!("Listening on http://{}/", listener.local_addr().expect("Unable to get local address"));
	axum::serve(listener, router)
		.await
		.expect("Unable to start Axum server");
}
