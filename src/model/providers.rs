use serde::Deserialize;

/// Body returned by ipapi.co.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IpApiCoResponse {
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub city: Option<String>,
	pub region: Option<String>,
	pub region_code: Option<String>,
	pub country_code: Option<String>,
	#[serde(default)]
	pub error: bool,
	pub reason: Option<String>,
}

/// Body returned by ip-api.com.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpApiComResponse {
	pub status: Option<String>,
	pub message: Option<String>,
	pub lat: Option<f64>,
	pub lon: Option<f64>,
	pub city: Option<String>,
	pub region: Option<String>,
	pub region_name: Option<String>,
	pub country_code: Option<String>,
}
