use std::convert::Infallible;
use std::net::IpAddr;
use std::sync::LazyLock;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use regex::Regex;

pub const CONNECTING_IP_HEADER: &str = "cf-connecting-ip";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const REAL_IP_HEADER: &str = "x-real-ip";

static IPV4_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(
	r"^(\d{1,3}\.){3}\d{1,3}$"
).expect("Unable to compile regex"));

static IPV6_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(
	"^([0-9a-fA-F]{0,4}:){2,7}[0-9a-fA-F]{0,4}$"
).expect("Unable to compile regex"));

/// Cheap plausibility check run before any candidate reaches a network call.
/// The IPv6 branch is structural only.
pub fn is_valid_ip(candidate: &str) -> bool {
	if IPV4_PATTERN.is_match(candidate) {
		return candidate
			.split('.')
			.all(|octet| octet.parse::<u16>().is_ok_and(|octet| octet <= 255));
	}
	IPV6_PATTERN.is_match(candidate)
}

pub fn is_loopback(ip: &str) -> bool {
	ip.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
}

fn valid(candidate: Option<&str>) -> Option<String> {
	candidate
		.filter(|ip| is_valid_ip(ip))
		.map(str::to_owned)
}

/// Picks the originating client address out of the proxy headers.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
	let mut ip = valid(header_str(headers, CONNECTING_IP_HEADER));
	if ip.is_none() {
		ip = valid(header_str(headers, FORWARDED_FOR_HEADER)
			.and_then(|v| v.split(',').next())
			.map(str::trim));
	}
	if ip.is_none() {
		ip = valid(header_str(headers, REAL_IP_HEADER));
	}
	ip
}

#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		Ok(Self(extract_client_ip(&parts.headers)))
	}
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;
	use super::*;

	fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
		let mut headers = HeaderMap::new();
		for (name, value) in pairs {
			headers.append(*name, HeaderValue::from_static(*value));
		}
		headers
	}

	#[test]
	fn accepts_plain_ipv4() {
		assert!(is_valid_ip("1.2.3.4"));
		assert!(is_valid_ip("255.255.255.255"));
		assert!(is_valid_ip("0.0.0.0"));
	}

	#[test]
	fn rejects_out_of_range_octets() {
		assert!(!is_valid_ip("256.1.1.1"));
		assert!(!is_valid_ip("1.2.3.999"));
		assert!(!is_valid_ip("-1.2.3.4"));
		assert!(!is_valid_ip("1.2.3"));
	}

	#[test]
	fn rejects_garbage() {
		assert!(!is_valid_ip(""));
		assert!(!is_valid_ip("example.com"));
		assert!(!is_valid_ip("1.2.3.4, 5.6.7.8"));
		assert!(!is_valid_ip("unknown"));
	}

	#[test]
	fn accepts_ipv6_shapes() {
		assert!(is_valid_ip("::1"));
		assert!(is_valid_ip("2001:db8::8a2e:370:7334"));
		assert!(is_valid_ip("fe80:0:0:0:0:0:0:1"));
		assert!(!is_valid_ip("2001:db8:zz::1"));
	}

	#[test]
	fn detects_loopback() {
		assert!(is_loopback("127.0.0.1"));
		assert!(is_loopback("::1"));
		assert!(!is_loopback("203.0.113.5"));
		assert!(!is_loopback("not-an-ip"));
	}

	#[test]
	fn prefers_connecting_ip() {
		let headers = headers(&[
			("cf-connecting-ip", "203.0.113.5"),
			("x-forwarded-for", "198.51.100.1"),
			("x-real-ip", "192.0.2.1"),
		]);
		assert_eq!(extract_client_ip(&headers).as_deref(), Some("203.0.113.5"));
	}

	#[test]
	fn uses_first_forwarded_hop() {
		let headers = headers(&[
			("cf-connecting-ip", "garbage"),
			("x-forwarded-for", " 198.51.100.1 , 10.0.0.1, 10.0.0.2"),
		]);
		assert_eq!(extract_client_ip(&headers).as_deref(), Some("198.51.100.1"));
	}

	#[test]
	fn falls_back_to_real_ip() {
		let headers = headers(&[
			("x-forwarded-for", "unknown, 10.0.0.1"),
			("x-real-ip", "192.0.2.1"),
		]);
		assert_eq!(extract_client_ip(&headers).as_deref(), Some("192.0.2.1"));
	}

	#[test]
	fn returns_nothing_without_valid_candidates() {
		assert_eq!(extract_client_ip(&HeaderMap::new()), None);
		let headers = headers(&[("x-real-ip", "localhost")]);
		assert_eq!(extract_client_ip(&headers), None);
	}
}
