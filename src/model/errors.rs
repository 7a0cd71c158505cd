use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde::Serialize;
use tokio::task::JoinError;
use crate::state::CatalogError;

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDTO {
	pub status: u16,
	pub error: String,
}

impl ErrorDTO {
	pub fn new(status: StatusCode, error: String) -> Self {
		Self {
			status: status.as_u16(),
			error,
		}
	}

	pub fn new_static(status: StatusCode, error: &str) -> Self {
		Self::new(status, error.to_owned())
	}

	pub fn invalid_coordinates() -> Self {
		Self::new_static(StatusCode::BAD_REQUEST, "Invalid coordinates")
	}
}

impl From<CatalogError> for ErrorDTO {
	fn from(err: CatalogError) -> Self {
		match err {
			CatalogError::NoSource => Self::new(StatusCode::CONFLICT, err.to_string()),
			CatalogError::Yaml(_) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
			CatalogError::Io(_) | CatalogError::ContractViolation(_) => {
				error!("Community catalog failure: {err}");
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
			}
		}
	}
}

impl From<JoinError> for ErrorDTO {
	fn from(err: JoinError) -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
	}
}

impl IntoResponse for ErrorDTO {
	fn into_response(self) -> Response {
		(
			StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
			Json(self),
		).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn catalog_errors_map_to_statuses() {
		assert_eq!(ErrorDTO::from(CatalogError::NoSource).status, 409);
		let yaml = serde_yaml::from_str::<u32>("[").unwrap_err();
		assert_eq!(ErrorDTO::from(CatalogError::Yaml(yaml)).status, 422);
		let violation = ErrorDTO::from(CatalogError::ContractViolation("tampa at -1".to_owned()));
		assert_eq!(violation.status, 500);
		assert!(violation.error.contains("tampa at -1"));
	}

	#[test]
	fn keeps_explicit_status() {
		let response = ErrorDTO::invalid_coordinates().into_response();
		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	}
}
