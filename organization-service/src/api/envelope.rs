use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

use crate::lifecycle::OrganizationError;

/// The body of every response.
#[derive(Debug, serde::Serialize)]
pub struct Envelope<T> {
	pub status: &'static str,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug)]
pub struct ApiResponse<T> {
	status: StatusCode,
	message: String,
	data: Option<T>,
}

impl<T> ApiResponse<T> {
	pub fn ok(message: impl Into<String>, data: T) -> Self {
		Self {
			status: StatusCode::OK,
			message: message.into(),
			data: Some(data),
		}
	}

	pub fn created(message: impl Into<String>, data: T) -> Self {
		Self {
			status: StatusCode::CREATED,
			message: message.into(),
			data: Some(data),
		}
	}
}

impl ApiResponse<()> {
	/// A success without data
	pub fn message(message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::OK,
			message: message.into(),
			data: None,
		}
	}
}

impl<T: serde::Serialize> IntoResponse for ApiResponse<T> {
	fn into_response(self) -> Response {
		let envelope = Envelope {
			status: "success",
			message: self.message,
			data: self.data,
			error: None,
		};

		(self.status, Json(envelope)).into_response()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
	status: StatusCode,
	message: String,
	error: Option<String>,
}

impl ApiError {
	pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self {
			status,
			message: message.into(),
			error: None,
		}
	}

	pub fn with_error(mut self, error: impl ToString) -> Self {
		self.error = Some(error.to_string());
		self
	}

	pub fn invalid_request(error: impl ToString) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "Invalid request").with_error(error)
	}

	pub fn invalid_id() -> Self {
		Self::new(StatusCode::BAD_REQUEST, "Invalid organization id")
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	/// Maps an engine error, `context` names the operation that failed.
	pub fn from_organization(err: OrganizationError, context: &'static str) -> Self {
		match err {
			OrganizationError::Validation(detail) => Self::new(StatusCode::BAD_REQUEST, context).with_error(detail),
			OrganizationError::InvalidIds(message) | OrganizationError::Precondition(message) => {
				Self::new(StatusCode::BAD_REQUEST, message)
			}
			OrganizationError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
			OrganizationError::Store(err) => {
				tracing::error!(error = %err, "{context}");
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, context).with_error(err)
			}
			OrganizationError::Drive(err) => {
				tracing::error!(error = %err, "{context}");
				Self::new(StatusCode::INTERNAL_SERVER_ERROR, context).with_error(err)
			}
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let envelope = Envelope::<()> {
			status: "error",
			message: self.message,
			data: None,
			error: self.error,
		};

		(self.status, Json(envelope)).into_response()
	}
}

pub trait ResultExt<T> {
	fn map_err_api(self, context: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, OrganizationError> {
	fn map_err_api(self, context: &'static str) -> Result<T, ApiError> {
		self.map_err(|err| ApiError::from_organization(err, context))
	}
}

impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<MultipartRejection> for ApiError {
	fn from(rejection: MultipartRejection) -> Self {
		Self::invalid_request(rejection.body_text())
	}
}

impl From<MultipartError> for ApiError {
	fn from(err: MultipartError) -> Self {
		Self::invalid_request(err)
	}
}

/// [`Json`] with rejections reported in the envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
