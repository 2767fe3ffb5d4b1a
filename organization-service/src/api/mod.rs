use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::{header, HeaderName, HeaderValue, Method, StatusCode};
use tower_http::cors::{AllowOrigin, CorsLayer};

use self::envelope::{ApiError, ApiPath};
use crate::config::CorsConfig;
use crate::drive::{Drive, DriveError};
use crate::global::Global;

pub mod envelope;
pub mod organizations;

pub fn router(global: Arc<Global>) -> Router {
	let mut router = Router::new()
		.route("/", get(health))
		.nest("/organizations", organizations::routes());

	// Logos are only served here when they are published under a local path.
	let prefix = global.config().uploads.public_prefix.trim_end_matches('/');
	if prefix.starts_with('/') {
		router = router.route(&format!("{prefix}/:name"), get(serve_upload));
	}

	router
		.layer(DefaultBodyLimit::max(global.config().http.body_limit))
		.layer(middleware::from_fn(log_request))
		.layer(cors(&global.config().http.cors))
		.with_state(global)
}

fn cors(config: &CorsConfig) -> CorsLayer {
	let origins = if config.allowed_origins.iter().any(|origin| origin == "*") {
		AllowOrigin::any()
	} else {
		AllowOrigin::list(config.allowed_origins.iter().filter_map(|origin| {
			HeaderValue::from_str(origin)
				.inspect_err(|err| tracing::warn!(%origin, error = %err, "ignoring invalid cors origin"))
				.ok()
		}))
	};

	CorsLayer::new()
		.allow_origin(origins)
		.allow_methods([
			Method::GET,
			Method::POST,
			Method::PUT,
			Method::DELETE,
			Method::PATCH,
			Method::OPTIONS,
		])
		.allow_headers([
			header::CONTENT_TYPE,
			header::AUTHORIZATION,
			HeaderName::from_static("x-requested-with"),
			header::ACCEPT,
			header::ORIGIN,
		])
}

async fn log_request(request: Request, next: Next) -> Response {
	tracing::info!(method = %request.method(), uri = %request.uri(), "request");
	next.run(request).await
}

async fn health(State(global): State<Arc<Global>>) -> Response {
	if global.healthy().await {
		let body = serde_json::json!({
			"data": { "message": "Api is running" },
			"status": "success",
			"code": 200,
		});

		(StatusCode::OK, Json(body)).into_response()
	} else {
		let body = serde_json::json!({
			"data": { "message": "Api is unhealthy" },
			"status": "error",
			"code": 503,
		});

		(StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
	}
}

async fn serve_upload(State(global): State<Arc<Global>>, ApiPath(name): ApiPath<String>) -> Result<Response, ApiError> {
	let data = match global.drive().read(&name).await {
		Ok(data) => data,
		Err(DriveError::NotFound | DriveError::InvalidName(_)) => {
			return Err(ApiError::new(StatusCode::NOT_FOUND, "File not found"));
		}
		Err(err) => {
			tracing::error!(error = %err, file = %name, "failed to read upload");
			return Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").with_error(err));
		}
	};

	let content_type = file_format::FileFormat::from_bytes(&data).media_type().to_owned();

	Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// Serves until `shutdown` resolves, then drains open connections.
pub async fn run(global: Arc<Global>, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
	let bind = global.config().http.bind;
	let listener = tokio::net::TcpListener::bind(bind)
		.await
		.with_context(|| format!("failed to bind {bind}"))?;

	tracing::info!(addr = %listener.local_addr().context("local addr")?, "http server listening");

	axum::serve(listener, router(global))
		.with_graceful_shutdown(shutdown)
		.await
		.context("http server")
}
