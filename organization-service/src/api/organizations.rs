use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use bson::oid::ObjectId;
use http::StatusCode;

use super::envelope::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, ResultExt};
use crate::database::Organization;
use crate::global::Global;
use crate::lifecycle::{
	self, BulkHardDeleted, BulkIds, BulkModified, CreateOrganization, LogoUpload, UpdateOrganization, UpdateStatus,
};
use crate::listing::{ListParams, ListQuery, OrganizationPage};

/// The multipart field carrying the logo
pub const LOGO_FIELD: &str = "logo";

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

pub fn routes() -> Router<Arc<Global>> {
	Router::new()
		.route("/", get(list).post(create))
		.route("/bulk/delete", delete(bulk_delete))
		.route("/bulk/restore", patch(bulk_restore))
		.route("/bulk/hard-delete", post(bulk_hard_delete))
		.route("/:id", get(get_one).patch(update).delete(soft_delete))
		.route("/:id/status", patch(update_status))
		.route("/:id/restore", patch(restore))
		.route("/:id/hard-delete", delete(hard_delete))
		.route("/:id/logo", post(upload_logo))
}

fn parse_id(id: &str) -> Result<ObjectId, ApiError> {
	ObjectId::parse_str(id).map_err(|_| ApiError::invalid_id())
}

async fn list(State(global): State<Arc<Global>>, ApiQuery(query): ApiQuery<ListQuery>) -> ApiResult<OrganizationPage> {
	let params = ListParams::from_query(&query);

	let page = lifecycle::list(global.store(), &params)
		.await
		.map_err_api("Failed to fetch organizations")?;

	Ok(ApiResponse::ok("Organizations retrieved", page))
}

async fn get_one(State(global): State<Arc<Global>>, ApiPath(id): ApiPath<String>) -> ApiResult<Organization> {
	let id = parse_id(&id)?;

	let organization = lifecycle::get(global.store(), id)
		.await
		.map_err_api("Failed to fetch organization")?;

	Ok(ApiResponse::ok("Organization retrieved", organization))
}

async fn create(
	State(global): State<Arc<Global>>,
	ApiJson(input): ApiJson<CreateOrganization>,
) -> ApiResult<Organization> {
	let organization = lifecycle::create(global.store(), input)
		.await
		.map_err_api("Failed to create organization")?;

	Ok(ApiResponse::created("Organization created", organization))
}

async fn update(
	State(global): State<Arc<Global>>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<UpdateOrganization>,
) -> ApiResult<Organization> {
	let id = parse_id(&id)?;

	let organization = lifecycle::update(global.store(), id, input)
		.await
		.map_err_api("Failed to update organization")?;

	Ok(ApiResponse::ok("Organization updated", organization))
}

async fn update_status(
	State(global): State<Arc<Global>>,
	ApiPath(id): ApiPath<String>,
	ApiJson(input): ApiJson<UpdateStatus>,
) -> ApiResult<Organization> {
	let id = parse_id(&id)?;

	let organization = lifecycle::update_status(global.store(), id, input.status)
		.await
		.map_err_api("Failed to update status")?;

	Ok(ApiResponse::ok("Organization status updated", organization))
}

async fn soft_delete(State(global): State<Arc<Global>>, ApiPath(id): ApiPath<String>) -> ApiResult<()> {
	let id = parse_id(&id)?;

	lifecycle::soft_delete(global.store(), id)
		.await
		.map_err_api("Failed to delete organization")?;

	Ok(ApiResponse::message("Organization soft-deleted"))
}

async fn restore(State(global): State<Arc<Global>>, ApiPath(id): ApiPath<String>) -> ApiResult<Organization> {
	let id = parse_id(&id)?;

	let organization = lifecycle::restore(global.store(), id)
		.await
		.map_err_api("Failed to restore organization")?;

	Ok(ApiResponse::ok("Organization restored", organization))
}

async fn hard_delete(State(global): State<Arc<Global>>, ApiPath(id): ApiPath<String>) -> ApiResult<()> {
	let id = parse_id(&id)?;

	lifecycle::hard_delete(global.store(), id)
		.await
		.map_err_api("Failed to hard delete organization")?;

	Ok(ApiResponse::message("Organization permanently deleted"))
}

async fn upload_logo(
	State(global): State<Arc<Global>>,
	ApiPath(id): ApiPath<String>,
	multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Organization> {
	let id = parse_id(&id)?;
	let mut multipart = multipart?;

	let mut upload = None;
	while let Some(field) = multipart.next_field().await? {
		if field.name() != Some(LOGO_FIELD) {
			continue;
		}

		let file_name = field.file_name().unwrap_or_default().to_owned();
		let data = field.bytes().await?;
		upload = Some(LogoUpload { file_name, data });
	}

	let Some(upload) = upload else {
		return Err(ApiError::new(StatusCode::BAD_REQUEST, "Failed to upload logo").with_error("No logo file provided"));
	};

	let organization = lifecycle::upload_logo(global.store(), global.drive(), &global.config().uploads, id, upload)
		.await
		.map_err_api("Failed to upload logo")?;

	Ok(ApiResponse::ok("Logo uploaded", organization))
}

async fn bulk_delete(State(global): State<Arc<Global>>, ApiJson(request): ApiJson<BulkIds>) -> ApiResult<BulkModified> {
	let result = lifecycle::bulk_soft_delete(global.store(), &request)
		.await
		.map_err_api("Bulk delete failed")?;

	Ok(ApiResponse::ok(
		format!("{} organizations deleted", result.modified_count),
		result,
	))
}

async fn bulk_restore(State(global): State<Arc<Global>>, ApiJson(request): ApiJson<BulkIds>) -> ApiResult<BulkModified> {
	let result = lifecycle::bulk_restore(global.store(), &request)
		.await
		.map_err_api("Bulk restore failed")?;

	Ok(ApiResponse::ok(
		format!("{} organizations restored", result.modified_count),
		result,
	))
}

async fn bulk_hard_delete(
	State(global): State<Arc<Global>>,
	ApiJson(request): ApiJson<BulkIds>,
) -> ApiResult<BulkHardDeleted> {
	let result = lifecycle::bulk_hard_delete(global.store(), &request)
		.await
		.map_err_api("Bulk hard delete failed")?;

	Ok(ApiResponse::ok(
		format!("{} organizations permanently deleted", result.deleted_count),
		result,
	))
}
