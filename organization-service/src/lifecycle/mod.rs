//! The organization state machine.
//!
//! An organization is active while `deleted_at` is unset. Active
//! organizations can be updated, change status, receive a logo and be soft
//! deleted. Soft deleted organizations can only be restored or hard deleted.

use bson::oid::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};

pub use self::bulk::{bulk_hard_delete, bulk_restore, bulk_soft_delete, BulkHardDeleted, BulkModified};
pub use self::input::{slugify, BulkIds, CreateOrganization, UpdateOrganization, UpdateStatus};
pub use self::logo::{upload_logo, LogoUpload};
use crate::database::{Organization, OrganizationPatch, OrganizationStatus, OrganizationStore, StoreError};
use crate::drive::DriveError;
use crate::listing::{total_pages, Deletion, ListParams, OrganizationPage, PageMeta};

mod bulk;
mod input;
mod logo;

#[derive(Debug, thiserror::Error)]
pub enum OrganizationError {
	/// Input rejected by a field rule
	#[error("{0}")]
	Validation(String),
	/// The bulk id list could not be used
	#[error("{0}")]
	InvalidIds(&'static str),
	#[error("{0}")]
	NotFound(&'static str),
	/// The organization is in the wrong state for the operation
	#[error("{0}")]
	Precondition(&'static str),
	#[error("store: {0}")]
	Store(#[from] StoreError),
	#[error("drive: {0}")]
	Drive(#[from] DriveError),
}

/// Stored timestamps have millisecond precision.
fn now() -> DateTime<Utc> {
	Utc::now().trunc_subsecs(3)
}

fn required(field: &str, value: &str) -> Result<(), OrganizationError> {
	if value.trim().is_empty() {
		return Err(OrganizationError::Validation(format!("{field} is required")));
	}

	Ok(())
}

pub async fn list(store: &impl OrganizationStore, params: &ListParams) -> Result<OrganizationPage, OrganizationError> {
	let total = store.count(&params.filter).await?;
	let items = store.find(&params.filter, params.pagination()).await?;

	Ok(OrganizationPage {
		items,
		meta: PageMeta {
			page: params.page,
			limit: params.limit,
			total,
			total_pages: total_pages(total, params.limit),
		},
	})
}

pub async fn get(store: &impl OrganizationStore, id: ObjectId) -> Result<Organization, OrganizationError> {
	store
		.find_one(id, Deletion::Any)
		.await?
		.ok_or(OrganizationError::NotFound("Organization not found"))
}

pub async fn create(store: &impl OrganizationStore, input: CreateOrganization) -> Result<Organization, OrganizationError> {
	required("name", &input.name)?;
	let name = input.name.trim().to_owned();

	let slug = match input.slug {
		Some(slug) => {
			required("slug", &slug)?;
			slug.trim().to_lowercase()
		}
		None => {
			let slug = slugify(&name);
			if slug.is_empty() {
				return Err(OrganizationError::Validation("slug cannot be derived from name".into()));
			}

			slug
		}
	};

	let now = now();
	let organization = store
		.insert(Organization {
			id: ObjectId::new(),
			name,
			slug,
			kind: input.kind,
			business_info: input.business_info,
			contact_details: input.contact_details,
			address: input.address,
			logo_url: None,
			status: input.status.unwrap_or_default(),
			root_user: input.root_user,
			created_by: input.created_by,
			created_at: now,
			updated_at: now,
			deleted_at: None,
		})
		.await?;

	tracing::info!(id = %organization.id, slug = %organization.slug, "organization created");

	Ok(organization)
}

pub async fn update(
	store: &impl OrganizationStore,
	id: ObjectId,
	input: UpdateOrganization,
) -> Result<Organization, OrganizationError> {
	if let Some(name) = &input.name {
		required("name", name)?;
	}
	if let Some(slug) = &input.slug {
		required("slug", slug)?;
	}

	let patch = OrganizationPatch {
		name: input.name.map(|name| name.trim().to_owned()),
		slug: input.slug.map(|slug| slug.trim().to_lowercase()),
		kind: input.kind,
		business_info: input.business_info,
		contact_details: input.contact_details,
		address: input.address,
		status: input.status,
		root_user: input.root_user,
		created_by: input.created_by,
		..OrganizationPatch::at(now())
	};

	let organization = match store.update_one(id, Deletion::Active, &patch).await {
		Ok(Some(organization)) => organization,
		Ok(None) => return Err(OrganizationError::NotFound("Organization not found or deleted")),
		Err(StoreError::SlugTaken(slug)) => {
			return Err(OrganizationError::Validation(format!("slug {slug} is already in use")));
		}
		Err(err) => return Err(err.into()),
	};

	tracing::info!(%id, "organization updated");

	Ok(organization)
}

pub async fn update_status(
	store: &impl OrganizationStore,
	id: ObjectId,
	status: OrganizationStatus,
) -> Result<Organization, OrganizationError> {
	let patch = OrganizationPatch {
		status: Some(status),
		..OrganizationPatch::at(now())
	};

	let organization = store
		.update_one(id, Deletion::Active, &patch)
		.await?
		.ok_or(OrganizationError::NotFound("Organization not found or deleted"))?;

	tracing::info!(%id, status = status.as_str(), "organization status changed");

	Ok(organization)
}

pub async fn soft_delete(store: &impl OrganizationStore, id: ObjectId) -> Result<(), OrganizationError> {
	let now = now();
	let patch = OrganizationPatch {
		deleted_at: Some(Some(now)),
		..OrganizationPatch::at(now)
	};

	store
		.update_one(id, Deletion::Active, &patch)
		.await?
		.ok_or(OrganizationError::NotFound("Organization not found or already deleted"))?;

	tracing::info!(%id, "organization soft deleted");

	Ok(())
}

pub async fn restore(store: &impl OrganizationStore, id: ObjectId) -> Result<Organization, OrganizationError> {
	let patch = OrganizationPatch {
		deleted_at: Some(None),
		..OrganizationPatch::at(now())
	};

	let organization = store
		.update_one(id, Deletion::Deleted, &patch)
		.await?
		.ok_or(OrganizationError::NotFound("Organization not found or not deleted"))?;

	tracing::info!(%id, "organization restored");

	Ok(organization)
}

/// Only soft deleted organizations can be removed. The delete is scoped to
/// the deleted state as well, so a restore racing with this call wins.
pub async fn hard_delete(store: &impl OrganizationStore, id: ObjectId) -> Result<(), OrganizationError> {
	if store.find_one(id, Deletion::Deleted).await?.is_none() {
		return Err(OrganizationError::Precondition(
			"Organization must be soft-deleted before hard deletion",
		));
	}

	if !store.delete_one(id, Deletion::Deleted).await? {
		return Err(OrganizationError::NotFound("Organization not found"));
	}

	tracing::info!(%id, "organization permanently deleted");

	Ok(())
}
