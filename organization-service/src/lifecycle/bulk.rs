use bson::oid::ObjectId;

use super::{now, BulkIds, OrganizationError};
use crate::database::{OrganizationPatch, OrganizationStore};
use crate::listing::Deletion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkModified {
	pub modified_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkHardDeleted {
	pub deleted_count: u64,
	/// Length of the submitted list, invalid and repeated entries included
	pub total_requested: u64,
	/// Distinct well-formed ids
	pub valid_ids: u64,
	pub not_soft_deleted: u64,
	pub not_found: u64,
}

#[derive(Debug)]
struct Selection {
	requested: u64,
	ids: Vec<ObjectId>,
}

fn select(request: &BulkIds) -> Result<Selection, OrganizationError> {
	let requested = match request.ids.as_ref().and_then(serde_json::Value::as_array) {
		Some(ids) if !ids.is_empty() => ids,
		_ => return Err(OrganizationError::InvalidIds("Please provide an array of IDs")),
	};

	let mut ids = Vec::with_capacity(requested.len());
	for id in requested
		.iter()
		.filter_map(serde_json::Value::as_str)
		.filter_map(|id| ObjectId::parse_str(id).ok())
	{
		if !ids.contains(&id) {
			ids.push(id);
		}
	}

	if ids.is_empty() {
		return Err(OrganizationError::InvalidIds("No valid organization IDs provided"));
	}

	Ok(Selection {
		requested: requested.len() as u64,
		ids,
	})
}

pub async fn bulk_soft_delete(store: &impl OrganizationStore, request: &BulkIds) -> Result<BulkModified, OrganizationError> {
	let selection = select(request)?;

	let now = now();
	let patch = OrganizationPatch {
		deleted_at: Some(Some(now)),
		..OrganizationPatch::at(now)
	};

	let modified_count = store.update_many(&selection.ids, Deletion::Active, &patch).await?;
	if modified_count == 0 {
		return Err(OrganizationError::NotFound(
			"No organizations found to delete or all are already deleted",
		));
	}

	tracing::info!(modified_count, "organizations soft deleted");

	Ok(BulkModified { modified_count })
}

pub async fn bulk_restore(store: &impl OrganizationStore, request: &BulkIds) -> Result<BulkModified, OrganizationError> {
	let selection = select(request)?;

	let patch = OrganizationPatch {
		deleted_at: Some(None),
		..OrganizationPatch::at(now())
	};

	let modified_count = store.update_many(&selection.ids, Deletion::Deleted, &patch).await?;
	if modified_count == 0 {
		return Err(OrganizationError::NotFound("No deleted organizations found to restore"));
	}

	tracing::info!(modified_count, "organizations restored");

	Ok(BulkModified { modified_count })
}

/// Removes the soft deleted organizations among the ids and reports on the
/// rest. Fails without deleting anything when none of them is soft deleted.
pub async fn bulk_hard_delete(
	store: &impl OrganizationStore,
	request: &BulkIds,
) -> Result<BulkHardDeleted, OrganizationError> {
	let selection = select(request)?;

	let soft_deleted = store.count_ids(&selection.ids, Deletion::Deleted).await?;
	if soft_deleted == 0 {
		return Err(OrganizationError::Precondition(
			"No soft-deleted organizations found to hard delete",
		));
	}

	let not_soft_deleted = store.count_ids(&selection.ids, Deletion::Active).await?;
	let deleted_count = store.delete_many(&selection.ids, Deletion::Deleted).await?;

	let valid_ids = selection.ids.len() as u64;

	tracing::info!(deleted_count, valid_ids, "organizations permanently deleted");

	Ok(BulkHardDeleted {
		deleted_count,
		total_requested: selection.requested,
		valid_ids,
		not_soft_deleted,
		not_found: valid_ids.saturating_sub(soft_deleted).saturating_sub(not_soft_deleted),
	})
}
