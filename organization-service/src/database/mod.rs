use std::future::Future;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

pub use self::memory::MemoryStore;
pub use self::mongo::MongoStore;
pub use self::organization::*;
use crate::config::DatabaseConfig;
use crate::listing::{Deletion, OrganizationFilter, Pagination};

pub mod memory;
pub mod mongo;
mod organization;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("mongodb: {0}")]
	Mongo(#[from] mongodb::error::Error),
	#[error("bson: {0}")]
	Bson(#[from] bson::ser::Error),
	#[error("connection uri has no default database")]
	NoDefaultDatabase,
	#[error("store is full ({0} organizations)")]
	CapacityExceeded(usize),
	#[error("slug {0} is already in use")]
	SlugTaken(String),
}

/// Persistence for organizations. Every lookup is scoped by a [`Deletion`]
/// constraint so that a concurrent delete or restore cannot be raced.
pub trait OrganizationStore {
	/// Number of organizations matching the filter
	fn count(&self, filter: &OrganizationFilter) -> impl Future<Output = Result<u64, StoreError>> + Send;

	/// A page of matching organizations in insertion order
	fn find(
		&self,
		filter: &OrganizationFilter,
		pagination: Pagination,
	) -> impl Future<Output = Result<Vec<Organization>, StoreError>> + Send;

	fn find_one(
		&self,
		id: ObjectId,
		deletion: Deletion,
	) -> impl Future<Output = Result<Option<Organization>, StoreError>> + Send;

	/// Inserts a new organization. Its slug is replaced with the first
	/// [`slug_candidate`] that no stored organization holds.
	fn insert(&self, organization: Organization) -> impl Future<Output = Result<Organization, StoreError>> + Send;

	/// Applies the patch and returns the organization after the update. A
	/// slug held by another organization fails with [`StoreError::SlugTaken`].
	fn update_one(
		&self,
		id: ObjectId,
		deletion: Deletion,
		patch: &OrganizationPatch,
	) -> impl Future<Output = Result<Option<Organization>, StoreError>> + Send;

	/// Applies the patch to every listed organization and returns how many
	/// were modified
	fn update_many(
		&self,
		ids: &[ObjectId],
		deletion: Deletion,
		patch: &OrganizationPatch,
	) -> impl Future<Output = Result<u64, StoreError>> + Send;

	fn count_ids(&self, ids: &[ObjectId], deletion: Deletion) -> impl Future<Output = Result<u64, StoreError>> + Send;

	/// Returns whether an organization was removed
	fn delete_one(&self, id: ObjectId, deletion: Deletion) -> impl Future<Output = Result<bool, StoreError>> + Send;

	fn delete_many(&self, ids: &[ObjectId], deletion: Deletion) -> impl Future<Output = Result<u64, StoreError>> + Send;

	fn healthy(&self) -> impl Future<Output = bool> + Send {
		async { true }
	}
}

/// The slug tried on the given attempt: the base first, then the base with
/// the creation time in milliseconds, then that with a counter.
pub fn slug_candidate(base: &str, created_at: DateTime<Utc>, attempt: u32) -> String {
	match attempt {
		0 => base.to_owned(),
		1 => format!("{base}-{}", created_at.timestamp_millis()),
		n => format!("{base}-{}-{}", created_at.timestamp_millis(), n - 1),
	}
}

#[derive(Debug)]
pub enum AnyOrganizationStore {
	Mongo(MongoStore),
	Memory(MemoryStore),
}

impl OrganizationStore for AnyOrganizationStore {
	async fn count(&self, filter: &OrganizationFilter) -> Result<u64, StoreError> {
		match self {
			Self::Mongo(store) => store.count(filter).await,
			Self::Memory(store) => store.count(filter).await,
		}
	}

	async fn find(&self, filter: &OrganizationFilter, pagination: Pagination) -> Result<Vec<Organization>, StoreError> {
		match self {
			Self::Mongo(store) => store.find(filter, pagination).await,
			Self::Memory(store) => store.find(filter, pagination).await,
		}
	}

	async fn find_one(&self, id: ObjectId, deletion: Deletion) -> Result<Option<Organization>, StoreError> {
		match self {
			Self::Mongo(store) => store.find_one(id, deletion).await,
			Self::Memory(store) => store.find_one(id, deletion).await,
		}
	}

	async fn insert(&self, organization: Organization) -> Result<Organization, StoreError> {
		match self {
			Self::Mongo(store) => store.insert(organization).await,
			Self::Memory(store) => store.insert(organization).await,
		}
	}

	async fn update_one(
		&self,
		id: ObjectId,
		deletion: Deletion,
		patch: &OrganizationPatch,
	) -> Result<Option<Organization>, StoreError> {
		match self {
			Self::Mongo(store) => store.update_one(id, deletion, patch).await,
			Self::Memory(store) => store.update_one(id, deletion, patch).await,
		}
	}

	async fn update_many(&self, ids: &[ObjectId], deletion: Deletion, patch: &OrganizationPatch) -> Result<u64, StoreError> {
		match self {
			Self::Mongo(store) => store.update_many(ids, deletion, patch).await,
			Self::Memory(store) => store.update_many(ids, deletion, patch).await,
		}
	}

	async fn count_ids(&self, ids: &[ObjectId], deletion: Deletion) -> Result<u64, StoreError> {
		match self {
			Self::Mongo(store) => store.count_ids(ids, deletion).await,
			Self::Memory(store) => store.count_ids(ids, deletion).await,
		}
	}

	async fn delete_one(&self, id: ObjectId, deletion: Deletion) -> Result<bool, StoreError> {
		match self {
			Self::Mongo(store) => store.delete_one(id, deletion).await,
			Self::Memory(store) => store.delete_one(id, deletion).await,
		}
	}

	async fn delete_many(&self, ids: &[ObjectId], deletion: Deletion) -> Result<u64, StoreError> {
		match self {
			Self::Mongo(store) => store.delete_many(ids, deletion).await,
			Self::Memory(store) => store.delete_many(ids, deletion).await,
		}
	}

	async fn healthy(&self) -> bool {
		match self {
			Self::Mongo(store) => store.healthy().await,
			Self::Memory(store) => store.healthy().await,
		}
	}
}

pub async fn build_store(config: &DatabaseConfig) -> Result<AnyOrganizationStore, StoreError> {
	match config {
		DatabaseConfig::Mongo(mongo) => Ok(AnyOrganizationStore::Mongo(MongoStore::connect(mongo).await?)),
		DatabaseConfig::Memory(memory) => Ok(AnyOrganizationStore::Memory(MemoryStore::new(memory))),
	}
}
