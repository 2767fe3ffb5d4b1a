use std::sync::Arc;

use bson::oid::ObjectId;

use crate::config::{MemoryDriveConfig, MemoryStoreConfig, OrganizationServiceConfig};
use crate::database::{AnyOrganizationStore, MemoryStore, Organization, OrganizationStore, OrganizationType};
use crate::drive::memory::MemoryDrive;
use crate::drive::AnyDrive;
use crate::global::Global;
use crate::lifecycle::{self, CreateOrganization};

pub fn memory_store() -> MemoryStore {
	MemoryStore::new(&MemoryStoreConfig::default())
}

pub fn memory_drive() -> MemoryDrive {
	MemoryDrive::new(&MemoryDriveConfig::default())
}

pub fn mock_global(config: OrganizationServiceConfig) -> Arc<Global> {
	Arc::new(Global::from_parts(
		config,
		AnyOrganizationStore::Memory(memory_store()),
		AnyDrive::Memory(memory_drive()),
	))
}

pub async fn create(store: &impl OrganizationStore, name: &str) -> Organization {
	lifecycle::create(store, CreateOrganization::new(name, OrganizationType::TravelAgent))
		.await
		.expect("failed to create organization")
}

pub async fn create_deleted(store: &impl OrganizationStore, name: &str) -> ObjectId {
	let id = create(store, name).await.id;
	lifecycle::soft_delete(store, id)
		.await
		.expect("failed to soft delete organization");
	id
}
