use std::collections::BTreeMap;

use bson::oid::ObjectId;
use tokio::sync::RwLock;

use super::{slug_candidate, Organization, OrganizationPatch, OrganizationStore, StoreError};
use crate::config::MemoryStoreConfig;
use crate::listing::{Deletion, OrganizationFilter, Pagination};

/// Keeps organizations in process. Object ids grow monotonically, so the map
/// order is the insertion order.
#[derive(Debug)]
pub struct MemoryStore {
	capacity: Option<usize>,
	organizations: RwLock<BTreeMap<ObjectId, Organization>>,
}

impl MemoryStore {
	pub fn new(config: &MemoryStoreConfig) -> Self {
		tracing::debug!("setting up memory store");
		Self {
			capacity: config.capacity,
			organizations: RwLock::new(BTreeMap::new()),
		}
	}

	pub async fn len(&self) -> usize {
		self.organizations.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}
}

impl OrganizationStore for MemoryStore {
	async fn count(&self, filter: &OrganizationFilter) -> Result<u64, StoreError> {
		let organizations = self.organizations.read().await;
		Ok(organizations.values().filter(|org| filter.matches(org)).count() as u64)
	}

	async fn find(&self, filter: &OrganizationFilter, pagination: Pagination) -> Result<Vec<Organization>, StoreError> {
		let organizations = self.organizations.read().await;

		Ok(organizations
			.values()
			.filter(|org| filter.matches(org))
			.skip(usize::try_from(pagination.skip).unwrap_or(usize::MAX))
			.take(usize::try_from(pagination.take).unwrap_or(usize::MAX))
			.cloned()
			.collect())
	}

	async fn find_one(&self, id: ObjectId, deletion: Deletion) -> Result<Option<Organization>, StoreError> {
		let organizations = self.organizations.read().await;
		Ok(organizations.get(&id).filter(|org| deletion.matches(org.deleted_at)).cloned())
	}

	#[tracing::instrument(skip_all, name = "MemoryStore::insert", fields(slug = %organization.slug), err)]
	async fn insert(&self, mut organization: Organization) -> Result<Organization, StoreError> {
		let mut organizations = self.organizations.write().await;

		if let Some(capacity) = self.capacity {
			if organizations.len() >= capacity {
				return Err(StoreError::CapacityExceeded(capacity));
			}
		}

		let base = std::mem::take(&mut organization.slug);
		let mut attempt = 0;
		organization.slug = loop {
			let candidate = slug_candidate(&base, organization.created_at, attempt);
			if !organizations.values().any(|org| org.slug == candidate) {
				break candidate;
			}

			attempt += 1;
		};

		organizations.insert(organization.id, organization.clone());
		Ok(organization)
	}

	async fn update_one(
		&self,
		id: ObjectId,
		deletion: Deletion,
		patch: &OrganizationPatch,
	) -> Result<Option<Organization>, StoreError> {
		let mut organizations = self.organizations.write().await;

		if !organizations.get(&id).is_some_and(|org| deletion.matches(org.deleted_at)) {
			return Ok(None);
		}

		if let Some(slug) = &patch.slug {
			if organizations.iter().any(|(other, org)| *other != id && org.slug == *slug) {
				return Err(StoreError::SlugTaken(slug.clone()));
			}
		}

		Ok(organizations.get_mut(&id).map(|org| {
			patch.apply(org);
			org.clone()
		}))
	}

	async fn update_many(&self, ids: &[ObjectId], deletion: Deletion, patch: &OrganizationPatch) -> Result<u64, StoreError> {
		let mut organizations = self.organizations.write().await;

		let mut modified = 0;
		for (id, org) in organizations.iter_mut() {
			if ids.contains(id) && deletion.matches(org.deleted_at) {
				patch.apply(org);
				modified += 1;
			}
		}

		Ok(modified)
	}

	async fn count_ids(&self, ids: &[ObjectId], deletion: Deletion) -> Result<u64, StoreError> {
		let organizations = self.organizations.read().await;

		Ok(organizations
			.iter()
			.filter(|(id, org)| ids.contains(*id) && deletion.matches(org.deleted_at))
			.count() as u64)
	}

	async fn delete_one(&self, id: ObjectId, deletion: Deletion) -> Result<bool, StoreError> {
		let mut organizations = self.organizations.write().await;

		if !organizations.get(&id).is_some_and(|org| deletion.matches(org.deleted_at)) {
			return Ok(false);
		}

		Ok(organizations.remove(&id).is_some())
	}

	async fn delete_many(&self, ids: &[ObjectId], deletion: Deletion) -> Result<u64, StoreError> {
		let mut organizations = self.organizations.write().await;

		let before = organizations.len();
		organizations.retain(|id, org| !(ids.contains(id) && deletion.matches(org.deleted_at)));

		Ok((before - organizations.len()) as u64)
	}
}
