use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{CountOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use super::{
	slug_candidate, Address, BusinessInfo, ContactDetails, Organization, OrganizationPatch, OrganizationStatus,
	OrganizationStore, OrganizationType, StoreError,
};
use crate::config::MongoConfig;
use crate::listing::{Deletion, OrganizationFilter, Pagination};

const COLLECTION: &str = "organizations";
const DUPLICATE_KEY: i32 = 11000;

/// The stored shape of an organization. Field names match the documents
/// written by earlier deployments of the service.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationDocument {
	#[serde(rename = "_id")]
	id: ObjectId,
	name: String,
	slug: String,
	#[serde(rename = "type")]
	kind: OrganizationType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	business_info: Option<BusinessInfo>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	contact_details: Option<ContactDetails>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	address: Option<Address>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	logo_url: Option<String>,
	#[serde(default)]
	status: OrganizationStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	root_user: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	created_by: Option<String>,
	created_at: bson::DateTime,
	#[serde(default)]
	updated_at: Option<bson::DateTime>,
	#[serde(default)]
	deleted_at: Option<bson::DateTime>,
}

impl From<&Organization> for OrganizationDocument {
	fn from(organization: &Organization) -> Self {
		Self {
			id: organization.id,
			name: organization.name.clone(),
			slug: organization.slug.clone(),
			kind: organization.kind,
			business_info: organization.business_info.clone(),
			contact_details: organization.contact_details.clone(),
			address: organization.address.clone(),
			logo_url: organization.logo_url.clone(),
			status: organization.status,
			root_user: organization.root_user.clone(),
			created_by: organization.created_by.clone(),
			created_at: bson::DateTime::from_chrono(organization.created_at),
			updated_at: Some(bson::DateTime::from_chrono(organization.updated_at)),
			deleted_at: organization.deleted_at.map(bson::DateTime::from_chrono),
		}
	}
}

impl From<OrganizationDocument> for Organization {
	fn from(document: OrganizationDocument) -> Self {
		let created_at = document.created_at.to_chrono();

		Self {
			id: document.id,
			name: document.name,
			slug: document.slug,
			kind: document.kind,
			business_info: document.business_info,
			contact_details: document.contact_details,
			address: document.address,
			logo_url: document.logo_url,
			status: document.status,
			root_user: document.root_user,
			created_by: document.created_by,
			created_at,
			updated_at: document.updated_at.map_or(created_at, bson::DateTime::to_chrono),
			deleted_at: document.deleted_at.map(bson::DateTime::to_chrono),
		}
	}
}

#[derive(Debug)]
pub struct MongoStore {
	database: Database,
}

impl MongoStore {
	#[tracing::instrument(skip(config), name = "MongoStore::connect", err)]
	pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
		tracing::debug!("setting up mongo client");

		let client = mongodb::Client::with_uri_str(&config.uri).await?;
		let database = client.default_database().ok_or(StoreError::NoDefaultDatabase)?;

		tracing::debug!("setting up organization collection");
		Self::setup_collection(&database).await?;

		Ok(Self { database })
	}

	fn collection(&self) -> Collection<OrganizationDocument> {
		self.database.collection(COLLECTION)
	}

	async fn setup_collection(database: &Database) -> Result<(), mongodb::error::Error> {
		let collection = database.collection::<OrganizationDocument>(COLLECTION);

		collection
			.create_index(IndexModel::builder().keys(doc! { "slug": 1 }).build(), None)
			.await?;

		collection
			.create_index(IndexModel::builder().keys(doc! { "deletedAt": 1 }).build(), None)
			.await?;

		Ok(())
	}

	async fn slug_taken(&self, slug: &str, except: Option<ObjectId>) -> Result<bool, StoreError> {
		let options = CountOptions::builder().limit(1u64).build();
		Ok(self.collection().count_documents(slug_document(slug, except), options).await? > 0)
	}
}

/// The query document for a list filter. Search and status are matched as
/// escaped, case-insensitive regular expressions.
pub fn filter_document(filter: &OrganizationFilter) -> Document {
	let mut document = doc! {
		"name": {
			"$regex": regex::escape(&filter.search),
			"$options": "i",
		},
		"status": {
			"$regex": regex::escape(&filter.status),
			"$options": "i",
		},
	};

	if let Some(kind) = &filter.kind {
		document.insert("type", kind.as_str());
	}

	insert_deletion(&mut document, filter.deletion);
	document
}

/// Matches organizations holding the slug, other than `except`.
pub fn slug_document(slug: &str, except: Option<ObjectId>) -> Document {
	let mut document = doc! { "slug": slug };
	if let Some(id) = except {
		document.insert("_id", doc! { "$ne": id });
	}

	document
}

pub fn id_document(id: ObjectId, deletion: Deletion) -> Document {
	let mut document = doc! { "_id": id };
	insert_deletion(&mut document, deletion);
	document
}

pub fn ids_document(ids: &[ObjectId], deletion: Deletion) -> Document {
	let ids = ids.iter().copied().map(Bson::ObjectId).collect::<Vec<_>>();

	let mut document = doc! { "_id": { "$in": ids } };
	insert_deletion(&mut document, deletion);
	document
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
	match err.kind.as_ref() {
		ErrorKind::Write(WriteFailure::WriteError(write)) => write.code == DUPLICATE_KEY,
		// find_one_and_update runs as a command
		ErrorKind::Command(command) => command.code == DUPLICATE_KEY,
		_ => false,
	}
}

fn insert_deletion(document: &mut Document, deletion: Deletion) {
	match deletion {
		Deletion::Active => {
			document.insert("deletedAt", Bson::Null);
		}
		Deletion::Deleted => {
			document.insert("deletedAt", doc! { "$ne": Bson::Null });
		}
		Deletion::Any => {}
	}
}

/// The `$set` update for a patch.
pub fn update_document(patch: &OrganizationPatch) -> Result<Document, StoreError> {
	let mut set = doc! {
		"updatedAt": bson::DateTime::from_chrono(patch.updated_at),
	};

	if let Some(name) = &patch.name {
		set.insert("name", name.as_str());
	}
	if let Some(slug) = &patch.slug {
		set.insert("slug", slug.as_str());
	}
	if let Some(kind) = patch.kind {
		set.insert("type", kind.as_str());
	}
	if let Some(business_info) = &patch.business_info {
		set.insert("businessInfo", bson::to_bson(business_info)?);
	}
	if let Some(contact_details) = &patch.contact_details {
		set.insert("contactDetails", bson::to_bson(contact_details)?);
	}
	if let Some(address) = &patch.address {
		set.insert("address", bson::to_bson(address)?);
	}
	if let Some(logo_url) = &patch.logo_url {
		set.insert("logoUrl", logo_url.as_str());
	}
	if let Some(status) = patch.status {
		set.insert("status", status.as_str());
	}
	if let Some(root_user) = &patch.root_user {
		set.insert("rootUser", root_user.as_str());
	}
	if let Some(created_by) = &patch.created_by {
		set.insert("createdBy", created_by.as_str());
	}
	if let Some(deleted_at) = patch.deleted_at {
		set.insert("deletedAt", deleted_at.map(bson::DateTime::from_chrono));
	}

	Ok(doc! { "$set": set })
}

impl OrganizationStore for MongoStore {
	async fn count(&self, filter: &OrganizationFilter) -> Result<u64, StoreError> {
		Ok(self.collection().count_documents(filter_document(filter), None).await?)
	}

	async fn find(&self, filter: &OrganizationFilter, pagination: Pagination) -> Result<Vec<Organization>, StoreError> {
		let options = FindOptions::builder()
			.skip(pagination.skip)
			.limit(i64::try_from(pagination.take).unwrap_or(i64::MAX))
			.sort(doc! { "_id": 1 })
			.build();

		let documents: Vec<OrganizationDocument> = self
			.collection()
			.find(filter_document(filter), options)
			.await?
			.try_collect()
			.await?;

		Ok(documents.into_iter().map(Into::into).collect())
	}

	async fn find_one(&self, id: ObjectId, deletion: Deletion) -> Result<Option<Organization>, StoreError> {
		Ok(self
			.collection()
			.find_one(id_document(id, deletion), None)
			.await?
			.map(Into::into))
	}

	/// Slugs are checked before the write, so two concurrent creations can
	/// still store the same one. A duplicate key from a unique index added by
	/// an operator moves on to the next candidate.
	#[tracing::instrument(skip_all, name = "MongoStore::insert", fields(slug = %organization.slug), err)]
	async fn insert(&self, organization: Organization) -> Result<Organization, StoreError> {
		let mut document = OrganizationDocument::from(&organization);

		let mut attempt = 0;
		loop {
			document.slug = slug_candidate(&organization.slug, organization.created_at, attempt);
			attempt += 1;

			if self.slug_taken(&document.slug, None).await? {
				continue;
			}

			match self.collection().insert_one(&document, None).await {
				Ok(_) => break,
				Err(err) if is_duplicate_key(&err) => continue,
				Err(err) => return Err(err.into()),
			}
		}

		Ok(Organization {
			slug: document.slug,
			..organization
		})
	}

	async fn update_one(
		&self,
		id: ObjectId,
		deletion: Deletion,
		patch: &OrganizationPatch,
	) -> Result<Option<Organization>, StoreError> {
		if let Some(slug) = &patch.slug {
			if self.slug_taken(slug, Some(id)).await? {
				return Err(StoreError::SlugTaken(slug.clone()));
			}
		}

		let options = FindOneAndUpdateOptions::builder()
			.return_document(ReturnDocument::After)
			.build();

		match self
			.collection()
			.find_one_and_update(id_document(id, deletion), update_document(patch)?, options)
			.await
		{
			Ok(document) => Ok(document.map(Into::into)),
			Err(err) if is_duplicate_key(&err) => {
				Err(StoreError::SlugTaken(patch.slug.clone().unwrap_or_default()))
			}
			Err(err) => Err(err.into()),
		}
	}

	async fn update_many(&self, ids: &[ObjectId], deletion: Deletion, patch: &OrganizationPatch) -> Result<u64, StoreError> {
		let result = self
			.collection()
			.update_many(ids_document(ids, deletion), update_document(patch)?, None)
			.await?;

		Ok(result.modified_count)
	}

	async fn count_ids(&self, ids: &[ObjectId], deletion: Deletion) -> Result<u64, StoreError> {
		Ok(self.collection().count_documents(ids_document(ids, deletion), None).await?)
	}

	async fn delete_one(&self, id: ObjectId, deletion: Deletion) -> Result<bool, StoreError> {
		let result = self.collection().delete_one(id_document(id, deletion), None).await?;
		Ok(result.deleted_count == 1)
	}

	async fn delete_many(&self, ids: &[ObjectId], deletion: Deletion) -> Result<u64, StoreError> {
		let result = self.collection().delete_many(ids_document(ids, deletion), None).await?;
		Ok(result.deleted_count)
	}

	async fn healthy(&self) -> bool {
		match self.database.run_command(doc! { "ping": 1 }, None).await {
			Ok(_) => true,
			Err(err) => {
				tracing::error!(error = %err, "mongodb ping failed");
				false
			}
		}
	}
}
