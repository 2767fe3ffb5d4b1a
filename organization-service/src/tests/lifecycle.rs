use bson::oid::ObjectId;
use bytes::Bytes;
use serde_json::json;

use crate::config::UploadConfig;
use crate::database::{OrganizationStatus, OrganizationStore, OrganizationType};
use crate::drive::Drive;
use crate::lifecycle::{self, slugify, BulkIds, CreateOrganization, LogoUpload, OrganizationError, UpdateOrganization};
use crate::listing::Deletion;
use crate::tests::global::{create, create_deleted, memory_drive, memory_store};

fn bulk(ids: serde_json::Value) -> BulkIds {
	BulkIds { ids: Some(ids) }
}

#[test]
fn slugify_names() {
	assert_eq!(slugify("Acme Travel"), "acme-travel");
	assert_eq!(slugify("  Acme -- Travel & Co. "), "acme-travel-co");
	assert_eq!(slugify("!!!"), "");
}

#[tokio::test]
async fn create_sets_defaults() {
	let store = memory_store();
	let org = create(&store, "Acme Travel").await;

	assert_eq!(org.slug, "acme-travel");
	assert_eq!(org.status, OrganizationStatus::Approved);
	assert_eq!(org.deleted_at, None);
	assert_eq!(org.created_at, org.updated_at);
	assert_eq!(org.logo_url, None);
}

#[tokio::test]
async fn create_lowercases_given_slug() {
	let store = memory_store();
	let input = CreateOrganization {
		slug: Some(" ACME ".into()),
		status: Some(OrganizationStatus::Suspended),
		..CreateOrganization::new("Acme", OrganizationType::Supplier)
	};

	let org = lifecycle::create(&store, input).await.expect("failed to create");
	assert_eq!(org.slug, "acme");
	assert_eq!(org.status, OrganizationStatus::Suspended);
	assert_eq!(org.kind, OrganizationType::Supplier);
}

#[tokio::test]
async fn create_rejects_blank_fields() {
	let store = memory_store();

	let err = lifecycle::create(&store, CreateOrganization::new("   ", OrganizationType::Platform))
		.await
		.expect_err("blank name accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");

	let err = lifecycle::create(&store, CreateOrganization::new("???", OrganizationType::Platform))
		.await
		.expect_err("underivable slug accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");

	let input = CreateOrganization {
		slug: Some("".into()),
		..CreateOrganization::new("Acme", OrganizationType::Platform)
	};
	let err = lifecycle::create(&store, input).await.expect_err("empty slug accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");

	assert!(store.is_empty().await);
}

#[tokio::test]
async fn colliding_slugs_are_suffixed() {
	let store = memory_store();
	let first = create(&store, "Acme").await;
	let second = create(&store, "Acme").await;
	let third = create(&store, "Acme").await;

	assert_eq!(first.slug, "acme");
	assert_eq!(second.slug, format!("acme-{}", second.created_at.timestamp_millis()));
	assert_ne!(third.slug, first.slug);
	assert_ne!(third.slug, second.slug);
	assert!(third.slug.starts_with("acme-"));
}

#[tokio::test]
async fn deleted_organizations_keep_their_slug() {
	let store = memory_store();
	create_deleted(&store, "Acme").await;

	let org = create(&store, "Acme").await;
	assert_ne!(org.slug, "acme");
}

#[tokio::test]
async fn get_ignores_deletion() {
	let store = memory_store();
	let id = create_deleted(&store, "Acme").await;

	let org = lifecycle::get(&store, id).await.expect("failed to get");
	assert!(org.deleted_at.is_some());

	let err = lifecycle::get(&store, ObjectId::new()).await.expect_err("found unknown id");
	assert!(matches!(err, OrganizationError::NotFound("Organization not found")), "{err:?}");
}

#[tokio::test]
async fn update_merges_fields() {
	let store = memory_store();
	let org = create(&store, "Acme").await;

	let input = UpdateOrganization {
		name: Some("Acme Holidays".into()),
		slug: Some("Acme-Holidays".into()),
		kind: Some(OrganizationType::TravelAgentAndSupplier),
		..Default::default()
	};

	let updated = lifecycle::update(&store, org.id, input).await.expect("failed to update");
	assert_eq!(updated.name, "Acme Holidays");
	assert_eq!(updated.slug, "acme-holidays");
	assert_eq!(updated.kind, OrganizationType::TravelAgentAndSupplier);
	assert_eq!(updated.created_at, org.created_at);
	assert!(updated.updated_at >= org.updated_at);
	assert_eq!(updated.status, org.status);
}

#[tokio::test]
async fn update_requires_active() {
	let store = memory_store();
	let id = create_deleted(&store, "Acme").await;

	let err = lifecycle::update(&store, id, UpdateOrganization::default())
		.await
		.expect_err("updated deleted organization");
	assert!(
		matches!(err, OrganizationError::NotFound("Organization not found or deleted")),
		"{err:?}"
	);

	let err = lifecycle::update_status(&store, id, OrganizationStatus::Suspended)
		.await
		.expect_err("status changed on deleted organization");
	assert!(matches!(err, OrganizationError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn update_rejects_taken_slug() {
	let store = memory_store();
	let acme = create(&store, "Acme").await;
	let beta = create(&store, "Beta").await;
	create_deleted(&store, "Gone").await;

	for slug in ["ACME", "gone"] {
		let input = UpdateOrganization {
			slug: Some(slug.into()),
			..Default::default()
		};
		let err = lifecycle::update(&store, beta.id, input).await.expect_err("duplicate slug accepted");
		assert!(
			matches!(&err, OrganizationError::Validation(detail) if detail.contains("already in use")),
			"{err:?}"
		);
	}

	assert_eq!(lifecycle::get(&store, beta.id).await.expect("failed to get"), beta);

	let input = UpdateOrganization {
		slug: Some("acme".into()),
		..Default::default()
	};
	let updated = lifecycle::update(&store, acme.id, input).await.expect("own slug rejected");
	assert_eq!(updated.slug, "acme");
}

#[tokio::test]
async fn update_rejects_blank_name() {
	let store = memory_store();
	let org = create(&store, "Acme").await;

	let input = UpdateOrganization {
		name: Some(" ".into()),
		..Default::default()
	};
	let err = lifecycle::update(&store, org.id, input).await.expect_err("blank name accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");
}

#[tokio::test]
async fn soft_delete_restore_hard_delete() {
	let store = memory_store();
	let org = create(&store, "Acme").await;

	let err = lifecycle::hard_delete(&store, org.id)
		.await
		.expect_err("hard deleted active organization");
	assert!(
		matches!(
			err,
			OrganizationError::Precondition("Organization must be soft-deleted before hard deletion")
		),
		"{err:?}"
	);
	assert_eq!(lifecycle::get(&store, org.id).await.expect("failed to get"), org);

	lifecycle::soft_delete(&store, org.id).await.expect("failed to soft delete");
	let deleted = lifecycle::get(&store, org.id).await.expect("failed to get");
	assert!(deleted.deleted_at.is_some());

	let err = lifecycle::soft_delete(&store, org.id)
		.await
		.expect_err("soft deleted twice");
	assert!(
		matches!(err, OrganizationError::NotFound("Organization not found or already deleted")),
		"{err:?}"
	);

	let restored = lifecycle::restore(&store, org.id).await.expect("failed to restore");
	assert_eq!(restored.deleted_at, None);

	let err = lifecycle::restore(&store, org.id).await.expect_err("restored twice");
	assert!(
		matches!(err, OrganizationError::NotFound("Organization not found or not deleted")),
		"{err:?}"
	);

	lifecycle::soft_delete(&store, org.id).await.expect("failed to soft delete");
	lifecycle::hard_delete(&store, org.id).await.expect("failed to hard delete");

	let err = lifecycle::get(&store, org.id).await.expect_err("found hard deleted organization");
	assert!(matches!(err, OrganizationError::NotFound(_)), "{err:?}");

	let err = lifecycle::hard_delete(&store, org.id).await.expect_err("hard deleted twice");
	assert!(matches!(err, OrganizationError::Precondition(_)), "{err:?}");
}

#[tokio::test]
async fn bulk_rejects_bad_id_lists() {
	let store = memory_store();

	for request in [BulkIds::default(), bulk(json!([])), bulk(json!("abc")), bulk(json!({ "id": 1 }))] {
		let err = lifecycle::bulk_soft_delete(&store, &request)
			.await
			.expect_err("bad id list accepted");
		assert!(
			matches!(err, OrganizationError::InvalidIds("Please provide an array of IDs")),
			"{err:?}"
		);
	}

	let err = lifecycle::bulk_restore(&store, &bulk(json!(["nope", 12, null])))
		.await
		.expect_err("invalid ids accepted");
	assert!(
		matches!(err, OrganizationError::InvalidIds("No valid organization IDs provided")),
		"{err:?}"
	);
}

#[tokio::test]
async fn bulk_soft_delete_and_restore() {
	let store = memory_store();
	let a = create(&store, "A").await.id;
	let b = create(&store, "B").await.id;
	let c = create_deleted(&store, "C").await;

	let result = lifecycle::bulk_soft_delete(&store, &bulk(json!([a.to_hex(), b.to_hex(), c.to_hex(), "junk"])))
		.await
		.expect("failed to bulk delete");
	assert_eq!(result.modified_count, 2);

	let err = lifecycle::bulk_soft_delete(&store, &bulk(json!([a.to_hex()])))
		.await
		.expect_err("deleted twice");
	assert!(matches!(err, OrganizationError::NotFound(_)), "{err:?}");

	let result = lifecycle::bulk_restore(&store, &bulk(json!([a.to_hex(), a.to_hex(), c.to_hex()])))
		.await
		.expect("failed to bulk restore");
	assert_eq!(result.modified_count, 2);

	assert!(store.find_one(a, Deletion::Active).await.expect("store").is_some());
	assert!(store.find_one(b, Deletion::Deleted).await.expect("store").is_some());
	assert!(store.find_one(c, Deletion::Active).await.expect("store").is_some());

	let err = lifecycle::bulk_restore(&store, &bulk(json!([a.to_hex()])))
		.await
		.expect_err("restored active organization");
	assert!(matches!(err, OrganizationError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn bulk_hard_delete_reports_outcomes() {
	let store = memory_store();
	let deleted = create_deleted(&store, "Deleted").await;
	let active = create(&store, "Active").await.id;
	let missing = ObjectId::new();

	let request = bulk(json!([
		deleted.to_hex(),
		deleted.to_hex(),
		active.to_hex(),
		missing.to_hex(),
		"not-an-id",
	]));

	let result = lifecycle::bulk_hard_delete(&store, &request)
		.await
		.expect("failed to bulk hard delete");

	assert_eq!(result.deleted_count, 1);
	assert_eq!(result.total_requested, 5);
	assert_eq!(result.valid_ids, 3);
	assert_eq!(result.not_soft_deleted, 1);
	assert_eq!(result.not_found, 1);

	assert!(store.find_one(deleted, Deletion::Any).await.expect("store").is_none());
	assert!(store.find_one(active, Deletion::Active).await.expect("store").is_some());
}

#[tokio::test]
async fn bulk_hard_delete_needs_a_soft_deleted_target() {
	let store = memory_store();
	let active = create(&store, "Active").await.id;

	let err = lifecycle::bulk_hard_delete(&store, &bulk(json!([active.to_hex(), ObjectId::new().to_hex()])))
		.await
		.expect_err("hard deleted without soft deleted targets");
	assert!(
		matches!(
			err,
			OrganizationError::Precondition("No soft-deleted organizations found to hard delete")
		),
		"{err:?}"
	);

	assert_eq!(store.len().await, 1);
}

fn logo(file_name: &str, size: usize) -> LogoUpload {
	LogoUpload {
		file_name: file_name.into(),
		data: Bytes::from(vec![0x89; size]),
	}
}

#[tokio::test]
async fn upload_logo_stores_file() {
	let store = memory_store();
	let drive = memory_drive();
	let config = UploadConfig::default();
	let org = create(&store, "Acme").await;

	let updated = lifecycle::upload_logo(&store, &drive, &config, org.id, logo("Logo.PNG", 64))
		.await
		.expect("failed to upload logo");

	let logo_url = updated.logo_url.expect("logo url missing");
	let name = logo_url.strip_prefix("/uploads/").expect("unexpected logo url");
	assert!(name.ends_with(".png"), "{name}");

	let data = drive.read(name).await.expect("logo not stored");
	assert_eq!(data.len(), 64);
}

#[tokio::test]
async fn upload_logo_validates_before_writing() {
	let store = memory_store();
	let drive = memory_drive();
	let config = UploadConfig {
		max_logo_size: 16,
		..Default::default()
	};
	let org = create(&store, "Acme").await;

	let err = lifecycle::upload_logo(&store, &drive, &config, org.id, logo("logo.svg", 8))
		.await
		.expect_err("svg accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");

	let err = lifecycle::upload_logo(&store, &drive, &config, org.id, logo("logo", 8))
		.await
		.expect_err("missing extension accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");

	let err = lifecycle::upload_logo(&store, &drive, &config, org.id, logo("logo.gif", 17))
		.await
		.expect_err("oversized logo accepted");
	assert!(matches!(err, OrganizationError::Validation(_)), "{err:?}");

	assert!(drive.is_empty().await);
}

#[tokio::test]
async fn upload_logo_cleans_up_when_not_found() {
	let store = memory_store();
	let drive = memory_drive();
	let config = UploadConfig::default();
	let id = create_deleted(&store, "Acme").await;

	let err = lifecycle::upload_logo(&store, &drive, &config, id, logo("logo.jpg", 8))
		.await
		.expect_err("logo uploaded to deleted organization");
	assert!(
		matches!(err, OrganizationError::NotFound("Organization not found or deleted")),
		"{err:?}"
	);

	assert!(drive.is_empty().await);
}
