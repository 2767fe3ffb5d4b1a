use bson::oid::ObjectId;
use bson::{doc, Bson};
use chrono::{TimeZone, Utc};

use crate::database::mongo::{filter_document, id_document, ids_document, slug_document, update_document};
use crate::database::{OrganizationPatch, OrganizationStatus};
use crate::listing::{Deletion, ListParams, ListQuery};

#[test]
fn default_filter_matches_active() {
	let params = ListParams::from_query(&ListQuery::default());

	assert_eq!(
		filter_document(&params.filter),
		doc! {
			"name": { "$regex": "", "$options": "i" },
			"status": { "$regex": "", "$options": "i" },
			"deletedAt": Bson::Null,
		}
	);
}

#[test]
fn filter_escapes_search_and_constrains_type() {
	let params = ListParams::from_query(&ListQuery {
		search: Some("a.b (c)".into()),
		status: Some("app".into()),
		kind: Some("TRAVEL_AGENT + SUPPLIER".into()),
		deleted: Some("only".into()),
		..Default::default()
	});

	assert_eq!(
		filter_document(&params.filter),
		doc! {
			"name": { "$regex": "a\\.b \\(c\\)", "$options": "i" },
			"status": { "$regex": "app", "$options": "i" },
			"type": "TRAVEL_AGENT + SUPPLIER",
			"deletedAt": { "$ne": Bson::Null },
		}
	);
}

#[test]
fn deleted_all_has_no_deletion_constraint() {
	let id = ObjectId::new();

	assert_eq!(id_document(id, Deletion::Any), doc! { "_id": id });
	assert_eq!(
		ids_document(&[id], Deletion::Active),
		doc! { "_id": { "$in": [id] }, "deletedAt": Bson::Null }
	);
}

#[test]
fn slug_lookup_can_exclude_an_organization() {
	let id = ObjectId::new();

	assert_eq!(slug_document("acme", None), doc! { "slug": "acme" });
	assert_eq!(
		slug_document("acme", Some(id)),
		doc! { "slug": "acme", "_id": { "$ne": id } }
	);
}

#[test]
fn update_sets_only_patched_fields() {
	let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

	let patch = OrganizationPatch {
		status: Some(OrganizationStatus::Suspended),
		deleted_at: Some(None),
		..OrganizationPatch::at(now)
	};

	assert_eq!(
		update_document(&patch).expect("failed to build update"),
		doc! {
			"$set": {
				"updatedAt": bson::DateTime::from_chrono(now),
				"status": "SUSPENDED",
				"deletedAt": Bson::Null,
			}
		}
	);
}
