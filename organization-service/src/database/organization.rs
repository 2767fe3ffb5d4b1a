use bson::oid::ObjectId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrganizationType {
	#[serde(rename = "TRAVEL_AGENT")]
	TravelAgent,
	#[serde(rename = "SUPPLIER")]
	Supplier,
	#[serde(rename = "TRAVEL_AGENT + SUPPLIER")]
	TravelAgentAndSupplier,
	#[serde(rename = "PLATFORM")]
	Platform,
}

impl OrganizationType {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::TravelAgent => "TRAVEL_AGENT",
			Self::Supplier => "SUPPLIER",
			Self::TravelAgentAndSupplier => "TRAVEL_AGENT + SUPPLIER",
			Self::Platform => "PLATFORM",
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrganizationStatus {
	#[default]
	Approved,
	Suspended,
}

impl OrganizationStatus {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Approved => "APPROVED",
			Self::Suspended => "SUSPENDED",
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gst_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pan_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tin_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub registration_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub city: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pin_code: Option<String>,
}

/// A tenant account. `deleted_at` is the soft-delete marker, an organization
/// with it set is hidden from every operation except listing with the
/// deleted filter, restore and hard delete.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
	#[serde(serialize_with = "bson::serde_helpers::serialize_object_id_as_hex_string")]
	pub id: ObjectId,
	pub name: String,
	/// Unique across all organizations, deleted ones included
	pub slug: String,
	#[serde(rename = "type")]
	pub kind: OrganizationType,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub business_info: Option<BusinessInfo>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub contact_details: Option<ContactDetails>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub address: Option<Address>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub logo_url: Option<String>,
	pub status: OrganizationStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub root_user: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub created_by: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub deleted_at: Option<DateTime<Utc>>,
}

/// A partial update. Unset fields are left alone, `updated_at` is always
/// written.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationPatch {
	pub name: Option<String>,
	pub slug: Option<String>,
	pub kind: Option<OrganizationType>,
	pub business_info: Option<BusinessInfo>,
	pub contact_details: Option<ContactDetails>,
	pub address: Option<Address>,
	pub logo_url: Option<String>,
	pub status: Option<OrganizationStatus>,
	pub root_user: Option<String>,
	pub created_by: Option<String>,
	/// `Some(None)` clears the soft-delete marker
	pub deleted_at: Option<Option<DateTime<Utc>>>,
	pub updated_at: DateTime<Utc>,
}

impl OrganizationPatch {
	pub fn at(now: DateTime<Utc>) -> Self {
		Self {
			name: None,
			slug: None,
			kind: None,
			business_info: None,
			contact_details: None,
			address: None,
			logo_url: None,
			status: None,
			root_user: None,
			created_by: None,
			deleted_at: None,
			updated_at: now,
		}
	}

	pub fn apply(&self, organization: &mut Organization) {
		if let Some(name) = &self.name {
			organization.name = name.clone();
		}
		if let Some(slug) = &self.slug {
			organization.slug = slug.clone();
		}
		if let Some(kind) = self.kind {
			organization.kind = kind;
		}
		if let Some(business_info) = &self.business_info {
			organization.business_info = Some(business_info.clone());
		}
		if let Some(contact_details) = &self.contact_details {
			organization.contact_details = Some(contact_details.clone());
		}
		if let Some(address) = &self.address {
			organization.address = Some(address.clone());
		}
		if let Some(logo_url) = &self.logo_url {
			organization.logo_url = Some(logo_url.clone());
		}
		if let Some(status) = self.status {
			organization.status = status;
		}
		if let Some(root_user) = &self.root_user {
			organization.root_user = Some(root_user.clone());
		}
		if let Some(created_by) = &self.created_by {
			organization.created_by = Some(created_by.clone());
		}
		if let Some(deleted_at) = self.deleted_at {
			organization.deleted_at = deleted_at;
		}

		organization.updated_at = self.updated_at;
	}
}
