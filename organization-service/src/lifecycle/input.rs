use crate::database::{Address, BusinessInfo, ContactDetails, OrganizationStatus, OrganizationType};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateOrganization {
	pub name: String,
	/// Derived from the name when absent
	#[serde(default)]
	pub slug: Option<String>,
	#[serde(rename = "type")]
	pub kind: OrganizationType,
	#[serde(default)]
	pub business_info: Option<BusinessInfo>,
	#[serde(default)]
	pub contact_details: Option<ContactDetails>,
	#[serde(default)]
	pub address: Option<Address>,
	#[serde(default)]
	pub status: Option<OrganizationStatus>,
	#[serde(default)]
	pub root_user: Option<String>,
	#[serde(default)]
	pub created_by: Option<String>,
}

impl CreateOrganization {
	pub fn new(name: impl Into<String>, kind: OrganizationType) -> Self {
		Self {
			name: name.into(),
			slug: None,
			kind,
			business_info: None,
			contact_details: None,
			address: None,
			status: None,
			root_user: None,
			created_by: None,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateOrganization {
	#[serde(default)]
	pub name: Option<String>,
	#[serde(default)]
	pub slug: Option<String>,
	#[serde(default, rename = "type")]
	pub kind: Option<OrganizationType>,
	#[serde(default)]
	pub business_info: Option<BusinessInfo>,
	#[serde(default)]
	pub contact_details: Option<ContactDetails>,
	#[serde(default)]
	pub address: Option<Address>,
	#[serde(default)]
	pub status: Option<OrganizationStatus>,
	#[serde(default)]
	pub root_user: Option<String>,
	#[serde(default)]
	pub created_by: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatus {
	pub status: OrganizationStatus,
}

/// The body of the bulk routes. `ids` is kept untyped so that a missing or
/// non-array value is reported like an empty one.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkIds {
	#[serde(default)]
	pub ids: Option<serde_json::Value>,
}

/// Lowercases the name and joins its alphanumeric runs with `-`.
pub fn slugify(name: &str) -> String {
	name.split(|c: char| !c.is_alphanumeric())
		.filter(|part| !part.is_empty())
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join("-")
}
