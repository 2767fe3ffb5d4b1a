//! Turns raw list query parameters into a storage filter and a page window.

use chrono::{DateTime, Utc};

use crate::database::Organization;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// The query string of the list route. Every field is kept as text so that
/// malformed numbers fall back to defaults instead of failing the request.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct ListQuery {
	pub page: Option<String>,
	pub limit: Option<String>,
	pub search: Option<String>,
	pub status: Option<String>,
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub deleted: Option<String>,
}

/// Which side of the soft-delete line a query is restricted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Deletion {
	/// `deletedAt` is null
	#[default]
	Active,
	/// `deletedAt` is set
	Deleted,
	/// No constraint
	Any,
}

impl Deletion {
	pub fn from_flag(flag: Option<&str>) -> Self {
		match flag.map(str::to_lowercase).as_deref() {
			Some("only") => Self::Deleted,
			Some("all") => Self::Any,
			_ => Self::Active,
		}
	}

	pub fn matches(self, deleted_at: Option<DateTime<Utc>>) -> bool {
		match self {
			Self::Active => deleted_at.is_none(),
			Self::Deleted => deleted_at.is_some(),
			Self::Any => true,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationFilter {
	/// Case-insensitive substring of the name
	pub search: String,
	/// Case-insensitive substring of the status
	pub status: String,
	/// Exact type, unconstrained when `None`
	pub kind: Option<String>,
	pub deletion: Deletion,
}

impl OrganizationFilter {
	pub fn matches(&self, organization: &Organization) -> bool {
		contains_ignore_case(&organization.name, &self.search)
			&& contains_ignore_case(organization.status.as_str(), &self.status)
			&& self
				.kind
				.as_deref()
				.map_or(true, |kind| organization.kind.as_str() == kind)
			&& self.deletion.matches(organization.deleted_at)
	}
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
	needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
	pub skip: u64,
	pub take: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
	pub page: u64,
	pub limit: u64,
	pub filter: OrganizationFilter,
}

impl ListParams {
	pub fn from_query(query: &ListQuery) -> Self {
		let kind = query.kind.as_deref().unwrap_or_default();

		Self {
			page: parse_positive(query.page.as_deref()).unwrap_or(DEFAULT_PAGE),
			limit: parse_positive(query.limit.as_deref()).unwrap_or(DEFAULT_LIMIT),
			filter: OrganizationFilter {
				search: query.search.clone().unwrap_or_default(),
				status: query.status.clone().unwrap_or_default(),
				kind: (!kind.is_empty()).then(|| kind.to_owned()),
				deletion: Deletion::from_flag(query.deleted.as_deref()),
			},
		}
	}

	pub fn pagination(&self) -> Pagination {
		Pagination {
			// the mongo driver sends skip as a signed 64 bit integer
			skip: (self.page - 1).saturating_mul(self.limit).min(i64::MAX as u64),
			take: self.limit,
		}
	}
}

fn parse_positive(value: Option<&str>) -> Option<u64> {
	value?.trim().parse::<u64>().ok().filter(|value| *value > 0)
}

/// At least one page, even when nothing matched.
pub fn total_pages(total: u64, limit: u64) -> u64 {
	total.div_ceil(limit.max(1)).max(1)
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
	pub page: u64,
	pub limit: u64,
	pub total: u64,
	pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OrganizationPage {
	pub items: Vec<Organization>,
	pub meta: PageMeta,
}
