use std::path::Path;

use bson::oid::ObjectId;
use bytes::Bytes;

use super::{now, OrganizationError};
use crate::config::UploadConfig;
use crate::database::{Organization, OrganizationPatch, OrganizationStore};
use crate::drive::Drive;
use crate::listing::Deletion;

#[derive(Debug, Clone)]
pub struct LogoUpload {
	/// The name the client gave the file, only its extension is kept
	pub file_name: String,
	pub data: Bytes,
}

fn extension(file_name: &str, allowed: &[String]) -> Option<String> {
	let extension = Path::new(file_name).extension()?.to_str()?.to_lowercase();
	allowed
		.iter()
		.any(|allowed| allowed.eq_ignore_ascii_case(&extension))
		.then_some(extension)
}

/// Stores the file under a fresh name and points the organization at it.
/// The file is removed again if the organization cannot be updated.
pub async fn upload_logo(
	store: &impl OrganizationStore,
	drive: &impl Drive,
	config: &UploadConfig,
	id: ObjectId,
	upload: LogoUpload,
) -> Result<Organization, OrganizationError> {
	let Some(extension) = extension(&upload.file_name, &config.allowed_extensions) else {
		return Err(OrganizationError::Validation("Only image files are allowed".into()));
	};

	if upload.data.len() > config.max_logo_size {
		return Err(OrganizationError::Validation(format!(
			"File too large, the limit is {} bytes",
			config.max_logo_size
		)));
	}

	let name = format!("{}.{extension}", ulid::Ulid::new().to_string().to_lowercase());
	drive.write(&name, upload.data).await?;

	let patch = OrganizationPatch {
		logo_url: Some(format!("{}/{name}", config.public_prefix.trim_end_matches('/'))),
		..OrganizationPatch::at(now())
	};

	let result = match store.update_one(id, Deletion::Active, &patch).await {
		Ok(Some(organization)) => Ok(organization),
		Ok(None) => Err(OrganizationError::NotFound("Organization not found or deleted")),
		Err(err) => Err(err.into()),
	};

	match result {
		Ok(organization) => {
			tracing::info!(%id, file = %name, "logo uploaded");
			Ok(organization)
		}
		Err(err) => {
			if let Err(cleanup) = drive.delete(&name).await {
				tracing::warn!(file = %name, error = %cleanup, "failed to remove orphaned logo");
			}

			Err(err)
		}
	}
}
