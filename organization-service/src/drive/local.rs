use std::io::ErrorKind;
use std::path::PathBuf;

use bytes::Bytes;

use super::{validate_name, Drive, DriveError};
use crate::config::LocalDriveConfig;

/// Files in one directory on disk.
#[derive(Debug)]
pub struct LocalDrive {
	label: String,
	root: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum LocalDriveError {
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
}

impl From<std::io::Error> for DriveError {
	fn from(err: std::io::Error) -> Self {
		match err.kind() {
			ErrorKind::NotFound => Self::NotFound,
			_ => Self::Local(LocalDriveError::Io(err)),
		}
	}
}

impl LocalDrive {
	#[tracing::instrument(skip(config), name = "LocalDrive::new", fields(root = %config.path.display()), err)]
	pub async fn new(config: &LocalDriveConfig) -> Result<Self, DriveError> {
		tokio::fs::create_dir_all(&config.path).await?;

		Ok(Self {
			label: format!("local:{}", config.path.display()),
			root: config.path.clone(),
		})
	}

	fn file(&self, name: &str) -> Result<PathBuf, DriveError> {
		validate_name(name)?;
		Ok(self.root.join(name))
	}
}

impl Drive for LocalDrive {
	fn name(&self) -> &str {
		&self.label
	}

	#[tracing::instrument(skip(self), name = "LocalDrive::read", err)]
	async fn read(&self, name: &str) -> Result<Bytes, DriveError> {
		let data = tokio::fs::read(self.file(name)?).await?;
		Ok(Bytes::from(data))
	}

	#[tracing::instrument(skip(self, data), name = "LocalDrive::write", fields(size = data.len()), err)]
	async fn write(&self, name: &str, data: Bytes) -> Result<(), DriveError> {
		tokio::fs::write(self.file(name)?, &data).await?;
		Ok(())
	}

	#[tracing::instrument(skip(self), name = "LocalDrive::delete", err)]
	async fn delete(&self, name: &str) -> Result<(), DriveError> {
		tokio::fs::remove_file(self.file(name)?).await?;
		Ok(())
	}

	async fn healthy(&self) -> bool {
		tokio::fs::metadata(&self.root).await.is_ok_and(|meta| meta.is_dir())
	}
}
