use std::future::Future;

use bytes::Bytes;

use self::local::{LocalDrive, LocalDriveError};
use self::memory::{MemoryDrive, MemoryDriveError};
use crate::config::DriveConfig;

pub mod local;
pub mod memory;

#[derive(Debug, thiserror::Error)]
pub enum DriveError {
	#[error("local: {0}")]
	Local(#[from] LocalDriveError),
	#[error("memory: {0}")]
	Memory(#[from] MemoryDriveError),
	#[error("invalid file name: {0}")]
	InvalidName(String),
	#[error("not found")]
	NotFound,
}

/// Where uploaded logos live. Files are addressed by a flat name, there are
/// no directories.
pub trait Drive {
	/// Shown in logs
	fn name(&self) -> &str;

	fn read(&self, name: &str) -> impl Future<Output = Result<Bytes, DriveError>> + Send;

	/// Replaces the file if it exists
	fn write(&self, name: &str, data: Bytes) -> impl Future<Output = Result<(), DriveError>> + Send;

	fn delete(&self, name: &str) -> impl Future<Output = Result<(), DriveError>> + Send;

	fn healthy(&self) -> impl Future<Output = bool> + Send {
		async { true }
	}
}

/// File names are single path components that do not start with a dot.
pub fn validate_name(name: &str) -> Result<(), DriveError> {
	if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
		return Err(DriveError::InvalidName(name.to_owned()));
	}

	Ok(())
}

#[derive(Debug)]
pub enum AnyDrive {
	Local(LocalDrive),
	Memory(MemoryDrive),
}

impl Drive for AnyDrive {
	fn name(&self) -> &str {
		match self {
			Self::Local(local) => local.name(),
			Self::Memory(memory) => memory.name(),
		}
	}

	async fn read(&self, name: &str) -> Result<Bytes, DriveError> {
		match self {
			Self::Local(local) => local.read(name).await,
			Self::Memory(memory) => memory.read(name).await,
		}
	}

	async fn write(&self, name: &str, data: Bytes) -> Result<(), DriveError> {
		match self {
			Self::Local(local) => local.write(name, data).await,
			Self::Memory(memory) => memory.write(name, data).await,
		}
	}

	async fn delete(&self, name: &str) -> Result<(), DriveError> {
		match self {
			Self::Local(local) => local.delete(name).await,
			Self::Memory(memory) => memory.delete(name).await,
		}
	}

	async fn healthy(&self) -> bool {
		match self {
			Self::Local(local) => local.healthy().await,
			Self::Memory(memory) => memory.healthy().await,
		}
	}
}

pub async fn build_drive(config: &DriveConfig) -> Result<AnyDrive, DriveError> {
	let drive = match config {
		DriveConfig::Local(config) => AnyDrive::Local(LocalDrive::new(config).await?),
		DriveConfig::Memory(config) => AnyDrive::Memory(MemoryDrive::new(config)),
	};

	tracing::debug!(drive = %drive.name(), "upload drive built");

	Ok(drive)
}
