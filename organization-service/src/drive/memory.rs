use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::{validate_name, Drive, DriveError};
use crate::config::MemoryDriveConfig;

#[derive(Debug, Clone, thiserror::Error)]
pub enum MemoryDriveError {
	#[error("{needed} bytes needed, {available} available")]
	Full { needed: usize, available: usize },
}

#[derive(Debug, Default)]
struct Files {
	used: usize,
	entries: HashMap<String, Bytes>,
}

/// Keeps files in process, bounded by a total size in bytes.
#[derive(Debug)]
pub struct MemoryDrive {
	capacity: usize,
	files: RwLock<Files>,
}

impl MemoryDrive {
	pub fn new(config: &MemoryDriveConfig) -> Self {
		Self {
			capacity: config.capacity.unwrap_or(usize::MAX),
			files: RwLock::default(),
		}
	}

	pub async fn len(&self) -> usize {
		self.files.read().await.entries.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.files.read().await.entries.is_empty()
	}
}

impl Drive for MemoryDrive {
	fn name(&self) -> &str {
		"memory"
	}

	async fn read(&self, name: &str) -> Result<Bytes, DriveError> {
		validate_name(name)?;

		let files = self.files.read().await;
		files.entries.get(name).cloned().ok_or(DriveError::NotFound)
	}

	#[tracing::instrument(skip(self, data), name = "MemoryDrive::write", fields(size = data.len()), err)]
	async fn write(&self, name: &str, data: Bytes) -> Result<(), DriveError> {
		validate_name(name)?;

		let mut files = self.files.write().await;
		let replaced = files.entries.get(name).map_or(0, Bytes::len);
		let available = self.capacity - (files.used - replaced);
		if data.len() > available {
			return Err(MemoryDriveError::Full {
				needed: data.len(),
				available,
			}
			.into());
		}

		files.used = files.used - replaced + data.len();
		files.entries.insert(name.to_owned(), data);
		Ok(())
	}

	async fn delete(&self, name: &str) -> Result<(), DriveError> {
		validate_name(name)?;

		let mut files = self.files.write().await;
		let data = files.entries.remove(name).ok_or(DriveError::NotFound)?;
		files.used -= data.len();
		Ok(())
	}
}
