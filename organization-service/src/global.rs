use anyhow::Context;

use crate::config::{DatabaseConfig, OrganizationServiceConfig};
use crate::database::{build_store, AnyOrganizationStore, OrganizationStore};
use crate::drive::{build_drive, AnyDrive, Drive};

pub struct Global {
	config: OrganizationServiceConfig,
	store: AnyOrganizationStore,
	drive: AnyDrive,
}

impl Global {
	pub async fn new(config: OrganizationServiceConfig) -> anyhow::Result<Self> {
		const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(3);

		let timeout = match &config.database {
			DatabaseConfig::Mongo(mongo) => mongo.connect_timeout,
			DatabaseConfig::Memory(_) => DEFAULT_TIMEOUT,
		};

		tracing::debug!("setting up organization store");

		let store = tokio::time::timeout(timeout, build_store(&config.database))
			.await
			.context("store timeout")?
			.context("store")?;

		tracing::debug!("setting up upload drive");

		let drive = tokio::time::timeout(DEFAULT_TIMEOUT, build_drive(&config.uploads.drive))
			.await
			.context("drive timeout")?
			.context("drive")?;

		tracing::info!(drive = %drive.name(), "upload drive ready");

		Ok(Self::from_parts(config, store, drive))
	}

	pub fn from_parts(config: OrganizationServiceConfig, store: AnyOrganizationStore, drive: AnyDrive) -> Self {
		Self { config, store, drive }
	}

	pub fn config(&self) -> &OrganizationServiceConfig {
		&self.config
	}

	pub fn store(&self) -> &AnyOrganizationStore {
		&self.store
	}

	pub fn drive(&self) -> &AnyDrive {
		&self.drive
	}

	pub async fn healthy(&self) -> bool {
		if !self.store.healthy().await {
			tracing::error!("store check failed");
			return false;
		}

		if !self.drive.healthy().await {
			tracing::error!(name = %self.drive.name(), "drive check failed");
			return false;
		}

		true
	}
}
