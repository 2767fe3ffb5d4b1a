use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::logging;

/// Environment variables with this prefix override file settings.
/// Nested keys are separated by `__`, e.g. `ORGSVC_HTTP__BIND`.
pub const ENV_PREFIX: &str = "ORGSVC_";

/// Loaded when no configuration file is passed on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrganizationServiceConfig {
	/// Document database configuration
	pub database: DatabaseConfig,
	/// HTTP server configuration
	pub http: HttpConfig,
	/// Logo upload configuration
	pub uploads: UploadConfig,
	/// Logging configuration
	pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DatabaseConfig {
	/// MongoDB
	Mongo(MongoConfig),
	/// Process local store, nothing is persisted
	Memory(MemoryStoreConfig),
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self::Mongo(MongoConfig::default())
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MongoConfig {
	/// The connection string, the default database of the uri is used
	pub uri: String,
	/// How long to wait for the connection and collection setup
	#[serde(with = "humantime_serde")]
	pub connect_timeout: Duration,
}

impl Default for MongoConfig {
	fn default() -> Self {
		Self {
			uri: "mongodb://localhost:27017/orgadmin".into(),
			connect_timeout: Duration::from_secs(3),
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
	/// The maximum number of organizations kept, unlimited if unset
	#[serde(skip_serializing_if = "Option::is_none")]
	pub capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HttpConfig {
	/// The HTTP server address
	pub bind: SocketAddr,
	/// The maximum size of a JSON request body in bytes
	pub body_limit: usize,
	/// Cross origin requests from browsers
	pub cors: CorsConfig,
}

impl Default for HttpConfig {
	fn default() -> Self {
		Self {
			bind: SocketAddr::from(([0, 0, 0, 0], 3008)),
			body_limit: 50 * 1024 * 1024,
			cors: CorsConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CorsConfig {
	/// Origins allowed to call the api, `*` allows any origin and an empty
	/// list disables cross origin requests
	pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
	fn default() -> Self {
		Self {
			allowed_origins: vec!["*".into()],
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UploadConfig {
	/// The path prefix logos are served from
	pub public_prefix: String,
	/// The maximum logo size in bytes
	pub max_logo_size: usize,
	/// Accepted file extensions, compared case-insensitively
	pub allowed_extensions: Vec<String>,
	/// Where uploaded logos are stored
	pub drive: DriveConfig,
}

impl Default for UploadConfig {
	fn default() -> Self {
		Self {
			public_prefix: "/uploads".into(),
			max_logo_size: 5 * 1024 * 1024,
			allowed_extensions: ["jpg", "jpeg", "png", "gif"].into_iter().map(Into::into).collect(),
			drive: DriveConfig::default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DriveConfig {
	/// Local drive
	Local(LocalDriveConfig),
	/// Memory drive
	Memory(MemoryDriveConfig),
}

impl Default for DriveConfig {
	fn default() -> Self {
		Self::Local(LocalDriveConfig::default())
	}
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LocalDriveConfig {
	/// The directory files are written to, created if missing
	pub path: PathBuf,
}

impl Default for LocalDriveConfig {
	fn default() -> Self {
		Self { path: "uploads".into() }
	}
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MemoryDriveConfig {
	/// The maximum capacity of the memory drive in bytes
	#[serde(skip_serializing_if = "Option::is_none")]
	pub capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env filter
	pub level: String,
	/// What logging mode we should use
	pub mode: logging::Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".into(),
			mode: logging::Mode::Default,
		}
	}
}

impl OrganizationServiceConfig {
	/// Builds the settings from the defaults, then each file in order, then
	/// the environment. Optional files that cannot be read are skipped.
	pub fn load<E>(files: &[(PathBuf, bool)], env: E) -> anyhow::Result<Self>
	where
		E: IntoIterator<Item = (String, String)>,
	{
		let mut root = toml::Value::try_from(Self::default()).context("failed to serialize default settings")?;

		for (file, optional) in files {
			if let Some(value) = load_file(file, *optional)? {
				merge(&mut root, value);
			}
		}

		merge(&mut root, env_overrides(env));

		root.try_into().context("failed to parse settings")
	}

	pub fn to_toml_string(&self) -> anyhow::Result<String> {
		toml::to_string_pretty(self).context("failed to serialize settings")
	}
}

fn load_file(file: &Path, optional: bool) -> anyhow::Result<Option<toml::Value>> {
	let contents = match std::fs::read_to_string(file) {
		Ok(contents) => contents,
		Err(err) => {
			if optional {
				return Ok(None);
			}

			return Err(err).with_context(|| format!("error reading configuration file: {}", file.display()));
		}
	};

	let incoming = toml::from_str(&contents)
		.with_context(|| format!("error parsing configuration file: {}", file.display()))?;

	Ok(Some(incoming))
}

fn merge(root: &mut toml::Value, incoming: toml::Value) {
	match (root, incoming) {
		(toml::Value::Table(root), toml::Value::Table(incoming)) => {
			for (key, value) in incoming {
				match root.get_mut(&key) {
					Some(existing) => merge(existing, value),
					None => {
						root.insert(key, value);
					}
				}
			}
		}
		(root, incoming) => *root = incoming,
	}
}

fn env_overrides<E>(env: E) -> toml::Value
where
	E: IntoIterator<Item = (String, String)>,
{
	let mut root = toml::Value::Table(toml::Table::new());

	for (key, value) in env {
		let Some(path) = key.strip_prefix(ENV_PREFIX) else {
			continue;
		};

		let path = path.split("__").map(str::to_lowercase).collect::<Vec<_>>();
		if path.iter().any(String::is_empty) {
			continue;
		}

		let nested = path.into_iter().rev().fold(parse_env_value(&value), |value, key| {
			let mut table = toml::Table::new();
			table.insert(key, value);
			toml::Value::Table(table)
		});

		merge(&mut root, nested);
	}

	root
}

/// Numbers, booleans and arrays keep their TOML type, anything else is taken
/// as a plain string.
fn parse_env_value(value: &str) -> toml::Value {
	format!("value = {value}")
		.parse::<toml::Table>()
		.ok()
		.and_then(|mut table| table.remove("value"))
		.unwrap_or_else(|| toml::Value::String(value.to_owned()))
}
