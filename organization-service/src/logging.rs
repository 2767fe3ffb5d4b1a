use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	#[default]
	Default,
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("invalid log level: {0}")]
	InvalidLevel(#[from] tracing_subscriber::filter::ParseError),
	#[error("failed to init logger: {0}")]
	Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber. Only the first call has an effect.
pub fn init(level: &str, mode: Mode) -> Result<(), LoggingError> {
	INITIALIZED.get_or_try_init(|| {
		let env_filter = EnvFilter::from_str(level)?;

		let builder = tracing_subscriber::fmt()
			.with_line_number(true)
			.with_file(true)
			.with_env_filter(env_filter);

		match mode {
			Mode::Default => builder.finish().try_init()?,
			Mode::Json => builder.json().finish().try_init()?,
			Mode::Pretty => builder.pretty().finish().try_init()?,
			Mode::Compact => builder.compact().finish().try_init()?,
		}

		Ok::<_, LoggingError>(())
	})?;

	Ok(())
}
