use std::path::PathBuf;

use anyhow::Context;
use clap::ArgAction;

use crate::config::{OrganizationServiceConfig, DEFAULT_CONFIG_FILE};

const GENERATE_ARG_ID: &str = "generate";
const CONFIG_ARG_ID: &str = "config";

pub fn command() -> clap::Command {
	clap::Command::new(env!("CARGO_PKG_NAME"))
		.version(env!("CARGO_PKG_VERSION"))
		.about(env!("CARGO_PKG_DESCRIPTION"))
		.arg(
			clap::Arg::new(CONFIG_ARG_ID)
				.long(CONFIG_ARG_ID)
				.short('c')
				.help("The configuration file to use")
				.value_name("FILE")
				.action(ArgAction::Append),
		)
		.arg(
			clap::Arg::new(GENERATE_ARG_ID)
				.long(GENERATE_ARG_ID)
				.help("Generate a configuration file")
				.value_name("FILE")
				.action(ArgAction::Set)
				.num_args(0..=1)
				.default_missing_value(DEFAULT_CONFIG_FILE),
		)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
	/// Start the service with the loaded settings
	Run(OrganizationServiceConfig),
	/// Write the loaded settings to a file and exit
	Generate {
		file: PathBuf,
		config: OrganizationServiceConfig,
	},
}

/// Loads the settings named by the arguments. Without any `--config` the
/// default file is read if it exists.
pub fn parse<I, T, E>(args: I, env: E) -> anyhow::Result<Invocation>
where
	I: IntoIterator<Item = T>,
	T: Into<std::ffi::OsString> + Clone,
	E: IntoIterator<Item = (String, String)>,
{
	let args = command().try_get_matches_from(args)?;

	let mut files = args
		.get_many::<String>(CONFIG_ARG_ID)
		.map(|files| files.map(|file| (PathBuf::from(file), false)).collect::<Vec<_>>())
		.unwrap_or_default();

	if files.is_empty() {
		files.push((PathBuf::from(DEFAULT_CONFIG_FILE), true));
	}

	let config = OrganizationServiceConfig::load(&files, env)?;

	match args.get_one::<String>(GENERATE_ARG_ID) {
		Some(file) => Ok(Invocation::Generate {
			file: file.into(),
			config,
		}),
		None => Ok(Invocation::Run(config)),
	}
}

pub fn generate(file: &std::path::Path, config: &OrganizationServiceConfig) -> anyhow::Result<()> {
	std::fs::write(file, config.to_toml_string()?)
		.with_context(|| format!("error writing configuration file: {}", file.display()))
}
