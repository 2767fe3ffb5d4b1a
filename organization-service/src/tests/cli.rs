use std::path::PathBuf;

use crate::cli::{self, Invocation};
use crate::config::OrganizationServiceConfig;

#[test]
fn explicit_config_files() {
	let dir = tempfile::tempdir().expect("failed to create temp dir");
	let missing = dir.path().join("missing.toml");

	let invocation = cli::parse(["organization-service", "-c", missing.to_str().expect("path")], Vec::new());
	assert!(invocation.is_err(), "explicit config files are required");

	let file = dir.path().join("config.toml");
	std::fs::write(&file, "[logging]\nlevel = \"warn\"\n").expect("failed to write config");

	let invocation = cli::parse(
		["organization-service", "--config", file.to_str().expect("path")],
		Vec::new(),
	)
	.expect("failed to parse");

	match invocation {
		Invocation::Run(config) => assert_eq!(config.logging.level, "warn"),
		other => panic!("unexpected invocation: {other:?}"),
	}
}

#[test]
fn generate_defaults_to_config_toml() {
	let invocation = cli::parse(["organization-service", "--generate"], Vec::new()).expect("failed to parse");

	assert_eq!(
		invocation,
		Invocation::Generate {
			file: PathBuf::from("config.toml"),
			config: OrganizationServiceConfig::load(&[(PathBuf::from("config.toml"), true)], Vec::new())
				.expect("failed to load"),
		}
	);
}

#[test]
fn generate_writes_loadable_file() {
	let dir = tempfile::tempdir().expect("failed to create temp dir");
	let file = dir.path().join("out.toml");
	let config = OrganizationServiceConfig::default();

	cli::generate(&file, &config).expect("failed to generate");

	let loaded = OrganizationServiceConfig::load(&[(file, false)], Vec::new()).expect("failed to load");
	assert_eq!(loaded, config);
}

#[test]
fn unknown_arguments_fail() {
	let err = cli::parse(["organization-service", "--nope"], Vec::new()).expect_err("unknown argument accepted");
	assert!(err.downcast_ref::<clap::Error>().is_some());
}
