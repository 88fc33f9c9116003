//! Mount configuration persisted next to the tag database

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
	fs,
	path::{Path, PathBuf},
};
use tracing::{info, warn};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
	/// Config schema version
	pub version: u32,

	/// Default log level for the tagfs crates
	pub log_level: String,

	/// How long the kernel may cache attributes and lookups, in seconds
	#[serde(default = "default_attr_ttl_secs")]
	pub attr_ttl_secs: u64,

	/// Let users other than the mounting one access the mount
	#[serde(default)]
	pub allow_other: bool,

	/// Unmount automatically when the process exits
	#[serde(default)]
	pub auto_unmount: bool,

	/// Bypass the page cache for file content
	#[serde(default = "default_direct_io")]
	pub direct_io: bool,
}

const fn default_attr_ttl_secs() -> u64 {
	1
}

const fn default_direct_io() -> bool {
	true
}

impl Default for MountConfig {
	fn default() -> Self {
		Self {
			version: Self::target_version(),
			log_level: "info".to_string(),
			attr_ttl_secs: default_attr_ttl_secs(),
			allow_other: false,
			auto_unmount: false,
			direct_io: default_direct_io(),
		}
	}
}

impl MountConfig {
	pub const fn target_version() -> u32 {
		1
	}

	pub fn path(state_dir: &Path) -> PathBuf {
		state_dir.join(CONFIG_FILE_NAME)
	}

	/// Load the configuration kept in `state_dir`, writing the defaults there
	/// on first run
	pub fn load_or_create(state_dir: &Path) -> Result<Self> {
		let config_path = Self::path(state_dir);

		if config_path.exists() {
			info!("Loading config from {:?}", config_path);
			let json = fs::read_to_string(&config_path)
				.with_context(|| format!("failed to read {}", config_path.display()))?;
			let mut config: Self = serde_json::from_str(&json)
				.with_context(|| format!("failed to parse {}", config_path.display()))?;

			if config.version < Self::target_version() {
				info!(
					"Migrating config from v{} to v{}",
					config.version,
					Self::target_version()
				);
				config.version = Self::target_version();
				config.save(state_dir)?;
			}

			Ok(config)
		} else {
			warn!("No config found, creating default at {:?}", config_path);
			let config = Self::default();
			config.save(state_dir)?;
			Ok(config)
		}
	}

	pub fn save(&self, state_dir: &Path) -> Result<()> {
		fs::create_dir_all(state_dir)?;

		let config_path = Self::path(state_dir);
		let json = serde_json::to_string_pretty(self)?;
		fs::write(&config_path, json)
			.with_context(|| format!("failed to write {}", config_path.display()))?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn creates_defaults_on_first_run() {
		let dir = tempfile::tempdir().unwrap();

		let config = MountConfig::load_or_create(dir.path()).unwrap();
		assert_eq!(config, MountConfig::default());
		assert!(MountConfig::path(dir.path()).is_file());
	}

	#[test]
	fn reloads_saved_values() {
		let dir = tempfile::tempdir().unwrap();
		let config = MountConfig {
			log_level: "debug".to_string(),
			allow_other: true,
			..MountConfig::default()
		};
		config.save(dir.path()).unwrap();

		assert_eq!(MountConfig::load_or_create(dir.path()).unwrap(), config);
	}

	#[test]
	fn migrates_old_versions_and_fills_missing_fields() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(
			MountConfig::path(dir.path()),
			r#"{ "version": 0, "log_level": "warn" }"#,
		)
		.unwrap();

		let config = MountConfig::load_or_create(dir.path()).unwrap();
		assert_eq!(config.version, MountConfig::target_version());
		assert_eq!(config.log_level, "warn");
		assert!(config.direct_io);

		let saved = fs::read_to_string(MountConfig::path(dir.path())).unwrap();
		assert!(saved.contains(r#""version": 1"#));
	}
}
