use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use fuser::MountOption;
use tagfs_core::TagFs;
use tracing::info;

mod config;
mod fuse;
mod inode;
mod logging;

use config::MountConfig;
use fuse::{mount_option, TagFsFuse};

#[derive(Parser, Debug)]
#[command(name = "tagfs", version, about = "Mount a tag space as a file system")]
struct Cli {
	/// Directory holding file content and the tag database
	#[arg(env = "TAGFS_DATA_DIR")]
	data_dir: PathBuf,

	/// Where to mount the tag space
	#[arg(env = "TAGFS_MOUNTPOINT")]
	mountpoint: PathBuf,

	/// Extra mount options, comma separated
	#[arg(short = 'o', value_delimiter = ',')]
	options: Vec<String>,

	/// Log level for the tagfs crates, overriding the saved config
	#[arg(long, env = "TAGFS_LOG_LEVEL")]
	log_level: Option<String>,

	/// Let other users access the mount
	#[arg(long, env = "TAGFS_ALLOW_OTHER")]
	allow_other: bool,

	/// Unmount when the process exits
	#[arg(long, env = "TAGFS_AUTO_UNMOUNT")]
	auto_unmount: bool,

	/// Attribute cache timeout in seconds
	#[arg(long, env = "TAGFS_ATTR_TTL")]
	attr_ttl: Option<u64>,

	/// Let the kernel cache file content
	#[arg(long)]
	no_direct_io: bool,
}

impl Cli {
	fn apply(&self, config: &mut MountConfig) {
		if let Some(level) = &self.log_level {
			config.log_level.clone_from(level);
		}
		if let Some(ttl) = self.attr_ttl {
			config.attr_ttl_secs = ttl;
		}
		config.allow_other |= self.allow_other;
		config.auto_unmount |= self.auto_unmount;
		if self.no_direct_io {
			config.direct_io = false;
		}
	}

	fn mount_options(&self, config: &MountConfig) -> Vec<MountOption> {
		let mut options = vec![
			MountOption::FSName("tagfs".to_string()),
			MountOption::Subtype("tagfs".to_string()),
		];
		if config.allow_other {
			options.push(MountOption::AllowOther);
		}
		if config.auto_unmount {
			options.push(MountOption::AutoUnmount);
		}
		options.extend(
			self.options
				.iter()
				.filter(|option| !option.is_empty())
				.map(|option| mount_option(option)),
		);
		options
	}
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let fs = TagFs::open(&cli.data_dir, None)
		.with_context(|| format!("failed to open tag space at {}", cli.data_dir.display()))?;

	let state_dir = TagFs::state_dir(&cli.data_dir);
	let mut config = MountConfig::load_or_create(&state_dir)?;
	cli.apply(&mut config);

	let _guard = logging::init(&state_dir, &config.log_level)?;

	let options = cli.mount_options(&config);
	info!(
		data_dir = %cli.data_dir.display(),
		mountpoint = %cli.mountpoint.display(),
		?options,
		"Mounting tag space"
	);

	let adapter = TagFsFuse::new(
		fs,
		Duration::from_secs(config.attr_ttl_secs),
		config.direct_io,
	);

	fuser::mount2(adapter, &cli.mountpoint, &options)
		.with_context(|| format!("failed to mount at {}", cli.mountpoint.display()))?;

	info!("Tag space unmounted cleanly");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_flags_override_saved_config() {
		let cli = Cli::parse_from([
			"tagfs",
			"/data",
			"/mnt",
			"-o",
			"ro,noatime",
			"--log-level",
			"debug",
			"--allow-other",
			"--no-direct-io",
		]);

		let mut config = MountConfig::default();
		cli.apply(&mut config);
		assert_eq!(config.log_level, "debug");
		assert!(config.allow_other);
		assert!(!config.auto_unmount);
		assert!(!config.direct_io);

		let options = cli.mount_options(&config);
		assert!(options.contains(&MountOption::AllowOther));
		assert!(options.contains(&MountOption::RO));
		assert!(options.contains(&MountOption::NoAtime));
		assert!(!options.contains(&MountOption::AutoUnmount));
	}
}
