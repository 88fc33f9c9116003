use std::path::Path;

use anyhow::{anyhow, Result};
use tracing_appender::{
	non_blocking::WorkerGuard,
	rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOGS_DIR_NAME: &str = "logs";

/// Initialize tracing with stdout output and daily rotated logs in `{state_dir}/logs`.
///
/// `RUST_LOG` takes precedence over `level`. The returned guard flushes the
/// file writer when dropped and must live as long as the mount.
pub fn init(state_dir: &Path, level: &str) -> Result<WorkerGuard> {
	let logs_dir = state_dir.join(LOGS_DIR_NAME);
	std::fs::create_dir_all(&logs_dir)?;

	let (file_writer, guard) =
		tracing_appender::non_blocking(RollingFileAppender::new(Rotation::DAILY, logs_dir, "tagfs.log"));

	let env_filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(format!("tagfs={level},tagfs_core={level},tagfs_utils={level}")))?;

	tracing_subscriber::registry()
		.with(env_filter)
		.with(fmt::layer().with_target(true).with_writer(std::io::stdout))
		.with(
			fmt::layer()
				.with_target(true)
				.with_thread_ids(true)
				.with_ansi(false) // No ANSI colors in log files
				.with_writer(file_writer),
		)
		.try_init()
		.map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;

	Ok(guard)
}
