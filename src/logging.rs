use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use crate::config::LogConfig;

pub fn level_filter(level: &str) -> LevelFilter {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" | "none" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs a file logger. Stdout is owned by the terminal UI, so nothing is
/// logged when no file is configured.
pub fn init(cfg: &LogConfig) -> Result<()> {
    let level = level_filter(&cfg.level);
    let Some(path) = cfg.file.as_deref() else {
        return Ok(());
    };
    if level == LevelFilter::Off {
        return Ok(());
    }

    let file = open_log_file(path)?;
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();
    WriteLogger::init(level, log_config, file).context("install logger")?;
    Ok(())
}

fn open_log_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("log: failed to create directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("log: failed to open {}", path.display()))
}
