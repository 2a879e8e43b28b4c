use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::errors::AppError;
use crate::model::{DEFAULT_CONCURRENCY, ScanOptions};

#[derive(Debug, Parser)]
#[command(name = "bigfiles")]
#[command(about = "Find large files and delete, trash or move them")]
pub struct Cli {
    /// Root directory to scan
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Minimum file size to report (e.g. 500M, 1G, 1.5GiB or plain bytes)
    #[arg(short, long, default_value = "1G", value_parser = parse_size)]
    pub threshold: u64,

    /// Number of directories enumerated concurrently
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub workers: usize,

    /// Minimum delay between match batches, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub flush_ms: u64,

    /// Show cleanup advice next to each match
    #[arg(long, default_value_t = false)]
    pub advice: bool,

    /// Delete every match
    #[arg(long, conflicts_with_all = ["trash", "move_to"])]
    pub delete: bool,

    /// Move every match to the trash
    #[arg(long, conflicts_with = "move_to")]
    pub trash: bool,

    /// Move every match into this directory
    #[arg(long, value_name = "DIR")]
    pub move_to: Option<PathBuf>,

    /// Reveal every match in the file manager
    #[arg(long, default_value_t = false)]
    pub reveal: bool,

    /// Carry out --delete, --trash or --move-to without a dry run
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,

    /// Log filter, e.g. "debug" (defaults to $BIGFILES_LOG, then "warn")
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Action {
    List,
    Delete,
    Trash,
    Move(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub scan_options: ScanOptions,
    pub action: Action,
    pub confirmed: bool,
    pub show_advice: bool,
    pub reveal: bool,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self, AppError> {
        if cli.threshold == 0 {
            return Err(AppError::InvalidInput(
                "threshold must be greater than zero".to_string(),
            ));
        }
        if cli.workers == 0 {
            return Err(AppError::InvalidInput(
                "workers must be greater than zero".to_string(),
            ));
        }

        let root = std::fs::canonicalize(&cli.path).map_err(|error| {
            AppError::InvalidInput(format!("cannot resolve {}: {error}", cli.path.display()))
        })?;

        let action = if cli.delete {
            Action::Delete
        } else if cli.trash {
            Action::Trash
        } else if let Some(destination) = cli.move_to {
            Action::Move(destination)
        } else {
            Action::List
        };

        Ok(Self {
            scan_options: ScanOptions {
                root,
                threshold_bytes: cli.threshold,
                concurrency: cli.workers,
                flush_interval: Duration::from_millis(cli.flush_ms),
            },
            action,
            confirmed: cli.yes,
            show_advice: cli.advice,
            reveal: cli.reveal,
        })
    }
}

/// Parses sizes like `1048576`, `512K`, `1.5G` or `2GiB`. Units are binary.
pub fn parse_size(raw: &str) -> Result<u64, String> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid size: {raw:?}"))?;

    let multiplier: u64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kb" | "kib" => 1 << 10,
        "m" | "mb" | "mib" => 1 << 20,
        "g" | "gb" | "gib" => 1 << 30,
        "t" | "tb" | "tib" => 1 << 40,
        other => return Err(format!("unknown size unit: {other:?}")),
    };

    let bytes = value * multiplier as f64;
    if !bytes.is_finite() || bytes < 1.0 || bytes > u64::MAX as f64 {
        return Err(format!("size out of range: {raw:?}"));
    }
    Ok(bytes as u64)
}

/// Renders a byte count in the binary units `--threshold` accepts, with
/// fewer decimals as the value grows so report columns stay narrow.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let decimals = match value {
        v if v < 10.0 => 2,
        v if v < 100.0 => 1,
        _ => 0,
    };
    format!("{value:.decimals$} {}", UNITS[unit])
}
