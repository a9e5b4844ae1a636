use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AwrError;

// ── FailurePolicy ──────────────────────────────────────────────────────────────

/// What the batch runner does when one document fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the batch and commit nothing.
    #[default]
    Abort,
    /// Log the failure, leave the document out and keep going.
    Skip,
}

impl std::str::FromStr for FailurePolicy {
    type Err = AwrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "skip" => Ok(FailurePolicy::Skip),
            other => Err(AwrError::Config(format!("unknown failure policy: {other}"))),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("abort"),
            FailurePolicy::Skip => f.write_str("skip"),
        }
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Flatten AWR HTML reports into a feature table
#[derive(Parser, Debug, Clone)]
#[command(
    name = "awr-profiler",
    about = "Flatten AWR HTML reports into a feature table",
    version
)]
pub struct Settings {
    /// Run mode
    #[arg(long, default_value = "batch", value_parser = ["batch", "parse"])]
    pub mode: String,

    /// Directory of .html reports (batch mode)
    #[arg(long, default_value = "data/raw_awr_reports")]
    pub input_dir: PathBuf,

    /// CSV output path (batch mode)
    #[arg(long, default_value = "data/awr_metrics.csv")]
    pub output: PathBuf,

    /// Single report to flatten (parse mode)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Parallel parse workers (1-64)
    #[arg(long, default_value = "4", value_parser = clap::value_parser!(u32).range(1..=64))]
    pub workers: u32,

    /// Behaviour when one report fails to parse
    #[arg(long, default_value = "abort", value_parser = ["abort", "skip"])]
    pub on_error: String,

    /// Logging level
    #[arg(
        long,
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.awr-profiler/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<u32>,
}

impl LastUsedParams {
    /// `~/.awr-profiler/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".awr-profiler").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit args and config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins; 'mode', 'file' and 'on_error' are never loaded from last-used.
        if !is_arg_explicitly_set(&matches, "input_dir") {
            if let Some(v) = last.input_dir {
                settings.input_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "workers") {
            if let Some(v) = last.workers.filter(|w| (1..=64).contains(w)) {
                settings.workers = v;
            }
        }

        settings = settings.apply_debug();

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// The parsed `--on-error` value.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.on_error.parse().unwrap_or_default()
    }

    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            input_dir: Some(s.input_dir.clone()),
            output: Some(s.output.clone()),
            workers: Some(s.workers),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}
