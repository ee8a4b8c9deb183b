//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use micrometrics::config::Overrides;
use std::path::PathBuf;

/// MicroMetrics - periodic aggregator and sensor runner
///
/// Runs the aggregators and sensors declared in a .micrometrics.toml file
/// on a fixed interval. Aggregators only run once the cooldown since the
/// previous pass has elapsed; sensors run on every tick.
///
/// Examples:
///   micrometrics --init-config
///   micrometrics --config ./metrics.toml
///   micrometrics --interval 10 --threshold 1 --cycles 6 --format json
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .micrometrics.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "MICROMETRICS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cooldown between aggregator passes, in minutes
    #[arg(short, long, value_name = "MINUTES", allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// Seconds between ticks
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Stop after this many ticks
    #[arg(long, value_name = "COUNT")]
    pub cycles: Option<u64>,

    /// Output format for cycle reports (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a starter .micrometrics.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for cycle reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    #[default]
    Text,
    /// One JSON object per tick
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.interval == Some(0) {
            return Err("Interval must be at least 1 second".to_string());
        }

        if let Some(ref path) = self.config {
            if !path.is_file() {
                return Err(format!("Config file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Settings that take precedence over the configuration file.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            threshold_minutes: self.threshold,
            interval_seconds: self.interval,
            max_cycles: self.cycles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            threshold: None,
            interval: None,
            cycles: None,
            format: OutputFormat::Text,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_interval() {
        let mut args = make_args();
        args.interval = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_config() {
        let mut args = make_args();
        args.config = Some(PathBuf::from("/definitely/not/here.toml"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "micrometrics",
            "--threshold",
            "-1",
            "--interval",
            "10",
            "--cycles",
            "2",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.threshold, Some(-1));
        assert_eq!(args.format, OutputFormat::Json);

        let overrides = args.overrides();
        assert_eq!(overrides.interval_seconds, Some(10));
        assert_eq!(overrides.max_cycles, Some(2));
    }
}
