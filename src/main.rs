//! MicroMetrics - periodic aggregator and sensor runner
//!
//! Loads aggregators and sensors from a TOML file and drives them from an
//! interval timer until interrupted or the configured tick count is reached.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid arguments, unreadable config, etc.)

mod cli;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use micrometrics::config::{Config, DEFAULT_CONFIG_FILE};
use micrometrics::report::CycleReport;
use micrometrics::schedule::run_schedule;
use micrometrics::{CollectingNotifier, SystemClock};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("MicroMetrics v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a starter .micrometrics.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", DEFAULT_CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with a sample aggregator and sensor.", DEFAULT_CONFIG_FILE);
    println!("   Edit it to declare your own tasks and cooldown.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load the configuration, build the runner and tick until done.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_overrides(&args.overrides());

    if config.aggregators.is_empty() && config.sensors.is_empty() {
        warn!("No aggregators or sensors configured; ticks will be empty");
    }

    let mut runner = config
        .build_runner(SystemClock, CollectingNotifier::new())
        .context("Invalid task configuration")?;

    info!(
        "Loaded {} aggregators and {} sensors (cooldown {} min, tick every {}s)",
        runner.aggregator_queue().len(),
        runner.sensor_queue().len(),
        runner.threshold_minutes(),
        config.schedule.interval_seconds
    );

    let format = args.format;
    let period = Duration::from_secs(config.schedule.interval_seconds);
    let max_cycles = config.schedule.max_cycles;

    tokio::select! {
        ran = run_schedule(&mut runner, period, max_cycles, |report| emit(report, format)) => {
            info!("Finished after {} cycles", ran);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping");
        }
    }

    Ok(())
}

/// Print one cycle report to stdout.
fn emit(report: &CycleReport, format: OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}\n", report.to_text()),
        OutputFormat::Json => match report.to_json() {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize cycle {}: {}", report.cycle, e),
        },
    }

    let alerts = report.alerts();
    if !alerts.is_empty() {
        warn!("Sensors out of bounds: {}", alerts.join(", "));
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
