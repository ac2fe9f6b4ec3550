use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use buildbench::config::{BenchConfig, ResolvedConfig};
use buildbench::display::{self, Measurement};
use buildbench::runner::TrialRunner;
use buildbench::types::CleanupPolicy;

#[derive(Parser)]
#[command(
    name = "buildbench",
    version,
    about = "Time repeated build commands and compare competing build tools"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Config file (default: nearest buildbench.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timed trials per target
    #[arg(short, long)]
    runs: Option<usize>,

    /// Directory removed before and after every trial (relative to the
    /// current directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// What to do when the output directory cannot be removed
    #[arg(long)]
    cleanup: Option<CleanupPolicy>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Suppress progress lines
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print a starter buildbench.toml
    Init,
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("BUILDBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Init) = cli.command {
        print!("{}", BenchConfig::default_toml());
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    let ResolvedConfig {
        mut config,
        base_dir,
    } = BenchConfig::resolve(cli.config.as_deref(), &cwd)?;

    // Config output_dir is relative to the config file, --output-dir to the cwd.
    let mut output_base = base_dir.clone();
    if let Some(runs) = cli.runs {
        config.runs = runs;
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
        output_base = cwd.clone();
    }
    if let Some(policy) = cli.cleanup {
        config.cleanup = policy;
    }
    config.validate()?;

    let show_progress = !cli.json && !cli.quiet;
    let runner = TrialRunner::new(output_base.join(&config.output_dir), &config.acceleration_env)
        .working_dir(&base_dir)
        .cleanup_policy(config.cleanup);
    tracing::debug!("working directory: {}", base_dir.display());
    tracing::debug!("output directory: {}", runner.output_dir().display());

    if show_progress {
        let title = config
            .targets
            .iter()
            .map(|t| t.label.as_str())
            .collect::<Vec<_>>()
            .join(" vs ");
        print!("{}", display::format_banner(&format!("{} Performance Benchmark", title)));
    }

    let mut measurements = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        if show_progress {
            println!("{}", display::format_measuring(&target.label));
        }
        tracing::debug!("measuring {} ({})", target.label, target.command);

        let result = runner.measure_with_progress(target, config.runs, |i, n| {
            if show_progress {
                println!("{}", display::format_trial_progress(i, n));
            }
        })?;
        measurements.push(Measurement::new(target.clone(), result));
    }

    let output = if cli.json {
        let mut json = display::format_json(&measurements, config.runs, Utc::now());
        json.push('\n');
        json
    } else {
        display::format_report(&measurements, config.runs)
    };
    print!("{}", output);

    Ok(())
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("Benchmark failed: {:#}", err);
        process::exit(1);
    }
}
