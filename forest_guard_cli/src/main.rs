use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forest_guard::config::Settings;
use forest_guard::core_modules::utils::image_helper::image_helper;
use forest_guard::estimator::{ChangeEstimator, Resampling, TargetSize};
use forest_guard::monitor::imagery::REGIONS;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "forest-guard")]
#[command(version, about = "Forest change estimation and threat scoring", long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults to ./forest_guard.toml when present
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the changed share between a before and an after image
    Change {
        /// Earlier image of the area
        #[arg(value_name = "BEFORE")]
        before: PathBuf,

        /// Later image of the same area
        #[arg(value_name = "AFTER")]
        after: PathBuf,

        /// Write the highlighted after image (PNG) here
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Per-pixel sensitivity (0-255); overrides the settings file
        #[arg(short, long, value_name = "N")]
        threshold: Option<u8>,

        /// Comparison resolution, e.g. 600x600; overrides the settings file
        #[arg(long, value_name = "WxH")]
        size: Option<TargetSize>,

        /// Resampling filter (nearest or bilinear); overrides the settings file
        #[arg(long, value_name = "FILTER")]
        resampling: Option<Resampling>,

        /// Treat an intrusion as active when scoring the result
        #[arg(long)]
        intrusion: bool,
    },

    /// Combine a change percentage with an intrusion flag into a threat score
    Threat {
        /// Changed share of the frame, in percent
        #[arg(long, value_name = "PERCENT")]
        change_percent: f64,

        /// An intrusion was detected
        #[arg(long)]
        intrusion: bool,
    },

    /// List the built-in monitored regions
    Regions,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> Result<()> {
    // --- 1. Argument Parsing & Setup ---
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;

    match cli.command {
        Commands::Change {
            before,
            after,
            out,
            threshold,
            size,
            resampling,
            intrusion,
        } => {
            // --- 2. Estimator Initialization ---
            let mut config = settings.estimator;
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(size) = size {
                config.target_size = size;
            }
            if let Some(resampling) = resampling {
                config.resampling = resampling;
            }
            let estimator = ChangeEstimator::new(config).context("Invalid estimator settings")?;

            // --- 3. Estimation ---
            let report = estimator.estimate_paths(&before, &after).with_context(|| {
                format!(
                    "Failed to compare {} with {}",
                    before.display(),
                    after.display()
                )
            })?;

            // --- 4. Output ---
            if let Some(out) = out {
                image_helper::save_png(&out, &report.highlighted)
                    .with_context(|| format!("Failed to save {}", out.display()))?;
                info!("Highlighted image saved to {}", out.display());
            }
            println!("Forest loss: {:.2}%", report.change_percent);
            println!(
                "Changed pixels: {} of {} (threshold {})",
                report.changed_pixels, report.total_pixels, report.threshold
            );

            // --- 5. Threat Scoring ---
            let assessment = settings.threat.assess(report.change_percent, intrusion);
            println!("Threat score: {:.2}%", assessment.score);
            if assessment.alert {
                warn!("High deforestation detected!");
            }
        }
        Commands::Threat {
            change_percent,
            intrusion,
        } => {
            let assessment = settings.threat.assess(change_percent, intrusion);
            println!("Threat score: {:.2}%", assessment.score);
            if assessment.alert {
                println!(
                    "ALERT: score reaches the alert threshold of {:.2}",
                    settings.threat.alert_threshold
                );
            } else {
                println!("Area secure");
            }
        }
        Commands::Regions => {
            for region in &REGIONS {
                println!("{:<30} {}", region.name, region.bbox);
            }
        }
    }

    Ok(())
}
