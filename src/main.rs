use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use fitsynth::config::AppConfig;
use fitsynth::export::{self, ExportFormat, FitActivityExporter};
use fitsynth::fit::{self, Endianness};
use fitsynth::import::ImportManager;
use fitsynth::logging::{self, LogConfig};
use fitsynth::models::ActivityType;
use fitsynth::track::TrackBuilder;

/// fitsynth - synthetic activity generator
///
/// Turns a route (GPX or CSV waypoints) into a FIT activity file with a
/// believable speed profile: waves of faster and slower stretches, a gentle
/// start and a slow finish.
#[derive(Parser)]
#[command(name = "fitsynth")]
#[command(version)]
#[command(about = "Synthesize FIT activity files from routes", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a FIT activity from a route
    Generate {
        /// Route file (GPX or CSV)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output FIT file; defaults to the route name with a .fit extension
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Seed for a reproducible track
        #[arg(long)]
        seed: Option<u64>,

        /// Desired average speed in km/h
        #[arg(short, long, value_name = "KMH")]
        speed: Option<f64>,

        /// Activity type (run, ride)
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        activity_type: Option<ActivityType>,

        /// Start time (RFC 3339); now when absent
        #[arg(long, value_name = "TIME")]
        start: Option<DateTime<Utc>>,

        /// Byte order of the FIT file (little, big)
        #[arg(short, long)]
        endianness: Option<Endianness>,

        /// Leave developer fields out of the FIT file
        #[arg(long)]
        no_developer_fields: bool,

        /// Also write the synthesized records (.json or .csv)
        #[arg(long, value_name = "FILE")]
        dump_records: Option<PathBuf>,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long, conflicts_with = "show")]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },

    /// Print the CRC-16 of a file and check FIT header and body CRCs
    Checksum {
        /// File to check
        file: PathBuf,
    },
}

struct GenerateOptions {
    input: PathBuf,
    output: Option<PathBuf>,
    seed: Option<u64>,
    speed: Option<f64>,
    activity_type: Option<ActivityType>,
    start: Option<DateTime<Utc>>,
    endianness: Option<Endianness>,
    no_developer_fields: bool,
    dump_records: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    let log_config = LogConfig {
        level: config.logging.level.raised_by(cli.verbose),
        ..config.logging.clone()
    };
    logging::init_logging(&log_config).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Generate {
            input,
            output,
            seed,
            speed,
            activity_type,
            start,
            endianness,
            no_developer_fields,
            dump_records,
        } => generate(
            config,
            GenerateOptions {
                input,
                output,
                seed,
                speed,
                activity_type,
                start,
                endianness,
                no_developer_fields,
                dump_records,
            },
        ),
        Commands::Config { init, force, show } => manage_config(&config, &config_path, init, force, show),
        Commands::Checksum { file } => checksum(&file),
    }
}

fn generate(mut config: AppConfig, options: GenerateOptions) -> Result<()> {
    let activity = &mut config.activity;
    if let Some(seed) = options.seed {
        activity.seed = Some(seed);
    }
    if let Some(speed) = options.speed {
        activity.desired_speed = speed;
    }
    if let Some(activity_type) = options.activity_type {
        activity.activity_type = activity_type;
    }
    if let Some(start) = options.start {
        activity.start = Some(start);
    }
    if let Some(endianness) = options.endianness {
        config.output.endianness = endianness;
    }
    if options.no_developer_fields {
        config.output.skip_developer_fields = true;
    }

    config.device.validate().context("Invalid device profile")?;
    let settings = config
        .activity
        .resolve(Utc::now())
        .context("Invalid activity settings")?;

    println!("{}", "Generating activity...".green().bold());
    println!("  Route: {}", options.input.display());

    let waypoints = ImportManager::new()
        .import_file(&options.input)
        .with_context(|| format!("Failed to import route: {}", options.input.display()))?;

    let mut builder = TrackBuilder::new(&settings);
    builder
        .add_waypoints(&waypoints)
        .context("Failed to build track")?;
    builder.finalize().context("Failed to finalize track")?;

    let metadata = config.activity.metadata(settings.start);
    let exporter = FitActivityExporter::new(config.device.clone())
        .with_endianness(config.output.endianness)
        .with_developer_fields(!config.output.skip_developer_fields);

    let output = options
        .output
        .or_else(|| config.output.path.clone())
        .unwrap_or_else(|| options.input.with_extension("fit"));
    let bytes = exporter
        .export_file(&metadata, builder.records(), &output)
        .with_context(|| format!("Failed to write FIT file: {}", output.display()))?;

    if let Some(dump_path) = &options.dump_records {
        let format = ExportFormat::from_path(dump_path)?;
        export::export_records(builder.records(), format, dump_path)
            .with_context(|| format!("Failed to dump records: {}", dump_path.display()))?;
        println!("  Records dump: {}", dump_path.display());
    }

    let duration = builder.total_duration();
    println!("  Activity: {} ({})", metadata.name, metadata.activity_type);
    println!("  Waypoints: {}", waypoints.len());
    println!("  Records: {}", builder.records().len());
    println!("  Distance: {:.2} km", builder.total_distance());
    println!(
        "  Duration: {:02}:{:02}:{:02}",
        duration.num_hours(),
        duration.num_minutes() % 60,
        duration.num_seconds() % 60
    );
    println!(
        "{}",
        format!("✓ Wrote {} bytes to {}", bytes, output.display()).green()
    );
    Ok(())
}

fn manage_config(config: &AppConfig, path: &Path, init: bool, force: bool, show: bool) -> Result<()> {
    if init {
        if path.exists() && !force {
            anyhow::bail!(
                "Config file already exists: {} (use --force to overwrite)",
                path.display()
            );
        }
        AppConfig::default().save_to_file(path)?;
        println!(
            "{}",
            format!("✓ Wrote default configuration to {}", path.display()).green()
        );
        return Ok(());
    }

    if show {
        let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
        println!("{}", format!("# {}", path.display()).dimmed());
        println!("{}", content);
        return Ok(());
    }

    println!("Config file: {}", path.display());
    match config.validate() {
        Ok(()) => println!("{}", "✓ Configuration is valid".green()),
        Err(e) => println!("{}", format!("✗ {}", e).red()),
    }
    Ok(())
}

fn checksum(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    println!("{}: {}", path.display(), format!("{:04X}", fit::checksum(&bytes)).bold());

    if let Some(integrity) = fit::verify(&bytes) {
        let status = |valid: bool| if valid { "ok".green() } else { "MISMATCH".red() };
        println!("  Data size: {} bytes", integrity.data_size);
        println!(
            "  Header CRC: {:04X} {}",
            integrity.header_crc,
            status(integrity.header_crc_valid)
        );
        println!(
            "  Body CRC: {:04X} {}",
            integrity.body_crc,
            status(integrity.body_crc_valid)
        );
        if !integrity.is_valid() {
            anyhow::bail!("FIT integrity check failed for {}", path.display());
        }
    }
    Ok(())
}
