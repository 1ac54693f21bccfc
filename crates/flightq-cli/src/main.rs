// SPDX-License-Identifier: MIT
// Copyright (c) 2020 Austin Goudge
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use chrono::Weekday;
use clap::{Parser, Subcommand};
use flightq_core::{
    ConfigManager, DatasetLoader, EngineConfig, QueryEngine, QueryResult, TimeBucket, TripType,
};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Flight listing to load (.json or .csv)
    #[arg(short, long, env = "FLIGHTQ_DATA")]
    data: PathBuf,

    /// Engine config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the listing and print matching flights
    Query {
        /// Departure city or province (substring)
        #[arg(long, default_value = "")]
        from: String,
        /// Destination city or province (substring)
        #[arg(long, default_value = "")]
        to: String,
        /// one-way or round-trip
        #[arg(long, default_value = "one-way")]
        trip: TripType,
        /// all, morning, afternoon, evening or night
        #[arg(long, default_value = "all")]
        time: TimeBucket,
        /// Only flights carrying the configured availability marker
        #[arg(long)]
        available: bool,
        /// Only flights operating on this weekday (mon..sun)
        #[arg(long)]
        day: Option<Weekday>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the listing and report counts
    Check,
    /// Print the effective engine config
    Config,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // A logger may already be installed when embedded; that is not fatal.
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn load_config(path: Option<&PathBuf>) -> Result<(ConfigManager, EngineConfig)> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    let config = manager.load()?;
    log::info!("Using engine config {}", manager.path().display());
    Ok((manager, config))
}

fn print_result(result: &QueryResult) {
    println!("Filters: {}", result.stats.summary);

    if result.stats.no_results() {
        println!("没有找到符合条件的航班 (0 of {})", result.stats.total_count);
        return;
    }

    for row in result.rows.iter() {
        let r = &row.record;
        println!(
            "{} {:<8} {:<10} {}({}) -> {}({}) {}-{} [{}] {} {}",
            row.leg.label(),
            r.flight_number,
            r.airline,
            r.departure_city,
            r.departure_province,
            r.destination_city,
            r.destination_province,
            r.departure_time,
            r.arrival_time,
            r.operating_days,
            r.product_type,
            r.marker().unwrap_or("-"),
        );
    }
    println!(
        "{} of {} flights",
        result.stats.filtered_count, result.stats.total_count
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (manager, config) = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Config => {
            println!("# {}", manager.path().display());
            println!("{}", to_pretty_json(&config)?);
        }
        Commands::Check => {
            let records = DatasetLoader::load_file(&cli.data)
                .with_context(|| format!("Failed to read {:?}", cli.data))?;
            let engine = QueryEngine::with_records(config, records)
                .with_context(|| format!("Invalid flight listing {:?}", cli.data))?;
            let stale = engine
                .dataset()
                .stale_night_flags(engine.config().night_includes_evening);
            println!("{} flights OK", engine.all().len());
            if !stale.is_empty() {
                println!("{} records carry a stale is_night flag", stale.len());
            }
        }
        Commands::Query {
            from,
            to,
            trip,
            time,
            available,
            day,
            json,
        } => {
            let records = DatasetLoader::load_file(&cli.data)
                .with_context(|| format!("Failed to read {:?}", cli.data))?;
            let mut engine = QueryEngine::with_records(config, records)
                .with_context(|| format!("Invalid flight listing {:?}", cli.data))?;

            engine.set_city_search(&from, &to)?;
            engine.set_trip_type(trip);
            engine.set_time_bucket(time);
            engine.set_availability_only(available);
            engine.set_operating_day(day);

            let result = engine.apply()?;
            if json {
                println!("{}", to_pretty_json(&result)?);
            } else {
                print_result(&result);
            }
        }
    }

    Ok(())
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}
