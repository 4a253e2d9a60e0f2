// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fsp_core::config::AppConfig;
use fsp_core::deck::Deck;
use fsp_core::{batch, Carrier, FlightQuery, FlightReport, FlightStatusService};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the per-user config.json when present)
    #[arg(short, long, env = "FSP_CONFIG")]
    config: Option<PathBuf>,

    /// Airport reference CSV (iata_code, latitude, longitude)
    #[arg(long, env = "FSP_AIRPORTS")]
    airports: Option<PathBuf>,

    /// XGBoost JSON model; without it predictions are random
    #[arg(long, env = "FSP_MODEL")]
    model: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict whether a flight will be on time
    Predict {
        /// Carrier code, e.g. AA, DL, 9E
        carrier: String,
        /// Origin airport (IATA)
        origin: String,
        /// Destination airport (IATA)
        destination: String,
        /// Flight number; anything non-numeric counts as 0
        #[arg(short, long, default_value = "")]
        flight_number: String,
        /// Flight date, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Write the route map as deck.gl JSON
        #[arg(long)]
        deck: Option<PathBuf>,
    },
    /// Show the route geometry between two airports
    Route {
        origin: String,
        destination: String,
        /// Write the route map as deck.gl JSON
        #[arg(long)]
        deck: Option<PathBuf>,
    },
    /// List the model input columns and the categories they cover
    Schema,
    /// List supported carriers
    Carriers,
    /// Predict every row of a CSV (carrier, flight_number, origin, destination, date)
    Batch {
        input: PathBuf,
        /// Output CSV (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("fsp")
        .build();
    // A second init (e.g. in tests) is harmless
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Carriers = cli.command {
        for carrier in Carrier::ALL {
            println!("{:<3} {:?}", carrier.code(), carrier);
        }
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(path) = cli.airports {
        config.airports_path = path;
    }
    if let Some(path) = cli.model {
        config.model_path = Some(path);
    }

    let service = FlightStatusService::from_config(&config).with_context(|| {
        format!(
            "Failed to load airports from {:?} or the configured model",
            config.airports_path
        )
    })?;

    match cli.command {
        Commands::Predict {
            carrier,
            origin,
            destination,
            flight_number,
            date,
            json,
            deck,
        } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive().to_string());
            let query =
                FlightQuery::from_form(&carrier, &flight_number, &origin, &destination, &date)?;
            let report = service.predict(&query)?;

            if let (Some(path), Some(route)) = (deck.as_ref(), report.route.as_ref()) {
                write_deck(path, &Deck::for_route(route, service.map()))?;
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::Route {
            origin,
            destination,
            deck,
        } => match service.route(&origin, &destination) {
            Ok(route) => {
                let deck_doc = Deck::for_route(&route, service.map());
                match deck {
                    Some(path) => {
                        write_deck(&path, &deck_doc)?;
                        println!(
                            "{} -> {}: {:.0} nm, initial course {:03.0}°",
                            origin.to_uppercase(),
                            destination.to_uppercase(),
                            route.distance_nm,
                            route.initial_course_deg
                        );
                    }
                    None => println!("{}", deck_doc.to_json_pretty()?),
                }
            }
            Err(e) => {
                eprintln!("Warning: {}", e);
            }
        },
        Commands::Schema => {
            let encoder = service.encoder();
            println!(
                "{} columns (classifier: {})",
                encoder.schema().len(),
                service.classifier_name()
            );
            for (i, column) in encoder.schema().columns().iter().enumerate() {
                println!("{:>4}  {}", i, column);
            }
            let missing = encoder.missing_numeric_columns();
            if !missing.is_empty() {
                println!("not in schema: {}", missing.join(" "));
            }
            let categories = encoder.categories();
            println!("carriers: {}", join_or_none(&categories.carriers));
            println!("origins:  {}", join_or_none(&categories.origins));
            if encoder.naming().destination_prefix.is_some() {
                println!("destinations: {}", join_or_none(&categories.destinations));
            }
        }
        Commands::Batch { input, output } => {
            let file = File::open(&input)
                .with_context(|| format!("Failed to open batch input {:?}", input))?;
            let rows = batch::read_rows(BufReader::new(file))?;
            let results = batch::run(&service, &rows);
            let failed = results.iter().filter(|r| !r.error.is_empty()).count();

            match output {
                Some(path) => {
                    let out = File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    batch::write_results(out, &results)?;
                    println!(
                        "Wrote {} predictions to {:?} ({} failed)",
                        results.len(),
                        path,
                        failed
                    );
                }
                None => batch::write_results(io::stdout().lock(), &results)?,
            }
        }
        Commands::Carriers => {}
    }

    Ok(())
}

fn print_report(report: &FlightReport) {
    let q = &report.query;
    println!(
        "{}{} {} -> {} on {}",
        q.carrier, q.flight_number, q.origin, q.destination, q.date
    );

    match &report.route {
        Some(route) => println!(
            "Route: {:.0} nm, midpoint {:.4}, {:.4}",
            route.distance_nm, route.view.latitude, route.view.longitude
        ),
        None => {
            if let Some(warning) = &report.warning {
                println!("Warning: {}", warning);
            }
        }
    }

    for u in &report.unmatched {
        println!(
            "Note: {} '{}' is not a model input (no column '{}')",
            u.kind, u.value, u.column
        );
    }

    println!("---");
    println!("{}", report.status.headline);
    println!("{}", report.status.detail);
}

fn write_deck(path: &Path, deck: &Deck) -> Result<()> {
    let json = deck.to_json_pretty()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write deck to {:?}", path))?;
    log::info!("Deck written to {}", path.display());
    Ok(())
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(" ")
    }
}
