mod geo;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use parking_engine::{quote_areas, AreaQuote, CalculateOptions, ParkingArea, ParkingDataset};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::geo::{closest_distance_km, Coordinate};

/// Parking cost quotes for nearby parking areas.
#[derive(Parser)]
#[command(name = "parking-cost", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Price a stay at every matching parking area, cheapest first
    Quote(QuoteArgs),
    /// Load a dataset and report whether every policy is valid
    Validate {
        /// Parking dataset (JSON)
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(clap::Args)]
struct QuoteArgs {
    /// Parking dataset (JSON)
    #[arg(short, long)]
    data: PathBuf,

    /// Arrival, local time (e.g. 2025-06-02T10:00)
    #[arg(short, long, value_parser = parse_datetime)]
    arrival: NaiveDateTime,

    /// Departure, local time (e.g. 2025-06-02T14:00)
    #[arg(short = 'p', long, value_parser = parse_datetime)]
    departure: NaiveDateTime,

    /// Only quote this area (id or name)
    #[arg(long)]
    area: Option<String>,

    /// Search point as LAT,LON; areas outside --radius-km are skipped
    #[arg(long)]
    near: Option<Coordinate>,

    /// Search radius around --near, in kilometres
    #[arg(long, default_value_t = 1.0)]
    radius_km: f64,

    /// Decimal places costs are rounded to
    #[arg(long, default_value_t = 2)]
    decimals: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Table,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Quote(args) => quote(args),
        Command::Validate { data } => {
            let dataset = load_dataset(&data)?;
            println!(
                "{}: {} parking areas, all policies valid",
                data.display(),
                dataset.parking_areas.len()
            );
            Ok(())
        }
    }
}

fn quote(args: QuoteArgs) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let candidates = select_candidates(&dataset, &args)?;
    debug!(candidates = candidates.len(), "selected parking areas");

    let options = CalculateOptions {
        cost_decimals: args.decimals,
    };
    let mut quotes = quote_areas(candidates, args.arrival, args.departure, &options)?;
    quotes.sort_by(|a, b| {
        a.cost
            .total_cost
            .cmp(&b.cost.total_cost)
            .then(a.distance_km.total_cmp(&b.distance_km))
    });

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&quotes)?),
        Format::Table => print_table(&quotes),
    }
    Ok(())
}

fn load_dataset(path: &PathBuf) -> Result<ParkingDataset> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    ParkingDataset::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot load parking data from {}", path.display()))
}

/// Areas to quote with their distance from the search point (0 without one).
fn select_candidates<'a>(
    dataset: &'a ParkingDataset,
    args: &QuoteArgs,
) -> Result<Vec<(&'a ParkingArea, f64)>> {
    let areas: Vec<&ParkingArea> = match &args.area {
        Some(key) => match dataset.find(key) {
            Some(area) => vec![area],
            None => bail!("no parking area named '{key}'"),
        },
        None => dataset.parking_areas.iter().collect(),
    };

    let Some(point) = args.near else {
        return Ok(areas.into_iter().map(|area| (area, 0.0)).collect());
    };

    Ok(areas
        .into_iter()
        .filter_map(|area| match closest_distance_km(point, &area.geometry) {
            Some(distance) => Some((area, distance)),
            None => {
                warn!(area = %area.id, "geometry has no points, skipping");
                None
            }
        })
        .filter(|(_, distance)| *distance <= args.radius_km)
        .collect())
}

fn print_table(quotes: &[AreaQuote]) {
    println!("{:<24} {:>10} {:>8} {:>8}", "AREA", "COST", "CURRENCY", "KM");
    for quote in quotes {
        println!(
            "{:<24} {:>10} {:>8} {:>8.2}",
            quote.name, quote.cost.total_cost, quote.cost.currency, quote.distance_km
        );
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s.trim(), format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM, got '{s}'"))
}
