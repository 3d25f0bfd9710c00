use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use solarledger::{create_meter_reading, create_solar_reading, initialize_db};

/// A utility for creating a test database for the solarledger server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// How many monthly billing periods to generate.
    #[arg(long, default_value_t = 12)]
    months: u32,
}

/// Create and populate a database for manual testing.
///
/// Generates one meter reading per thirty days ending today, plus daily
/// solar production entries, so the report page has a full chart to show.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Generating {} billing periods...", args.months);

    let today = OffsetDateTime::now_utc().date();
    let first_end_date = today - Duration::days(30 * i64::from(args.months.saturating_sub(1)));

    let mut grid_consumption = 0.0;
    let mut grid_injection = 0.0;

    for month in 0..args.months {
        let end_date = first_end_date + Duration::days(30 * i64::from(month));

        // Vary the totals a little so the chart is not a flat line.
        grid_consumption += 180.0 + 25.0 * f64::from(month % 4);
        grid_injection += 60.0 + 15.0 * f64::from(month % 3);

        create_meter_reading(end_date, grid_consumption, grid_injection, &connection)?;
        seed_solar_production(end_date, &connection)?;
    }

    println!("Success!");

    Ok(())
}

/// Record daily production for the thirty days ending on `end_date`.
fn seed_solar_production(
    end_date: Date,
    connection: &Connection,
) -> Result<(), solarledger::Error> {
    for day in 0..30 {
        let date = end_date - Duration::days(day);
        let kwh = 8.0 + (day % 7) as f64;

        create_solar_reading(date, kwh, connection)?;
    }

    Ok(())
}
