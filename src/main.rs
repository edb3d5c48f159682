use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taxi_service::entities::driver::{self, NewDriver};
use taxi_service::logging::{init_logging, Verbosity};
use taxi_service::{counts, import_fixtures, load_csv, Config, Database};

/// Administrative commands for the taxi fleet database.
#[derive(Debug, Parser)]
#[command(name = "taxi", version)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(short, long, global = true, default_value = taxi_service::config::CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Override the database path from the configuration.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database and schema.
    Init,
    /// Load manufacturers and cars from a CSV (Manufacturer,Country,Model).
    Import {
        /// CSV file to import.
        csv: PathBuf,
    },
    /// Register a driver who can log in.
    CreateDriver {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        license: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Print entity counts.
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(Verbosity::from_occurrences(cli.quiet, cli.verbose));

    let mut config = Config::load_from(&cli.config).context("loading configuration")?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }

    let db = Database::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path.display()))?;

    match cli.command {
        Command::Init => {
            println!("✓ Database ready at {}", config.database.path.display());
        }
        Command::Import { csv } => run_import(&db, &csv)?,
        Command::CreateDriver {
            username,
            password,
            license,
            first_name,
            last_name,
        } => {
            let input = NewDriver::new(username, password, license, first_name, last_name);
            let created = db.write(|tx| driver::create(tx, &input))?;
            println!(
                "✓ Driver #{} created: {} ({})",
                created.id, created.username, created.license_number
            );
        }
        Command::Stats => {
            let totals = db.read(counts)?;
            println!("Manufacturers: {}", totals.manufacturer_count);
            println!("Cars:          {}", totals.car_count);
            println!("Drivers:       {}", totals.driver_count);
        }
    }

    Ok(())
}

fn run_import(db: &Database, csv_path: &std::path::Path) -> Result<()> {
    println!("📂 Loading {}...", csv_path.display());
    let rows = load_csv(csv_path).with_context(|| format!("reading {}", csv_path.display()))?;
    println!("✓ Loaded {} rows", rows.len());

    let summary = db.write(|tx| import_fixtures(tx, &rows))?;
    println!("✓ Manufacturers created: {}", summary.manufacturers_created);
    println!("✓ Cars created: {}", summary.cars_created);

    let totals = db.read(counts)?;
    println!(
        "✓ Database now holds {} manufacturers, {} cars",
        totals.manufacturer_count, totals.car_count
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_flag_is_global() {
        let cli = Cli::try_parse_from(["taxi", "stats", "--quiet"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(
            Verbosity::from_occurrences(cli.quiet, cli.verbose),
            Verbosity::Quiet
        );

        let cli = Cli::try_parse_from(["taxi", "-vv", "init"]).unwrap();
        assert!(!cli.quiet);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
