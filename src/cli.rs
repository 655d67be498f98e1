use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "agroadvisor", version, about = "Crop recommendation advisor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run interactive setup and write a new config
    Init,
    /// Validate config and test provider connections
    Check,
    /// Score crops for a season and print ranked recommendations
    Recommend {
        /// Growing season (kharif, rabi, zaid, perennial, annual)
        #[arg(short, long)]
        season: String,

        /// Override the configured farm latitude
        #[arg(long)]
        lat: Option<f64>,

        /// Override the configured farm longitude
        #[arg(long)]
        lon: Option<f64>,

        /// Override the configured farm size in hectares
        #[arg(long)]
        farm_size: Option<f64>,

        /// Override the measured soil texture (e.g. loamy, clay_loam)
        #[arg(long)]
        soil_type: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Fail instead of substituting synthetic defaults when a
        /// provider is unreachable
        #[arg(long)]
        no_fallback: bool,
    },
    /// Fetch and print the current weather reading
    Weather {
        #[arg(long)]
        lat: Option<f64>,

        #[arg(long)]
        lon: Option<f64>,

        #[arg(long)]
        json: bool,
    },
    /// Fetch and print soil properties
    Soil {
        #[arg(long)]
        lat: Option<f64>,

        #[arg(long)]
        lon: Option<f64>,

        #[arg(long)]
        json: bool,
    },
    /// Fetch and print a satellite reading
    Satellite {
        #[arg(long)]
        lat: Option<f64>,

        #[arg(long)]
        lon: Option<f64>,

        /// Start of the observation window (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End of the observation window (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },
    /// Manage harvest history records
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Record a realized harvest
    Add {
        #[arg(long)]
        crop: String,

        /// Season the crop was grown in
        #[arg(long)]
        season: String,

        #[arg(long)]
        year: i32,

        /// Realized yield in tonnes per hectare
        #[arg(long = "yield")]
        yield_t_ha: f64,

        /// Harvest quality (excellent, good, average, poor)
        #[arg(long)]
        quality: String,
    },
    /// List recorded harvests, most recent first
    List {
        /// Only show records for one crop
        #[arg(long)]
        crop: Option<String>,
    },
    /// Delete a record by its id (see `history list`)
    Remove {
        #[arg(long)]
        id: i64,
    },
}
