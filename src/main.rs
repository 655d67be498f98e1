mod cli;
mod config;
mod datasources;
mod db;
mod error;
mod logic;
mod models;

use clap::Parser;
use cli::{Cli, Commands, HistoryCommands};
use config::Config;
use db::Database;
use error::{AdvisorError, Result};
use logic::EnvironmentalDataService;
use models::{
    Coordinate, EnvironmentalSnapshot, HistoricalRecord, QualityGrade, Season, SoilTexture,
};
use tracing_subscriber::EnvFilter;

// The engine sees the records from this many most-recent season/year pairs.
const HISTORY_WINDOW_SEASONS: usize = 5;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -v flags pick the level
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => cmd_init(&cli),
        Commands::Check => cmd_check(&cli).await,
        Commands::Recommend {
            ref season,
            lat,
            lon,
            farm_size,
            ref soil_type,
            json,
            no_fallback,
        } => {
            cmd_recommend(
                &cli,
                season,
                lat,
                lon,
                farm_size,
                soil_type.as_deref(),
                json,
                no_fallback,
            )
            .await
        }
        Commands::Weather { lat, lon, json } => cmd_weather(&cli, lat, lon, json).await,
        Commands::Soil { lat, lon, json } => cmd_soil(&cli, lat, lon, json).await,
        Commands::Satellite {
            lat,
            lon,
            start,
            end,
            json,
        } => cmd_satellite(&cli, lat, lon, start, end, json).await,
        Commands::History { ref command } => cmd_history(&cli, command),
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    Config::load(cli.config.clone())
}

fn open_database(cli: &Cli) -> Result<Database> {
    let db_path = Config::db_path(cli.data_dir.as_ref())?;
    Database::open(&db_path)
}

fn resolve_coordinate(config: &Config, lat: Option<f64>, lon: Option<f64>) -> Result<Coordinate> {
    Coordinate::new(
        lat.unwrap_or(config.farm.latitude),
        lon.unwrap_or(config.farm.longitude),
    )
}

fn cmd_init(cli: &Cli) -> Result<()> {
    if Config::exists(cli.config.as_ref()) {
        println!("Existing configuration found; answers will overwrite it.");
    }
    let (config, _path) = Config::setup_interactive()?;

    // Touch the database so migrations run up front
    let db = open_database(cli)?;
    println!("Database ready at {}", db.path().display());
    println!(
        "Farm '{}' at ({}, {}), {} ha",
        config.farm.name, config.farm.latitude, config.farm.longitude,
        config.farm.farm_size_hectares
    );
    Ok(())
}

async fn cmd_check(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli)?;
    let coordinate = resolve_coordinate(&config, None, None)?;

    println!("Config OK ({} providers configured)", {
        let mut n = 1; // SoilGrids needs no key
        if config.openweathermap.is_some() {
            n += 1;
        }
        if config.bhuvan.is_some() {
            n += 1;
        }
        n
    });
    println!("Database: {}", db.path().display());

    let service = EnvironmentalDataService::new(&config, db);
    let status = service.check_connections(coordinate).await;

    let label = |ok: bool| if ok { "OK" } else { "OFFLINE" };
    println!("OpenWeatherMap: {}", label(status.weather));
    println!("SoilGrids:      {}", label(status.soil));
    println!("Bhuvan:         {}", label(status.satellite));

    if !status.any_connected() {
        println!("No providers reachable; recommendations will use synthetic defaults.");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_recommend(
    cli: &Cli,
    season: &str,
    lat: Option<f64>,
    lon: Option<f64>,
    farm_size: Option<f64>,
    soil_type: Option<&str>,
    json: bool,
    no_fallback: bool,
) -> Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli)?;

    let season = Season::from_str(season)
        .ok_or_else(|| AdvisorError::InvalidInput(format!("Unknown season '{}'", season)))?;
    let coordinate = resolve_coordinate(&config, lat, lon)?;
    let farm_size_ha = farm_size.unwrap_or(config.farm.farm_size_hectares);

    // CLI flag wins over the configured soil type override
    let texture_override = match soil_type.or(config.farm.soil_type.as_deref()) {
        Some(s) => Some(SoilTexture::from_str(s).ok_or_else(|| {
            AdvisorError::InvalidInput(format!("Unknown soil type '{}'", s))
        })?),
        None => None,
    };

    let service =
        EnvironmentalDataService::new(&config, db.clone()).with_fallback(!no_fallback);
    let mut snapshot = service.fetch_snapshot(coordinate, None).await?;
    if let Some(texture) = texture_override {
        snapshot.soil.texture = texture;
    }

    let history = recent_history(&db)?;
    let recommendations = logic::recommend_crops(&snapshot, season, farm_size_ha, &history)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
        return Ok(());
    }

    print_snapshot_summary(&snapshot);
    println!();

    if recommendations.is_empty() {
        println!("No crops in the knowledge base grow in the {} season.", season);
        return Ok(());
    }

    println!(
        "{:<10} {:<12} {:>5} {:>8} {:>12} {:<7}",
        "Crop", "Variety", "Score", "t/ha", "Profit (Rs)", "Risk"
    );
    for rec in &recommendations {
        println!(
            "{:<10} {:<12} {:>5} {:>8.2} {:>12} {:<7}",
            rec.crop,
            rec.variety,
            rec.suitability,
            rec.expected_yield_t_ha,
            rec.profitability,
            rec.risk_level
        );
    }

    if let Some(top) = recommendations.first() {
        println!();
        println!("{}:", top.crop);
        for reason in &top.reasons {
            println!("  + {}", reason);
        }
        for tip in &top.best_practices {
            println!("  * {}", tip);
        }
    }
    Ok(())
}

async fn cmd_weather(cli: &Cli, lat: Option<f64>, lon: Option<f64>, json: bool) -> Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli)?;
    let coordinate = resolve_coordinate(&config, lat, lon)?;

    let service = EnvironmentalDataService::new(&config, db);
    let weather = service.fetch_weather(coordinate).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&weather)?);
        return Ok(());
    }

    println!(
        "Weather at ({}, {}) [{}]",
        coordinate.latitude, coordinate.longitude, weather.origin
    );
    println!("  {:.1} C, {:.0}% humidity, wind {:.1} m/s", weather.temperature_c,
        weather.humidity_percent, weather.wind_speed_ms);
    println!("  {}", weather.description);
    for day in &weather.forecast {
        println!(
            "  {}  {:.0}-{:.0} C  {:.0}%  {:.1} mm  {}",
            day.date,
            day.temp_min_c,
            day.temp_max_c,
            day.humidity_percent,
            day.precipitation_mm,
            day.description
        );
    }
    Ok(())
}

async fn cmd_soil(cli: &Cli, lat: Option<f64>, lon: Option<f64>, json: bool) -> Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli)?;
    let coordinate = resolve_coordinate(&config, lat, lon)?;

    let service = EnvironmentalDataService::new(&config, db);
    let soil = service.fetch_soil(coordinate).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&soil)?);
        return Ok(());
    }

    println!(
        "Soil at ({}, {}) [{}]",
        coordinate.latitude, coordinate.longitude, soil.origin
    );
    println!("  pH {:.1}, organic matter {:.1}%", soil.ph, soil.organic_matter_percent);
    println!(
        "  N {:.2}%  P {:.0} ppm  K {:.0} ppm",
        soil.nitrogen_percent, soil.phosphorus_ppm, soil.potassium_ppm
    );
    println!(
        "  texture: {} (sand {:.0}%, clay {:.0}%)",
        soil.texture, soil.sand_percent, soil.clay_percent
    );
    Ok(())
}

async fn cmd_satellite(
    cli: &Cli,
    lat: Option<f64>,
    lon: Option<f64>,
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
    json: bool,
) -> Result<()> {
    let config = load_config(cli)?;
    let db = open_database(cli)?;
    let coordinate = resolve_coordinate(&config, lat, lon)?;

    let date_range = match (start, end) {
        (Some(s), Some(e)) if s > e => {
            return Err(AdvisorError::InvalidInput(
                "--start must not be after --end".into(),
            ))
        }
        (Some(s), Some(e)) => Some((s, e)),
        (None, None) => None,
        _ => {
            return Err(AdvisorError::InvalidInput(
                "--start and --end must be given together".into(),
            ))
        }
    };

    let service = EnvironmentalDataService::new(&config, db);
    let reading = service.fetch_satellite(coordinate, date_range).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
        return Ok(());
    }

    println!(
        "Satellite at ({}, {}) [{}]",
        coordinate.latitude, coordinate.longitude, reading.origin
    );
    println!("  NDVI {:.2}  EVI {:.2}", reading.ndvi, reading.evi);
    println!("  soil moisture {:.0}%", reading.soil_moisture_percent);
    if let Some(date) = reading.captured_on {
        println!("  captured {}", date);
    }
    Ok(())
}

fn cmd_history(cli: &Cli, command: &HistoryCommands) -> Result<()> {
    let db = open_database(cli)?;

    match command {
        HistoryCommands::Add {
            crop,
            season,
            year,
            yield_t_ha,
            quality,
        } => {
            let season = Season::from_str(season).ok_or_else(|| {
                AdvisorError::InvalidInput(format!("Unknown season '{}'", season))
            })?;
            let quality = QualityGrade::from_str(quality).ok_or_else(|| {
                AdvisorError::InvalidInput(format!("Unknown quality '{}'", quality))
            })?;
            if !yield_t_ha.is_finite() || *yield_t_ha < 0.0 {
                return Err(AdvisorError::InvalidInput(
                    "Yield must be a non-negative number".into(),
                ));
            }

            let record = HistoricalRecord::new(crop.clone(), season, *year, *yield_t_ha, quality);
            let id = db.insert_history_record(&record)?;
            println!(
                "Recorded {} ({} {}): {:.2} t/ha, {} [#{}]",
                record.crop, record.season, record.year, record.yield_t_ha, record.quality, id
            );
            Ok(())
        }
        HistoryCommands::List { crop } => {
            let records = match crop {
                Some(crop) => db.get_history_for_crop(crop)?,
                None => db.get_history(100)?,
            };

            if records.is_empty() {
                println!("No history recorded yet. Add one with `agroadvisor history add`.");
                return Ok(());
            }

            println!(
                "{:>5} {:<10} {:<10} {:>5} {:>8} {:<10}",
                "Id", "Crop", "Season", "Year", "t/ha", "Quality"
            );
            for record in &records {
                println!(
                    "{:>5} {:<10} {:<10} {:>5} {:>8.2} {:<10}",
                    record.id.unwrap_or_default(),
                    record.crop,
                    record.season,
                    record.year,
                    record.yield_t_ha,
                    record.quality
                );
            }
            Ok(())
        }
        HistoryCommands::Remove { id } => {
            db.delete_history_record(*id)?;
            println!("Removed record #{}", id);
            Ok(())
        }
    }
}

/// Records from the most recent distinct season/year pairs, newest first.
fn recent_history(db: &Database) -> Result<Vec<HistoricalRecord>> {
    let all = db.get_history(500)?;

    let mut windows: Vec<(i32, Season)> = Vec::new();
    let mut recent = Vec::new();
    for record in all {
        let window = (record.year, record.season);
        if !windows.contains(&window) {
            if windows.len() == HISTORY_WINDOW_SEASONS {
                break;
            }
            windows.push(window);
        }
        recent.push(record);
    }
    Ok(recent)
}

fn print_snapshot_summary(snapshot: &EnvironmentalSnapshot) {
    println!(
        "Conditions: {:.1} C, {:.0}% humidity [{}] | soil pH {:.1}, {}, OM {:.1}% [{}]",
        snapshot.weather.temperature_c,
        snapshot.weather.humidity_percent,
        snapshot.weather.origin,
        snapshot.soil.ph,
        snapshot.soil.texture,
        snapshot.soil.organic_matter_percent,
        snapshot.soil.origin
    );
    if let Some(ref sat) = snapshot.satellite {
        println!(
            "Satellite: NDVI {:.2}, moisture {:.0}% [{}]",
            sat.ndvi, sat.soil_moisture_percent, sat.origin
        );
    }
    if !snapshot.is_measured() {
        println!("Note: some readings are synthetic defaults, not measurements.");
    }
}
