use std::env;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration as StdDuration;

use chrono::Duration;

use baro_storm_service::alert::stalenesses;
use baro_storm_service::config::{database_url_from_env, Config};
use baro_storm_service::history::database::PostgresHistory;
use baro_storm_service::history::memory::InMemoryHistory;
use baro_storm_service::history::HistoryProvider;
use baro_storm_service::ingest::iem;
use baro_storm_service::logging::{self, Source};
use baro_storm_service::monitor::EvaluationOrchestrator;
use baro_storm_service::publish::{DeltaPublisher, JsonLinesPublisher};

const DEFAULT_CONFIG_PATH: &str = "baro_storm.toml";
const HTTP_TIMEOUT_SECS: u64 = 30;

type Orchestrator = EvaluationOrchestrator<Box<dyn HistoryProvider>, Box<dyn DeltaPublisher>>;

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        return Ok(Config::load(&path)?);
    }
    eprintln!("{} not found, using defaults", path);
    Ok(Config { database_url: database_url_from_env(), ..Config::default() })
}

fn open_history(config: &Config) -> Result<Box<dyn HistoryProvider>, Box<dyn std::error::Error>> {
    let monitor = &config.monitor;
    let tolerance = Duration::minutes(monitor.history_tolerance_minutes);

    match &config.database_url {
        Some(url) => {
            let mut history = PostgresHistory::connect(url, &monitor.station_id)?.with_tolerance(tolerance);
            match history.data_range()? {
                Some((start, end)) => logging::info(
                    Source::History,
                    Some(&monitor.station_id),
                    &format!("Database history {} to {}", start.to_rfc3339(), end.to_rfc3339()),
                ),
                None => logging::info(Source::History, Some(&monitor.station_id), "Database history is empty"),
            }
            Ok(Box::new(history))
        }
        None => {
            logging::info(Source::History, Some(&monitor.station_id), "DATABASE_URL not set, keeping history in memory");
            let retention = Duration::hours(monitor.lookback_hours * 2);
            Ok(Box::new(InMemoryHistory::new(tolerance, retention)))
        }
    }
}

fn open_publisher(config: &Config) -> Result<Box<dyn DeltaPublisher>, Box<dyn std::error::Error>> {
    match &config.output.delta_file {
        Some(path) => Ok(Box::new(JsonLinesPublisher::append_to(path)?)),
        None => Ok(Box::new(JsonLinesPublisher::stdout())),
    }
}

/// Loads the last few hours from IEM so the first comparison doesn't wait
/// a full lookback window.
fn seed_history(client: &reqwest::blocking::Client, orchestrator: &Orchestrator, config: &Config) {
    let station = &config.monitor.station_id;
    let hours = config.monitor.lookback_hours + 1;

    match iem::fetch_recent_pressure(client, station, hours) {
        Ok(samples) => {
            let mut stored = 0;
            for sample in &samples {
                match orchestrator.record_history(sample) {
                    Ok(()) => stored += 1,
                    Err(e) => logging::debug(Source::History, Some(station), &format!("Seed sample skipped: {}", e)),
                }
            }
            logging::info(
                Source::History,
                Some(station),
                &format!("Seeded history with {}/{} observations", stored, samples.len()),
            );
        }
        Err(e) => logging::log_iem_failure(station, "History seed", &e),
    }
}

fn poll_once(client: &reqwest::blocking::Client, orchestrator: &Orchestrator, config: &Config) {
    let station = &config.monitor.station_id;

    let sample = match iem::fetch_current_pressure(client, station) {
        Ok(sample) => sample,
        Err(e) => {
            logging::log_iem_failure(station, "Current pressure fetch", &e);
            return;
        }
    };

    if stalenesses::is_stale(&sample, config.monitor.max_sample_age_minutes) {
        logging::warn(
            Source::Iem,
            Some(station),
            &format!("Observation from {} is stale, skipping", sample.timestamp.to_rfc3339()),
        );
        return;
    }

    if let Err(e) = orchestrator.evaluate(&sample) {
        logging::log_evaluation_failure(station, &e);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_logger(
        config.log_level()?,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    if !config.monitor.enabled {
        logging::info(Source::System, None, "Storm alarm disabled in configuration, exiting");
        return Ok(());
    }

    let station = config.monitor.station_id.clone();
    logging::info(
        Source::System,
        Some(&station),
        &format!(
            "Starting barometric storm alarm: refresh every {} min, {} h lookback",
            config.monitor.refresh_minutes, config.monitor.lookback_hours
        ),
    );

    let client = reqwest::blocking::Client::builder()
        .timeout(StdDuration::from_secs(HTTP_TIMEOUT_SECS))
        .build()?;

    let orchestrator = EvaluationOrchestrator::new(&station, open_history(&config)?, open_publisher(&config)?)
        .with_lookback(Duration::hours(config.monitor.lookback_hours));

    if config.monitor.seed_history {
        seed_history(&client, &orchestrator, &config);
    }

    let period = StdDuration::from_secs(config.monitor.refresh_minutes * 60);
    loop {
        poll_once(&client, &orchestrator, &config);
        sleep(period);
    }
}
