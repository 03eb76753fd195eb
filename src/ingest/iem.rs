/// IEM (Iowa Environmental Mesonet) Data API Client
///
/// Retrieves barometric pressure from ASOS (Automated Surface Observing
/// System) stations via the Iowa State University Mesonet API. This is the
/// live sample source for the storm alarm, and the recent-observations
/// endpoint is used to seed history at start-up.
///
/// API Documentation: https://mesonet.agron.iastate.edu/request/download.phtml
/// Current conditions: https://mesonet.agron.iastate.edu/json/current.py

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::model::PressureSample;

const IEM_BASE_URL: &str = "https://mesonet.agron.iastate.edu";

/// hPa per inch of mercury.
const HPA_PER_INHG: f64 = 33.8639;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum IngestError {
    /// Request failed before a response arrived.
    Http(reqwest::Error),
    /// Non-2xx response from IEM.
    Status(u16),
    /// The response body could not be decoded.
    ParseError(String),
    /// IEM returned no observation for the station.
    NoObservation(String),
    /// The observation carried neither sea-level pressure nor altimeter.
    NoPressure(String),
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Http(e) => write!(f, "HTTP request failed: {}", e),
            IngestError::Status(code) => write!(f, "IEM API error: HTTP {}", code),
            IngestError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            IngestError::NoObservation(station) => write!(f, "No data returned for station {}", station),
            IngestError::NoPressure(station) => write!(f, "No pressure reported by station {}", station),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Http(err)
    }
}

// ============================================================================
// IEM API Response Structures
// ============================================================================

/// Current observation response from IEM
#[derive(Debug, Deserialize)]
pub struct IemCurrentResponse {
    pub data: Vec<IemObservation>,
}

/// Single weather observation; only the pressure fields are read.
#[derive(Debug, Deserialize)]
pub struct IemObservation {
    pub station: String,
    pub valid: String,  // ISO 8601 timestamp
    pub alti: Option<f64>,  // Altimeter setting (inches Hg)
    #[serde(rename = "mslp")]
    pub sea_level_pressure_mb: Option<f64>,
}

impl IemObservation {
    /// Sea-level pressure in hPa, falling back to the altimeter setting.
    pub fn pressure_hpa(&self) -> Option<f64> {
        self.sea_level_pressure_mb
            .or_else(|| self.alti.map(|inhg| inhg * HPA_PER_INHG))
    }
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetch the current pressure for a station
///
/// # Parameters
/// - `client`: HTTP client
/// - `station_id`: ASOS station ID (e.g., "KPIA")
pub fn fetch_current_pressure(
    client: &reqwest::blocking::Client,
    station_id: &str,
) -> Result<PressureSample, IngestError> {

    let url = format!(
        "{}/json/current.py?station={}",
        IEM_BASE_URL,
        station_id
    );

    let response = client
        .get(&url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(IngestError::Status(response.status().as_u16()));
    }

    let body = response.text()?;
    parse_current_response(&body, station_id)
}

/// Fetch recent pressure observations (last N hours), oldest first
///
/// Used to seed history so the first 3-hour comparison is available
/// immediately after start-up.
pub fn fetch_recent_pressure(
    client: &reqwest::blocking::Client,
    station_id: &str,
    hours: i64,
) -> Result<Vec<PressureSample>, IngestError> {

    let end = Utc::now();
    let begin = end - chrono::Duration::hours(hours);

    let url = format!(
        "{}/cgi-bin/request/asos.py?station={}&data=mslp&data=alti&year1={}&month1={}&day1={}&hour1={}&year2={}&month2={}&day2={}&hour2={}&tz=UTC&format=onlycomma&latlon=no&elev=no&missing=null&trace=null&direct=no",
        IEM_BASE_URL,
        station_id,
        begin.format("%Y"),
        begin.format("%m"),
        begin.format("%d"),
        begin.format("%H"),
        end.format("%Y"),
        end.format("%m"),
        end.format("%d"),
        end.format("%H")
    );

    let response = client
        .get(&url)
        .send()?;

    if !response.status().is_success() {
        return Err(IngestError::Status(response.status().as_u16()));
    }

    let text = response.text()?;
    parse_asos_csv(&text)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a current-conditions JSON body into a pressure sample
pub fn parse_current_response(body: &str, station_id: &str) -> Result<PressureSample, IngestError> {
    let api_response: IemCurrentResponse = serde_json::from_str(body)
        .map_err(|e| IngestError::ParseError(e.to_string()))?;

    let obs = api_response.data.into_iter()
        .next()
        .ok_or_else(|| IngestError::NoObservation(station_id.to_string()))?;

    let timestamp = DateTime::parse_from_rfc3339(&obs.valid)
        .map_err(|e| IngestError::ParseError(format!("bad timestamp '{}': {}", obs.valid, e)))?
        .with_timezone(&Utc);

    let value_hpa = obs.pressure_hpa()
        .ok_or_else(|| IngestError::NoPressure(obs.station.clone()))?;

    Ok(PressureSample::new(value_hpa, timestamp))
}

/// Parse IEM ASOS CSV into pressure samples
///
/// Columns are located by header name. Rows without any pressure are
/// skipped; a bad timestamp fails the whole parse.
pub fn parse_asos_csv(csv: &str) -> Result<Vec<PressureSample>, IngestError> {
    let mut lines = csv.lines();
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| IngestError::ParseError("empty CSV response".to_string()))?
        .split(',')
        .map(str::trim)
        .collect();

    let column = |name: &str| header.iter().position(|h| *h == name);
    let valid_idx = column("valid")
        .ok_or_else(|| IngestError::ParseError("missing 'valid' column".to_string()))?;
    let mslp_idx = column("mslp");
    let alti_idx = column("alti");

    // Helper to parse values that might be "null"
    let parse_field = |fields: &[&str], idx: Option<usize>| -> Option<f64> {
        let s = fields.get(idx?)?.trim();
        if s == "null" || s.is_empty() {
            None
        } else {
            s.parse().ok()
        }
    };

    let mut samples = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();

        // Parse timestamp (format: "2026-02-21 19:54")
        let timestamp_str = fields
            .get(valid_idx)
            .ok_or_else(|| IngestError::ParseError(format!("short row: '{}'", line)))?
            .trim();
        let timestamp = NaiveDateTime::parse_from_str(timestamp_str, "%Y-%m-%d %H:%M")
            .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
            .map_err(|e| IngestError::ParseError(format!("bad timestamp '{}': {}", timestamp_str, e)))?;

        let pressure = parse_field(&fields, mslp_idx)
            .or_else(|| parse_field(&fields, alti_idx).map(|inhg| inhg * HPA_PER_INHG));

        if let Some(value_hpa) = pressure {
            samples.push(PressureSample::new(value_hpa, timestamp));
        }
    }

    Ok(samples)
}

// ============================================================================
// Tests
// ============================================================================
