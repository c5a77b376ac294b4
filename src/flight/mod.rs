//! Flight-simulation data provider
//!
//! Thin client for a LittleNavmap-style HTTP API. Any transport or decode
//! failure is logged and collapses to `None`; the dispatch core treats
//! missing flight data as a recoverable condition, never an error.

pub mod poller;

use std::time::Duration;

use mini_moka::sync::Cache;
use serde::Deserialize;

/// Sim-info cache lifetime; repeated `flightstatus` requests within this
/// window reuse the last response
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Fixed apology when flight data is unavailable
pub const FLIGHT_DATA_APOLOGY: &str =
    "I am unable to retrieve flight data at this time. Patience, minion.";

/// Current simulator state
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimInfo {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub simconnect_status: String,
    #[serde(default)]
    pub indicated_altitude: f64,
    /// Native units (converted to km/h for display)
    #[serde(default)]
    pub ground_speed: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub wind_direction: f64,
    /// Metres per second
    #[serde(default)]
    pub wind_speed: f64,
}

/// Geographic position
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

/// Airport lookup result
#[derive(Debug, Clone, Deserialize)]
pub struct AirportInfo {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default)]
    pub elevation: f64,
}

fn unknown() -> String {
    "Unknown".to_string()
}

/// LittleNavmap API client
pub struct NavmapClient {
    client: reqwest::Client,
    base_url: String,
    sim_cache: Cache<&'static str, SimInfo>,
}

impl NavmapClient {
    /// Create a client for the given API base URL
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let sim_cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(CACHE_TTL)
            .build();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            sim_cache,
        }
    }

    /// Fetch current simulator info, served from the TTL cache when fresh
    pub async fn sim_info(&self) -> Option<SimInfo> {
        if let Some(cached) = self.sim_cache.get(&"sim_info") {
            return Some(cached);
        }
        let info: SimInfo = self.get_json("/sim/info").await?;
        self.sim_cache.insert("sim_info", info.clone());
        Some(info)
    }

    /// Look up an airport by ICAO ident
    pub async fn airport_info(&self, ident: &str) -> Option<AirportInfo> {
        let endpoint = format!("/airport/info?ident={}", urlencoding::encode(ident));
        self.get_json(&endpoint).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Option<T> {
        let url = format!("{}{endpoint}", self.base_url);
        tracing::debug!(%url, "fetching flight data");

        let response = match self
            .client
            .get(&url)
            .header("User-Agent", "OverlordGateway/1.0")
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, %url, "flight data request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::error!(status = %response.status(), %url, "flight data request rejected");
            return None;
        }

        match response.json().await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(error = %e, %url, "flight data response was not valid JSON");
                None
            }
        }
    }
}

/// Render the one-line flight status sentence
#[must_use]
pub fn format_flight_status(info: &SimInfo) -> String {
    format!(
        "Current flight status: Altitude: {} feet, Ground Speed: {} km/h, Heading: {}°, \
         Position: {}, {}. Wind: {}° at {} km/h. Comply.",
        fmt_rounded(info.indicated_altitude, 2),
        fmt_rounded(info.ground_speed * 3600.0, 2),
        fmt_rounded(info.heading, 1),
        fmt_rounded(info.position.lat, 4),
        fmt_rounded(info.position.lon, 4),
        fmt_rounded(info.wind_direction, 1),
        fmt_rounded(info.wind_speed * 3.6, 1),
    )
}

/// Render the airport lookup reply
#[must_use]
pub fn format_airport_info(ident: &str, info: Option<&AirportInfo>) -> String {
    info.map_or_else(
        || format!("No information available for airport {ident}. Obey."),
        |info| {
            format!(
                "Airport {ident}: {}, Elevation: {} feet. Obey.",
                info.name,
                fmt_rounded(info.elevation, 1)
            )
        },
    )
}

/// Round to `dp` decimals and render without trailing zeros, always keeping
/// at least one decimal place (`36000.00` renders as `36000.0`)
fn fmt_rounded(value: f64, dp: usize) -> String {
    let fixed = format!("{value:.dp$}");
    if !fixed.contains('.') {
        return fixed;
    }
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> SimInfo {
        SimInfo {
            active: true,
            simconnect_status: "Connected".to_string(),
            indicated_altitude: 12500.456,
            ground_speed: 10.0,
            heading: 274.46,
            position: Position {
                lat: 47.123_456,
                lon: -122.987_654,
            },
            wind_direction: 180.04,
            wind_speed: 10.0,
        }
    }

    #[test]
    fn ground_speed_converts_per_hour() {
        let status = format_flight_status(&sample_info());
        assert!(
            status.contains("Ground Speed: 36000.0 km/h"),
            "status was: {status}"
        );
    }

    #[test]
    fn wind_speed_converts_to_kmh() {
        let status = format_flight_status(&sample_info());
        assert!(status.contains("at 36.0 km/h"), "status was: {status}");
    }

    #[test]
    fn status_rounds_each_field() {
        let status = format_flight_status(&sample_info());
        assert!(status.contains("Altitude: 12500.46 feet"), "{status}");
        assert!(status.contains("Heading: 274.5°"), "{status}");
        assert!(status.contains("Position: 47.1235, -122.9877."), "{status}");
        assert!(status.contains("Wind: 180.0°"), "{status}");
        assert!(status.ends_with("Comply."), "{status}");
    }

    #[test]
    fn airport_formats_found_and_missing() {
        let info = AirportInfo {
            name: "Seattle-Tacoma Intl".to_string(),
            elevation: 433.0,
        };
        assert_eq!(
            format_airport_info("KSEA", Some(&info)),
            "Airport KSEA: Seattle-Tacoma Intl, Elevation: 433.0 feet. Obey."
        );
        assert_eq!(
            format_airport_info("ZZZZ", None),
            "No information available for airport ZZZZ. Obey."
        );
    }

    #[test]
    fn rounding_keeps_one_decimal() {
        assert_eq!(fmt_rounded(36000.0, 2), "36000.0");
        assert_eq!(fmt_rounded(100.25, 2), "100.25");
        assert_eq!(fmt_rounded(47.1, 4), "47.1");
        assert_eq!(fmt_rounded(36.0, 1), "36.0");
    }
}
