//! Periodic flight-info poller
//!
//! Polls the simulator on a fixed interval and logs only significant
//! changes so steady cruise does not flood the log.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::{NavmapClient, Position};

/// Altitude delta (feet) considered significant
const ALTITUDE_THRESHOLD: f64 = 1000.0;

/// Position delta (degrees, either axis) considered significant
const POSITION_THRESHOLD: f64 = 0.1;

/// Run the poller until the shutdown signal fires
pub async fn run(
    client: Arc<NavmapClient>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    let mut last_altitude: Option<f64> = None;
    let mut last_position: Option<Position> = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    tracing::debug!("flight poller stopping");
                    return;
                }
            }
        }

        let Some(info) = client.sim_info().await else {
            tracing::warn!("unable to retrieve sim info");
            continue;
        };

        if significant_altitude_change(last_altitude, info.indicated_altitude) {
            tracing::info!(
                altitude = info.indicated_altitude,
                "significant altitude change"
            );
            last_altitude = Some(info.indicated_altitude);
        }

        if significant_position_change(last_position, info.position) {
            tracing::info!(
                lat = info.position.lat,
                lon = info.position.lon,
                "significant position change"
            );
            last_position = Some(info.position);
        }

        tracing::debug!(?info, "periodic sim info");
    }
}

/// True when no baseline exists or altitude moved beyond the threshold
#[must_use]
pub fn significant_altitude_change(last: Option<f64>, current: f64) -> bool {
    last.is_none_or(|prev| (current - prev).abs() > ALTITUDE_THRESHOLD)
}

/// True when no baseline exists or either axis moved beyond the threshold
#[must_use]
pub fn significant_position_change(last: Option<Position>, current: Position) -> bool {
    last.is_none_or(|prev| {
        (current.lat - prev.lat).abs() > POSITION_THRESHOLD
            || (current.lon - prev.lon).abs() > POSITION_THRESHOLD
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_significant() {
        assert!(significant_altitude_change(None, 5000.0));
        assert!(significant_position_change(
            None,
            Position { lat: 0.0, lon: 0.0 }
        ));
    }

    #[test]
    fn small_altitude_delta_is_quiet() {
        assert!(!significant_altitude_change(Some(5000.0), 5999.0));
        assert!(significant_altitude_change(Some(5000.0), 6001.0));
        assert!(significant_altitude_change(Some(5000.0), 3999.0));
    }

    #[test]
    fn position_delta_checks_both_axes() {
        let base = Position {
            lat: 47.0,
            lon: -122.0,
        };
        assert!(!significant_position_change(
            Some(base),
            Position {
                lat: 47.05,
                lon: -122.05
            }
        ));
        assert!(significant_position_change(
            Some(base),
            Position {
                lat: 47.2,
                lon: -122.0
            }
        ));
        assert!(significant_position_change(
            Some(base),
            Position {
                lat: 47.0,
                lon: -122.2
            }
        ));
    }
}
