use super::route::Route;
use serde::Deserialize;
use std::time::Duration;

/// Health report returned by a processor's `/payments/service-health` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub failing: bool,
    /// Minimum observed response time, in milliseconds.
    pub min_response_time: u64,
}

impl ServiceHealth {
    pub fn min_response_time(&self) -> Duration {
        Duration::from_millis(self.min_response_time)
    }
}

/// Derives the routing decision from the latest pair of probe results.
///
/// `None` means the probe was inconclusive (network error, timeout, 429, bad
/// body) and is read as "failing" for this tick.
pub fn decide_route(
    default: Option<ServiceHealth>,
    fallback: Option<ServiceHealth>,
    latency_threshold: Duration,
) -> Route {
    if default.is_none() && fallback.is_none() {
        return Route::Unavailable;
    }

    match default {
        Some(health) if !health.failing => {
            if health.min_response_time() > latency_threshold {
                Route::Fallback
            } else {
                Route::Default
            }
        }
        _ => {
            if fallback.is_none_or(|h| h.failing) {
                Route::Unavailable
            } else {
                Route::Fallback
            }
        }
    }
}
