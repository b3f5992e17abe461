use crate::domain::health::{ServiceHealth, decide_route};
use crate::domain::ports::HealthProbeRef;
use crate::domain::route::{Route, RouteState};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_LATENCY_THRESHOLD: Duration = Duration::from_millis(100);

/// Background task keeping [`RouteState`] in line with processor health.
///
/// Each tick probes both processors concurrently, derives a route with
/// [`decide_route`] and publishes it. Probe failures never escape a tick: they
/// count as "failing" and the monitor carries on polling.
pub struct HealthMonitor {
    default: HealthProbeRef,
    fallback: HealthProbeRef,
    route: Arc<RouteState>,
    interval: Duration,
    latency_threshold: Duration,
}

impl HealthMonitor {
    pub fn new(default: HealthProbeRef, fallback: HealthProbeRef, route: Arc<RouteState>) -> Self {
        Self {
            default,
            fallback,
            route,
            interval: DEFAULT_HEALTH_INTERVAL,
            latency_threshold: DEFAULT_LATENCY_THRESHOLD,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_latency_threshold(mut self, threshold: Duration) -> Self {
        self.latency_threshold = threshold;
        self
    }

    /// Runs a single polling round and returns the published route.
    pub async fn tick(&self) -> Route {
        let (default, fallback) = tokio::join!(
            self.probe(&self.default),
            self.probe(&self.fallback)
        );

        let route = decide_route(default, fallback, self.latency_threshold);
        let previous = self.route.publish(route);
        if previous != route {
            info!(
                from = %previous,
                to = %route,
                default = ?default,
                fallback = ?fallback,
                "route changed"
            );
        }
        route
    }

    async fn probe(&self, probe: &HealthProbeRef) -> Option<ServiceHealth> {
        // Bounded by the interval so a hung probe cannot delay the next round.
        match time::timeout(self.interval, probe.probe()).await {
            Ok(Ok(health)) => Some(health),
            Ok(Err(e)) => {
                debug!(processor = %probe.processor(), "health probe inconclusive: {}", e);
                None
            }
            Err(_) => {
                debug!(processor = %probe.processor(), "health probe timed out");
                None
            }
        }
    }

    /// Polls forever. The first round starts immediately.
    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
