use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// The current routing decision shared by every worker.
///
/// Maps to `AtomicU8` values:
/// - 0 = Unavailable (neither processor should receive traffic)
/// - 1 = Default
/// - 2 = Fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Route {
    Unavailable = 0,
    Default = 1,
    Fallback = 2,
}

impl From<u8> for Route {
    fn from(value: u8) -> Self {
        match value {
            1 => Route::Default,
            2 => Route::Fallback,
            _ => Route::Unavailable,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Route::Unavailable => "unavailable",
            Route::Default => "default",
            Route::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Lock-free cell holding the current [`Route`].
///
/// The health monitor publishes a fresh decision every tick; workers may only
/// force [`Route::Fallback`] after a same-attempt fallback succeeded. Both
/// writes land in this single cell, so there is never a second copy of the
/// routing state to disagree with.
#[derive(Debug)]
pub struct RouteState {
    route: AtomicU8,
}

impl RouteState {
    pub fn new(initial: Route) -> Self {
        Self {
            route: AtomicU8::new(initial as u8),
        }
    }

    pub fn load(&self) -> Route {
        Route::from(self.route.load(Ordering::Acquire))
    }

    /// Publishes a decision and returns the route it replaced.
    pub fn publish(&self, route: Route) -> Route {
        Route::from(self.route.swap(route as u8, Ordering::AcqRel))
    }

    /// Worker override after Default failed and Fallback accepted.
    pub fn force_fallback(&self) -> Route {
        self.publish(Route::Fallback)
    }
}

impl Default for RouteState {
    fn default() -> Self {
        Self::new(Route::Unavailable)
    }
}
