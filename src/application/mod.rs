//! Application layer orchestrating the routing core.
//!
//! The `HealthMonitor` keeps the shared `RouteState` current, the
//! `WorkerPool` drains the work queue through the `Dispatcher`, the
//! `PaymentService` feeds the queue and the `SummaryAggregator` answers totals
//! queries over the ledger.

pub mod dispatcher;
pub mod health_monitor;
pub mod ingest;
pub mod summary;
