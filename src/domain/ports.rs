use super::health::ServiceHealth;
use super::payment::{LedgerRow, Payment, Processor};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::sync::Arc;

/// Lazy sequence of ledger rows. Order is unspecified.
pub type LedgerRows = BoxStream<'static, Result<LedgerRow>>;

/// Append-only store of committed payments.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fails with `DuplicateKey` if the correlation id is already committed,
    /// `StoreUnavailable` on I/O errors.
    async fn insert(&self, row: LedgerRow) -> Result<()>;

    /// Rows whose `requested_at` lies in the closed interval `[from, to]`.
    async fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<LedgerRows>;
}

/// Bounded buffer between ingestion and the worker pool.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Admits a new payment, failing with `QueueFull` rather than waiting.
    async fn enqueue(&self, payment: Payment) -> Result<()>;

    /// Puts a payment back for another attempt, waiting for a free slot.
    async fn requeue(&self, payment: Payment) -> Result<()>;

    /// Waits for the next payment. `None` once the queue is closed and drained.
    async fn dequeue(&self) -> Option<Payment>;
}

/// Classified result of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The processor took ownership of the payment.
    Accepted,
    /// The processor refused the payment for good (HTTP 422).
    Rejected,
    /// Network error, timeout or any other status. Safe to retry.
    TransientFailure,
}

/// A payment processor that accepts payment submissions.
#[async_trait]
pub trait Upstream: Send + Sync {
    fn processor(&self) -> Processor;

    /// Stamps `requested_at` and submits the payment.
    async fn send(&self, payment: &mut Payment) -> Outcome;
}

/// Health endpoint of a payment processor.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn processor(&self) -> Processor;

    async fn probe(&self) -> Result<ServiceHealth>;
}

pub type LedgerRef = Arc<dyn Ledger>;
pub type WorkQueueRef = Arc<dyn WorkQueue>;
pub type UpstreamRef = Arc<dyn Upstream>;
pub type HealthProbeRef = Arc<dyn HealthProbe>;
