#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payment_router::application::dispatcher::Dispatcher;
use payment_router::domain::health::ServiceHealth;
use payment_router::domain::payment::{Amount, LedgerRow, Payment, Processor};
use payment_router::domain::ports::{
    HealthProbe, Ledger, LedgerRows, Outcome, Upstream, WorkQueue,
};
use payment_router::domain::route::{Route, RouteState};
use payment_router::error::{Result, RouterError};
use payment_router::infrastructure::in_memory::{ChannelQueue, InMemoryLedger};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn payment(id: &str, amount: Decimal) -> Payment {
    Payment::new(id, Amount::new(amount).unwrap()).unwrap()
}

pub fn row(id: &str, amount: Decimal, processed_by: Processor, requested_at: DateTime<Utc>) -> LedgerRow {
    LedgerRow {
        correlation_id: id.to_string(),
        amount: Amount::new(amount).unwrap(),
        requested_at,
        processed_by,
    }
}

/// Polls `check` until it holds or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Upstream replaying a script of outcomes, then a fixed outcome forever.
pub struct ScriptedUpstream {
    processor: Processor,
    script: Mutex<VecDeque<Outcome>>,
    otherwise: Outcome,
    calls: AtomicUsize,
    seen: Mutex<Vec<Payment>>,
}

impl ScriptedUpstream {
    pub fn always(processor: Processor, outcome: Outcome) -> Arc<Self> {
        Self::scripted(processor, vec![], outcome)
    }

    pub fn scripted(processor: Processor, script: Vec<Outcome>, otherwise: Outcome) -> Arc<Self> {
        Arc::new(Self {
            processor,
            script: Mutex::new(script.into()),
            otherwise,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payments as they were sent, including their delivery stamp.
    pub fn seen(&self) -> Vec<Payment> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    fn processor(&self) -> Processor {
        self.processor
    }

    async fn send(&self, payment: &mut Payment) -> Outcome {
        payment.stamp(Utc::now());
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(payment.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.otherwise)
    }
}

/// Health probe whose answer can be changed between ticks.
pub struct ScriptedProbe {
    processor: Processor,
    health: Mutex<Option<ServiceHealth>>,
    calls: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new(processor: Processor, health: Option<ServiceHealth>) -> Arc<Self> {
        Arc::new(Self {
            processor,
            health: Mutex::new(health),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn healthy(processor: Processor, min_response_time: u64) -> Arc<Self> {
        Self::new(
            processor,
            Some(ServiceHealth {
                failing: false,
                min_response_time,
            }),
        )
    }

    pub fn failing(processor: Processor) -> Arc<Self> {
        Self::new(
            processor,
            Some(ServiceHealth {
                failing: true,
                min_response_time: 0,
            }),
        )
    }

    /// A probe that always errors, like a 429 from the health endpoint.
    pub fn inconclusive(processor: Processor) -> Arc<Self> {
        Self::new(processor, None)
    }

    pub fn set(&self, health: Option<ServiceHealth>) {
        *self.health.lock().unwrap() = health;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for ScriptedProbe {
    fn processor(&self) -> Processor {
        self.processor
    }

    async fn probe(&self) -> Result<ServiceHealth> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let health = *self.health.lock().unwrap();
        health.ok_or_else(|| RouterError::ProbeInconclusive("429 Too Many Requests".to_string()))
    }
}

/// Probe that never answers.
pub struct HangingProbe;

#[async_trait]
impl HealthProbe for HangingProbe {
    fn processor(&self) -> Processor {
        Processor::Default
    }

    async fn probe(&self) -> Result<ServiceHealth> {
        std::future::pending().await
    }
}

/// In-memory ledger that fails the next `n` inserts with `StoreUnavailable`.
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: InMemoryLedger,
    failures: AtomicUsize,
}

impl FlakyLedger {
    pub fn fail_next(&self, n: usize) {
        self.failures.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Ledger for FlakyLedger {
    async fn insert(&self, row: LedgerRow) -> Result<()> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(RouterError::store(std::io::Error::other("connection reset")));
        }
        self.inner.insert(row).await
    }

    async fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<LedgerRows> {
        self.inner.query(from, to).await
    }
}

/// Work queue wrapper counting how often payments are taken off the queue.
pub struct CountingQueue {
    inner: ChannelQueue,
    dequeued: AtomicUsize,
}

impl CountingQueue {
    pub fn new(inner: ChannelQueue) -> Self {
        Self {
            inner,
            dequeued: AtomicUsize::new(0),
        }
    }

    pub fn dequeued(&self) -> usize {
        self.dequeued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkQueue for CountingQueue {
    async fn enqueue(&self, payment: Payment) -> Result<()> {
        self.inner.enqueue(payment).await
    }

    async fn requeue(&self, payment: Payment) -> Result<()> {
        self.inner.requeue(payment).await
    }

    async fn dequeue(&self) -> Option<Payment> {
        let payment = self.inner.dequeue().await;
        if payment.is_some() {
            self.dequeued.fetch_add(1, Ordering::SeqCst);
        }
        payment
    }
}

/// Dispatcher wiring around scripted upstreams and in-memory collaborators.
pub struct Harness {
    pub default: Arc<ScriptedUpstream>,
    pub fallback: Arc<ScriptedUpstream>,
    pub route: Arc<RouteState>,
    pub queue: Arc<ChannelQueue>,
    pub ledger: Arc<FlakyLedger>,
}

impl Harness {
    pub fn new(default: Arc<ScriptedUpstream>, fallback: Arc<ScriptedUpstream>, route: Route) -> Self {
        Self {
            default,
            fallback,
            route: Arc::new(RouteState::new(route)),
            queue: Arc::new(ChannelQueue::new(64, 8).unwrap()),
            ledger: Arc::new(FlakyLedger::default()),
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(
            self.default.clone(),
            self.fallback.clone(),
            self.route.clone(),
            self.queue.clone(),
            self.ledger.clone(),
        )
    }
}
