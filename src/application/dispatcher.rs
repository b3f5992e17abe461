use crate::domain::payment::{Payment, Processor};
use crate::domain::ports::{LedgerRef, Outcome, UpstreamRef, WorkQueueRef};
use crate::domain::route::{Route, RouteState};
use crate::error::RouterError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// What became of a dequeued payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Accepted upstream and written to the ledger.
    Committed(Processor),
    /// Permanently rejected upstream. Never retried, never stored.
    Dropped,
    /// Accepted upstream, but the ledger already held this correlation id.
    Duplicate,
    /// Put back on the work queue for another attempt.
    Requeued,
    /// Put back untouched because no processor was available.
    Deferred,
    /// Retry ceiling reached; handed to the dead-letter path.
    DeadLettered,
    /// The work queue was closed while requeueing.
    Abandoned,
}

/// Pause taken by a worker after deferring a payment while no route exists.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Retry ceiling for payments that keep failing.
///
/// The default is unbounded: a payment is requeued for as long as it keeps
/// failing with a retryable error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// Routes a single payment according to the current [`RouteState`] and
/// decides whether it is committed, dropped or retried.
pub struct Dispatcher {
    default: UpstreamRef,
    fallback: UpstreamRef,
    route: Arc<RouteState>,
    queue: WorkQueueRef,
    ledger: LedgerRef,
    retry: RetryPolicy,
    dead_letter: Option<WorkQueueRef>,
}

impl Dispatcher {
    pub fn new(
        default: UpstreamRef,
        fallback: UpstreamRef,
        route: Arc<RouteState>,
        queue: WorkQueueRef,
        ledger: LedgerRef,
    ) -> Self {
        Self {
            default,
            fallback,
            route,
            queue,
            ledger,
            retry: RetryPolicy::unbounded(),
            dead_letter: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_dead_letter(mut self, dead_letter: WorkQueueRef) -> Self {
        self.dead_letter = Some(dead_letter);
        self
    }

    pub fn queue(&self) -> &WorkQueueRef {
        &self.queue
    }

    /// Processes one dequeued payment.
    ///
    /// While the route is [`Route::Unavailable`] the payment goes straight back
    /// on the queue without any outbound call. On the default route a
    /// transient failure is retried against the fallback in the same cycle,
    /// and a fallback success forces the shared route to fallback.
    pub async fn process(&self, mut payment: Payment) -> Disposition {
        let (outcome, processor) = match self.route.load() {
            Route::Unavailable => return self.defer(payment).await,
            Route::Default => self.send_with_fallback(&mut payment).await,
            Route::Fallback => (
                self.fallback.send(&mut payment).await,
                self.fallback.processor(),
            ),
        };

        match outcome {
            Outcome::Accepted => self.commit(payment, processor).await,
            Outcome::Rejected => {
                debug!(
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    "payment rejected, dropping"
                );
                Disposition::Dropped
            }
            Outcome::TransientFailure => self.retry_later(payment).await,
        }
    }

    async fn send_with_fallback(&self, payment: &mut Payment) -> (Outcome, Processor) {
        match self.default.send(payment).await {
            Outcome::TransientFailure => {
                let outcome = self.fallback.send(payment).await;
                if outcome == Outcome::Accepted {
                    let previous = self.route.force_fallback();
                    if previous != Route::Fallback {
                        info!(
                            from = %previous,
                            correlation_id = %payment.correlation_id,
                            "default failed and fallback accepted, forcing fallback route"
                        );
                    }
                }
                (outcome, self.fallback.processor())
            }
            outcome => (outcome, self.default.processor()),
        }
    }

    async fn commit(&self, mut payment: Payment, processor: Processor) -> Disposition {
        let row = match payment.commit(processor) {
            Ok(row) => row,
            Err(e) => {
                error!(correlation_id = %payment.correlation_id, "cannot commit payment: {}", e);
                return self.retry_later(payment).await;
            }
        };

        match self.ledger.insert(row).await {
            Ok(()) => Disposition::Committed(processor),
            Err(RouterError::DuplicateKey(correlation_id)) => {
                warn!(%correlation_id, processor = %processor, "payment already committed");
                Disposition::Duplicate
            }
            Err(e) => {
                // The processor already owns this payment; the retry resubmits it.
                warn!(
                    correlation_id = %payment.correlation_id,
                    processor = %processor,
                    "ledger insert failed after acceptance, requeueing: {}",
                    e
                );
                self.retry_later(payment).await
            }
        }
    }

    /// Requeues without counting an attempt.
    async fn defer(&self, mut payment: Payment) -> Disposition {
        payment.prepare_retry();
        match self.queue.requeue(payment).await {
            Ok(()) => Disposition::Deferred,
            Err(e) => {
                error!("payment abandoned: {}", e);
                Disposition::Abandoned
            }
        }
    }

    async fn retry_later(&self, mut payment: Payment) -> Disposition {
        payment.prepare_retry();
        let attempts = payment.record_failed_attempt();
        if self.retry.is_exhausted(attempts) {
            return self.dead_letter(payment).await;
        }

        match self.queue.requeue(payment).await {
            Ok(()) => Disposition::Requeued,
            Err(e) => {
                error!("payment abandoned: {}", e);
                Disposition::Abandoned
            }
        }
    }

    async fn dead_letter(&self, payment: Payment) -> Disposition {
        let correlation_id = payment.correlation_id.clone();
        let attempts = payment.attempts;
        match &self.dead_letter {
            Some(queue) => {
                if let Err(e) = queue.enqueue(payment).await {
                    error!(%correlation_id, attempts, "dead-letter queue refused payment: {}", e);
                } else {
                    warn!(%correlation_id, attempts, "payment moved to dead-letter queue");
                }
            }
            None => {
                error!(%correlation_id, attempts, "retry ceiling reached, discarding payment");
            }
        }
        Disposition::DeadLettered
    }
}

/// Fixed-size pool of workers draining the work queue.
pub struct WorkerPool {
    dispatcher: Arc<Dispatcher>,
    workers: usize,
    idle_backoff: Duration,
}

impl WorkerPool {
    pub fn new(dispatcher: Dispatcher, workers: usize) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            workers,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
        }
    }

    pub fn with_idle_backoff(mut self, backoff: Duration) -> Self {
        self.idle_backoff = backoff;
        self
    }

    /// Spawns every worker. Workers exit once the queue is closed and drained.
    pub fn spawn(self) -> JoinSet<()> {
        let mut set = JoinSet::new();
        for worker in 0..self.workers {
            let dispatcher = self.dispatcher.clone();
            let idle_backoff = self.idle_backoff;
            set.spawn(async move {
                let queue = dispatcher.queue().clone();
                while let Some(payment) = queue.dequeue().await {
                    match dispatcher.process(payment).await {
                        Disposition::Deferred => tokio::time::sleep(idle_backoff).await,
                        Disposition::Requeued => tokio::task::yield_now().await,
                        _ => {}
                    }
                }
                debug!(worker, "work queue closed, worker stopping");
            });
        }
        info!(workers = self.workers, "worker pool started");
        set
    }
}
