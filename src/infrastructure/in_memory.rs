use crate::domain::payment::{LedgerRow, Payment};
use crate::domain::ports::{Ledger, LedgerRows, WorkQueue};
use crate::error::{Result, RouterError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, RwLock, mpsc};

/// A thread-safe in-memory ledger of committed payments.
///
/// Uses `Arc<RwLock<HashMap<String, LedgerRow>>>` keyed by correlation id, so
/// the uniqueness check and the insert happen under one write lock.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    rows: Arc<RwLock<HashMap<String, LedgerRow>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, correlation_id: &str) -> Option<LedgerRow> {
        self.rows.read().await.get(correlation_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn insert(&self, row: LedgerRow) -> Result<()> {
        let mut rows = self.rows.write().await;
        match rows.entry(row.correlation_id.clone()) {
            Entry::Occupied(_) => Err(RouterError::DuplicateKey(row.correlation_id)),
            Entry::Vacant(slot) => {
                slot.insert(row);
                Ok(())
            }
        }
    }

    async fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<LedgerRows> {
        let rows = self.rows.read().await;
        let window: Vec<LedgerRow> = rows
            .values()
            .filter(|row| row.requested_at >= from && row.requested_at <= to)
            .cloned()
            .collect();

        Ok(futures::stream::iter(window.into_iter().map(Ok)).boxed())
    }
}

/// Bounded work queue backed by a tokio mpsc channel.
///
/// Every worker shares the receiver, so each payment is delivered to exactly
/// one of them. Ingestion never waits: it is refused once admitting another
/// payment would leave fewer than `headroom` free slots. Sizing `headroom` to
/// the worker count guarantees every worker a slot for the one payment it may
/// have to put back, so requeues can always make progress.
pub struct ChannelQueue {
    sender: mpsc::Sender<Payment>,
    receiver: Mutex<mpsc::Receiver<Payment>>,
    headroom: usize,
}

impl ChannelQueue {
    /// # Arguments
    ///
    /// * `capacity` - Total number of slots in the queue.
    /// * `headroom` - Slots reserved for requeues, usually the worker count.
    pub fn new(capacity: usize, headroom: usize) -> Result<Self> {
        if capacity == 0 || headroom >= capacity {
            return Err(RouterError::Validation(format!(
                "queue capacity ({capacity}) must be greater than its headroom ({headroom})"
            )));
        }

        let (sender, receiver) = mpsc::channel(capacity);
        Ok(Self {
            sender,
            receiver: Mutex::new(receiver),
            headroom,
        })
    }

    /// Number of occupied slots, including slots reserved by in-flight sends.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl WorkQueue for ChannelQueue {
    async fn enqueue(&self, payment: Payment) -> Result<()> {
        let permit = self.sender.try_reserve().map_err(|e| match e {
            TrySendError::Full(()) => RouterError::QueueFull,
            TrySendError::Closed(()) => RouterError::QueueClosed,
        })?;

        // The permit already holds a slot, so this check cannot be raced below the headroom.
        if self.sender.capacity() < self.headroom {
            return Err(RouterError::QueueFull);
        }

        permit.send(payment);
        Ok(())
    }

    async fn requeue(&self, payment: Payment) -> Result<()> {
        self.sender
            .send(payment)
            .await
            .map_err(|_| RouterError::QueueClosed)
    }

    async fn dequeue(&self) -> Option<Payment> {
        self.receiver.lock().await.recv().await
    }
}
