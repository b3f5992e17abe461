use crate::domain::payment::LedgerRow;
use crate::domain::ports::{Ledger, LedgerRows};
use crate::error::{Result, RouterError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for committed payments, keyed by correlation id.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent ledger implementation using RocksDB.
///
/// Rows are stored as JSON under their correlation id. RocksDB has no
/// insert-if-absent, so inserts are serialized through a write lock and the
/// existence check and the put happen under it.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbLedger {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbLedger {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "payments" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_payments])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn payments_cf(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_PAYMENTS)
            .ok_or_else(|| {
                RouterError::store(std::io::Error::other("Payments column family not found"))
            })
    }

    pub async fn get(&self, correlation_id: &str) -> Result<Option<LedgerRow>> {
        let cf = self.payments_cf()?;
        match self.db.get_cf(&cf, correlation_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Ledger for RocksDbLedger {
    async fn insert(&self, row: LedgerRow) -> Result<()> {
        let value = serde_json::to_vec(&row)?;
        let _guard = self.write_lock.lock().await;

        let cf = self.payments_cf()?;
        let key = row.correlation_id.as_bytes();
        if self.db.get_pinned_cf(&cf, key)?.is_some() {
            return Err(RouterError::DuplicateKey(row.correlation_id));
        }
        self.db.put_cf(&cf, key, value)?;

        Ok(())
    }

    async fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<LedgerRows> {
        let cf = self.payments_cf()?;

        let mut window = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let row: LedgerRow = serde_json::from_slice(&value)?;
            if row.requested_at >= from && row.requested_at <= to {
                window.push(row);
            }
        }

        Ok(futures::stream::iter(window.into_iter().map(Ok)).boxed())
    }
}
