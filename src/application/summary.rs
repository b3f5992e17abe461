use crate::domain::ports::LedgerRef;
use crate::domain::summary::PaymentSummary;
use crate::error::Result;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;

/// Answers "how much went through each processor between `from` and `to`".
#[derive(Clone)]
pub struct SummaryAggregator {
    ledger: LedgerRef,
}

impl SummaryAggregator {
    pub fn new(ledger: LedgerRef) -> Self {
        Self { ledger }
    }

    /// Totals over the ledger rows whose `requested_at` lies in `[from, to]`.
    ///
    /// An inverted window is empty.
    pub async fn summarize(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<PaymentSummary> {
        if from > to {
            return Ok(PaymentSummary::default());
        }

        self.ledger
            .query(from, to)
            .await?
            .try_fold(PaymentSummary::default(), |mut summary, row| async move {
                summary.record(&row)?;
                Ok(summary)
            })
            .await
    }
}
