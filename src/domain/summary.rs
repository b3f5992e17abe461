use super::payment::{LedgerRow, Processor};
use crate::error::{Result, RouterError};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// Totals for a single processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorSummary {
    pub total_requests: u64,
    #[serde(serialize_with = "serialize_total")]
    pub total_amount: Decimal,
}

fn serialize_total<S>(value: &Decimal, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    rust_decimal::serde::arbitrary_precision::serialize(value, serializer)
}

impl ProcessorSummary {
    /// Adds one payment. The totals are left untouched on overflow.
    pub fn record(&mut self, amount: Decimal) -> Result<()> {
        let total_amount = self
            .total_amount
            .checked_add(amount)
            .ok_or_else(|| RouterError::Overflow("total amount exceeds the decimal range".to_string()))?;
        let total_requests = self
            .total_requests
            .checked_add(1)
            .ok_or_else(|| RouterError::Overflow("total requests exceeds u64".to_string()))?;

        self.total_amount = total_amount;
        self.total_requests = total_requests;
        Ok(())
    }
}

/// Totals partitioned by the processor that accepted each payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PaymentSummary {
    pub default: ProcessorSummary,
    pub fallback: ProcessorSummary,
}

impl PaymentSummary {
    pub fn record(&mut self, row: &LedgerRow) -> Result<()> {
        self.for_processor_mut(row.processed_by)
            .record(row.amount.value())
    }

    pub fn for_processor(&self, processor: Processor) -> &ProcessorSummary {
        match processor {
            Processor::Default => &self.default,
            Processor::Fallback => &self.fallback,
        }
    }

    fn for_processor_mut(&mut self, processor: Processor) -> &mut ProcessorSummary {
        match processor {
            Processor::Default => &mut self.default,
            Processor::Fallback => &mut self.fallback,
        }
    }
}
