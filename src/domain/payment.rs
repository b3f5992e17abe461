use crate::error::{Result, RouterError};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Represents a positive monetary amount with two fractional digits.
///
/// Amounts are rounded to cents on construction (midpoint away from zero) and
/// must remain strictly positive after rounding. On the wire they are plain
/// JSON numbers, parsed without going through `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub const SCALE: u32 = 2;
    /// Largest amount a `decimal(10,2)` ledger column holds.
    pub const MAX: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

    pub fn new(value: Decimal) -> Result<Self> {
        let rounded = value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rounded <= Decimal::ZERO {
            return Err(RouterError::Validation(
                "Amount must be positive".to_string(),
            ));
        }
        if rounded > Self::MAX {
            return Err(RouterError::Validation(format!(
                "Amount must not exceed {}",
                Self::MAX
            )));
        }
        Ok(Self(rounded))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = RouterError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::arbitrary_precision::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = rust_decimal::serde::arbitrary_precision::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

/// The upstream payment processors a payment can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Processor {
    Default,
    Fallback,
}

impl Processor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Processor::Default => "default",
            Processor::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an ingestion request, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub correlation_id: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

/// A payment travelling through the work queue.
///
/// `requested_at` is stamped by the upstream client on every delivery attempt
/// and erased again when the payment goes back on the queue. `processed_by` is
/// only known once an upstream has accepted the payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub correlation_id: String,
    pub amount: Amount,
    pub requested_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Processor>,
    /// Delivery attempts that ended in a retryable failure.
    pub attempts: u32,
}

impl Payment {
    pub fn new(correlation_id: impl Into<String>, amount: Amount) -> Result<Self> {
        let correlation_id = correlation_id.into();
        if correlation_id.trim().is_empty() {
            return Err(RouterError::Validation(
                "correlationId must not be empty".to_string(),
            ));
        }

        Ok(Self {
            correlation_id,
            amount,
            requested_at: None,
            processed_by: None,
            attempts: 0,
        })
    }

    /// Stamps the delivery time of the current attempt.
    pub fn stamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.requested_at = Some(now);
        now
    }

    /// Resets per-attempt state before the payment is requeued.
    pub fn prepare_retry(&mut self) {
        self.requested_at = None;
        self.processed_by = None;
    }

    /// Counts a delivery attempt that ended without a terminal result.
    pub fn record_failed_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    /// Fixes the accepting processor and turns the payment into its ledger row.
    pub fn commit(&mut self, processed_by: Processor) -> Result<LedgerRow> {
        let requested_at = self.requested_at.ok_or_else(|| {
            RouterError::Validation(format!(
                "payment {} was accepted without a delivery timestamp",
                self.correlation_id
            ))
        })?;
        self.processed_by = Some(processed_by);

        Ok(LedgerRow {
            correlation_id: self.correlation_id.clone(),
            amount: self.amount,
            requested_at,
            processed_by,
        })
    }
}

impl TryFrom<PaymentRequest> for Payment {
    type Error = RouterError;

    fn try_from(request: PaymentRequest) -> Result<Self> {
        let amount = Amount::try_from(request.amount)?;
        Payment::new(request.correlation_id, amount)
    }
}

/// A committed payment as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRow {
    pub correlation_id: String,
    pub amount: Amount,
    pub requested_at: DateTime<Utc>,
    pub processed_by: Processor,
}
