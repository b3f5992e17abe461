use crate::domain::payment::{Payment, PaymentRequest};
use crate::domain::ports::WorkQueueRef;
use crate::error::Result;
use tracing::debug;

/// Validates incoming payment requests and hands them to the work queue.
///
/// Callers are acknowledged as soon as the payment is queued; delivery to a
/// processor happens later on the worker pool.
#[derive(Clone)]
pub struct PaymentService {
    queue: WorkQueueRef,
}

impl PaymentService {
    pub fn new(queue: WorkQueueRef) -> Self {
        Self { queue }
    }

    /// Fails with `Validation` for an empty correlation id or a non-positive
    /// amount, and with `QueueFull` when the queue has no room left.
    pub async fn submit(&self, request: PaymentRequest) -> Result<()> {
        let payment = Payment::try_from(request)?;
        debug!(correlation_id = %payment.correlation_id, amount = %payment.amount, "payment queued");
        self.queue.enqueue(payment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::WorkQueue;
    use crate::error::RouterError;
    use crate::infrastructure::in_memory::ChannelQueue;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn request(id: &str, amount: rust_decimal::Decimal) -> PaymentRequest {
        PaymentRequest {
            correlation_id: id.to_string(),
            amount,
        }
    }

    #[tokio::test]
    async fn test_submit_enqueues_valid_payment() {
        let queue = Arc::new(ChannelQueue::new(4, 1).unwrap());
        let service = PaymentService::new(queue.clone());

        service.submit(request("abc", dec!(19.23))).await.unwrap();

        let queued = queue.dequeue().await.unwrap();
        assert_eq!(queued.correlation_id, "abc");
        assert_eq!(queued.amount.value(), dec!(19.23));
        assert_eq!(queued.requested_at, None);
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_requests() {
        let queue = Arc::new(ChannelQueue::new(4, 1).unwrap());
        let service = PaymentService::new(queue.clone());

        assert!(matches!(
            service.submit(request("", dec!(1.00))).await,
            Err(RouterError::Validation(_))
        ));
        assert!(matches!(
            service.submit(request("abc", dec!(-1.00))).await,
            Err(RouterError::Validation(_))
        ));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_submit_reports_full_queue() {
        let queue = Arc::new(ChannelQueue::new(2, 1).unwrap());
        let service = PaymentService::new(queue);

        service.submit(request("a", dec!(1.00))).await.unwrap();
        assert!(matches!(
            service.submit(request("b", dec!(1.00))).await,
            Err(RouterError::QueueFull)
        ));
    }
}
