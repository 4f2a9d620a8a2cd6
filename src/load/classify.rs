use crate::api::Envelope;
use crate::error::ApiError;
use crate::metrics::Outcome;

/// Maps one purchase response onto the three outcome classes.
#[must_use]
pub fn classify(result: &Result<Envelope, ApiError>) -> Outcome {
    match result {
        Ok(envelope) => {
            if envelope.order_id().is_some() {
                Outcome::PurchaseSuccess
            } else {
                Outcome::PurchaseRejected
            }
        }
        Err(err) => {
            if matches!(err, ApiError::Rejected { .. }) {
                Outcome::PurchaseRejected
            } else {
                Outcome::RequestFailure
            }
        }
    }
}
