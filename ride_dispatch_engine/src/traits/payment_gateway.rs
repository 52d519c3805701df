use rds_common::Fare;
use thiserror::Error;

/// The external payment collaborator. On ride completion the engine computes the final fare and invokes this
/// exactly once; there is no internal retry.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Charges `amount` against the stored payment `token` at the gateway behind `gateway_url`.
    ///
    /// A business rejection from the gateway surfaces as [`PaymentGatewayError::ChargeRejected`] so callers can
    /// distinguish "your money was not charged" from a storage failure. A transport failure surfaces as
    /// [`PaymentGatewayError::Transport`] and is retryable by the caller of the completion endpoint.
    async fn charge(&self, gateway_url: &str, token: &str, amount: Fare) -> Result<(), PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("The payment gateway rejected the charge. {0}")]
    ChargeRejected(String),
    #[error("Could not reach the payment gateway. {0}")]
    Transport(String),
}
