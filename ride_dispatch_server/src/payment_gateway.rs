//! The HTTP client for the external payment collaborator.
use log::debug;
use rds_common::Fare;
use ride_dispatch_engine::{PaymentGateway, PaymentGatewayError};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct PaymentRequest {
    amount: i64,
}

/// Charges ride fares against the gateway configured via `POST /api/initialize`. One charge per completion; a
/// non-success response is a business failure distinct from storage errors, and a transport failure leaves the
/// retry decision to the caller of the completion endpoint.
#[derive(Debug, Clone, Default)]
pub struct HttpPaymentGateway {
    client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, gateway_url: &str, token: &str, amount: Fare) -> Result<(), PaymentGatewayError> {
        debug!("💳️ Charging {amount} at {gateway_url}");
        let response = self
            .client
            .post(format!("{gateway_url}/payments"))
            .bearer_auth(token)
            .json(&PaymentRequest { amount: amount.value() })
            .send()
            .await
            .map_err(|e| PaymentGatewayError::Transport(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(PaymentGatewayError::ChargeRejected(format!("unexpected status code ({})", response.status())))
        }
    }
}
