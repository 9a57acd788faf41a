//! # Paystack Adapter
//!
//! REST client for the two Paystack transaction endpoints. No SDK, just
//! `reqwest` with a bounded timeout.
//!
//! ## Response Envelope
//! ```text
//! { "status": true|false, "message": "...", "data": { ... } }
//!
//! HTTP 2xx + status:true   → Ok(data)
//! HTTP 2xx + status:false  → GatewayError::Provider { message }
//! HTTP 4xx/5xx             → GatewayError::Provider { message }
//! unparseable body         → GatewayError::InvalidResponse
//! elapsed > timeout        → GatewayError::Timeout
//! connect / TLS failure    → GatewayError::Transport
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use super::events::{customer_from, parse_timestamp};
use super::{
    signature, GatewayConfig, GatewayError, GatewayResult, InitializedTransaction, PaymentGateway,
    TransactionVerification,
};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct InitializeRequest<'a> {
    amount: i64,
    email: &'a str,
    reference: &'a str,
    metadata: &'a Value,
    callback_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    amount: Option<i64>,
    currency: Option<String>,
    reference: String,
    paid_at: Option<String>,
    customer: Option<Value>,
    metadata: Option<Value>,
}

/// Paystack implementation of [`PaymentGateway`].
#[derive(Debug, Clone)]
pub struct PaystackGateway {
    client: Client,
    config: GatewayConfig,
}

impl PaystackGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if config.secret_key.is_none() {
            info!("Paystack gateway created without a secret key; provider calls will fail");
        }

        Ok(PaystackGateway { client, config })
    }

    fn secret(&self) -> GatewayResult<&str> {
        self.config
            .secret_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GatewayError::NotConfigured)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn read_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> GatewayResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport(e, self.config.request_timeout))?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Provider {
                    message: format!("HTTP {}", status.as_u16()),
                });
            }
            Err(e) => return Err(GatewayError::InvalidResponse(e.to_string())),
        };

        if !status.is_success() || !envelope.status {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            error!(http_status = status.as_u16(), message = %message, "Paystack rejected request");
            return Err(GatewayError::Provider { message });
        }

        envelope
            .data
            .ok_or_else(|| GatewayError::InvalidResponse("missing data".to_string()))
    }
}

fn map_transport(err: reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout)
    } else if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::Transport(err.to_string())
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize_transaction(
        &self,
        amount_minor: i64,
        email: &str,
        reference: &str,
        metadata: &Value,
    ) -> GatewayResult<InitializedTransaction> {
        let secret = self.secret()?;
        debug!(reference = %reference, amount_minor, "Initializing Paystack transaction");

        let request = InitializeRequest {
            amount: amount_minor,
            email,
            reference,
            metadata,
            callback_url: &self.config.callback_url,
        };

        let response = self
            .client
            .post(self.url("/transaction/initialize"))
            .bearer_auth(secret)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport(e, self.config.request_timeout))?;

        let data: InitializeData = self.read_envelope(response).await?;

        Ok(InitializedTransaction {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference: data.reference,
        })
    }

    async fn verify_transaction(&self, reference: &str) -> GatewayResult<TransactionVerification> {
        let secret = self.secret()?;
        debug!(reference = %reference, "Verifying Paystack transaction");

        let response = self
            .client
            .get(self.url(&format!("/transaction/verify/{}", reference)))
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| map_transport(e, self.config.request_timeout))?;

        let data: VerifyData = self.read_envelope(response).await?;

        Ok(TransactionVerification {
            success: data.status == "success",
            provider_status: data.status,
            amount: data.amount,
            currency: data.currency,
            reference: data.reference,
            paid_at: data.paid_at.as_deref().and_then(parse_timestamp),
            customer: customer_from(data.customer.as_ref()),
            metadata: data.metadata.filter(|m| m.is_object()),
        })
    }

    fn verify_webhook_signature(&self, signature: &str, raw_body: &[u8]) -> bool {
        signature::verify(self.config.secret_key.as_deref(), signature, raw_body)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> PaystackGateway {
        let config = GatewayConfig::new(
            Some("sk_test_123".to_string()),
            "http://localhost:3000/api/v1/payments/verify",
        )
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(500));
        PaystackGateway::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_sends_minor_amount_and_callback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_partial_json(json!({
                "amount": 250000,
                "email": "ada@example.com",
                "reference": "PAY_1_abc",
                "callback_url": "http://localhost:3000/api/v1/payments/verify",
                "metadata": {"paymentId": "p1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/abc",
                    "access_code": "abc",
                    "reference": "PAY_1_abc"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = gateway(&server)
            .initialize_transaction(
                250_000,
                "ada@example.com",
                "PAY_1_abc",
                &json!({"paymentId": "p1"}),
            )
            .await
            .unwrap();

        assert_eq!(result.authorization_url, "https://checkout.paystack.com/abc");
        assert_eq!(result.access_code, "abc");
        assert_eq!(result.reference, "PAY_1_abc");
    }

    #[tokio::test]
    async fn test_provider_refusal_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Invalid email"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server)
            .initialize_transaction(10_000, "bad", "PAY_2", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Provider { ref message } if message == "Invalid email"));
    }

    #[tokio::test]
    async fn test_status_false_on_200_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY_3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": false,
                "message": "Transaction reference not found"
            })))
            .mount(&server)
            .await;

        let err = gateway(&server).verify_transaction("PAY_3").await.unwrap_err();
        assert!(matches!(err, GatewayError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_verify_maps_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY_4"))
            .and(header("authorization", "Bearer sk_test_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "success",
                    "amount": 250000,
                    "currency": "NGN",
                    "reference": "PAY_4",
                    "paid_at": "2026-03-01T10:15:00.000Z",
                    "customer": {"email": "ada@example.com", "first_name": "Ada", "last_name": null},
                    "metadata": {"purpose": "Book order"}
                }
            })))
            .mount(&server)
            .await;

        let verification = gateway(&server).verify_transaction("PAY_4").await.unwrap();
        assert!(verification.success);
        assert_eq!(verification.provider_status, "success");
        assert_eq!(verification.amount, Some(250_000));
        assert_eq!(verification.currency.as_deref(), Some("NGN"));
        assert!(verification.paid_at.is_some());
        assert_eq!(verification.customer.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_verify_abandoned_is_not_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY_5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": {"status": "abandoned", "reference": "PAY_5", "amount": 10000}
            })))
            .mount(&server)
            .await;

        let verification = gateway(&server).verify_transaction("PAY_5").await.unwrap();
        assert!(!verification.success);
        assert_eq!(verification.provider_status, "abandoned");
        assert!(verification.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY_6"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": true, "data": {}}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = gateway(&server).verify_transaction("PAY_6").await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/PAY_7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = gateway(&server).verify_transaction("PAY_7").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_secret_is_not_configured() {
        let gateway = PaystackGateway::new(GatewayConfig::new(None, "http://cb")).unwrap();
        let err = gateway.verify_transaction("PAY_8").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
        assert!(!gateway.verify_webhook_signature("00", b"{}"));
    }

    #[test]
    fn test_webhook_signature_uses_secret_key() {
        let gateway = PaystackGateway::new(GatewayConfig::new(
            Some("sk_test_123".to_string()),
            "http://cb",
        ))
        .unwrap();
        let body = br#"{"event":"charge.success"}"#;
        let signature = signature::sign("sk_test_123", body);
        assert!(gateway.verify_webhook_signature(&signature, body));
        assert!(!gateway.verify_webhook_signature(&signature, b"{}"));
    }
}
