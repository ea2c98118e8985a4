//! Razorpay client: remote order creation and callback signature checks.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::GatewayConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// Free-form metadata attached to a remote order
#[derive(Debug, Clone, Serialize)]
pub struct OrderNotes {
    pub course_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    /// Smallest currency unit
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a OrderNotes,
}

#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    key_id: Option<String>,
    key_secret: Option<String>,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    fn credentials(&self) -> Result<(&str, &str), GatewayError> {
        match (self.key_id.as_deref(), self.key_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(GatewayError::Unavailable(
                "gateway credentials are not configured".to_string(),
            )),
        }
    }

    /// Creates an order on the gateway. `amount_major` is in major units
    /// (rupees); the returned order carries the converted minor amount.
    pub async fn create_remote_order(
        &self,
        amount_major: f64,
        currency: &str,
        notes: OrderNotes,
    ) -> Result<RemoteOrder, GatewayError> {
        let amount = to_minor_units(amount_major)?;
        let (key_id, key_secret) = self.credentials()?;
        let receipt = format!("receipt_{}", Utc::now().timestamp_millis());

        tracing::info!(
            amount,
            currency,
            course_id = %notes.course_id,
            user_id = %notes.user_id,
            "Creating gateway order"
        );

        let url = format!("{}/v1/orders", self.base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(key_id, Some(key_secret))
            .json(&CreateOrderBody {
                amount,
                currency,
                receipt: &receipt,
                notes: &notes,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Unavailable("gateway request timed out".to_string())
                } else {
                    GatewayError::Unavailable(format!("gateway request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GatewayError::Unavailable(format!("gateway returned {}", status)));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!(
                "gateway returned {}: {}",
                status, error_text
            )));
        }

        let mut order: RemoteOrder = response
            .json()
            .await
            .map_err(|e| GatewayError::Rejected(format!("unreadable gateway response: {}", e)))?;

        if order.receipt.is_empty() {
            order.receipt = receipt;
        }

        tracing::info!(order_id = %order.id, amount = order.amount, "Gateway order created");
        Ok(order)
    }

    /// True iff `signature` is the lowercase hex HMAC-SHA256 of
    /// `order_id|payment_id` under the key secret. Comparison is constant time.
    pub fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, GatewayError> {
        let (_, key_secret) = self.credentials()?;
        signature_matches(key_secret, order_id, payment_id, signature)
    }
}

/// Converts a major-unit amount to the smallest currency unit, rounding to
/// the nearest unit.
pub fn to_minor_units(amount_major: f64) -> Result<i64, GatewayError> {
    if !amount_major.is_finite() || amount_major <= 0.0 {
        return Err(GatewayError::InvalidAmount(format!(
            "amount must be a positive number, got {}",
            amount_major
        )));
    }

    let minor = (amount_major * 100.0).round();
    if minor < 1.0 || minor > i64::MAX as f64 {
        return Err(GatewayError::InvalidAmount(format!(
            "amount {} is out of range",
            amount_major
        )));
    }

    Ok(minor as i64)
}

/// Lowercase hex HMAC-SHA256 over `order_id|payment_id`, as the gateway
/// computes it for checkout callbacks.
pub fn sign_payment(key_secret: &str, order_id: &str, payment_id: &str) -> Result<String, GatewayError> {
    let mac = payment_mac(key_secret, order_id, payment_id)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn payment_mac(key_secret: &str, order_id: &str, payment_id: &str) -> Result<HmacSha256, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes())
        .map_err(|e| GatewayError::Unavailable(format!("invalid gateway key secret: {}", e)))?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Ok(mac)
}

fn signature_matches(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<bool, GatewayError> {
    // Only the lowercase form is ever produced; anything else is a mismatch
    if signature.bytes().any(|b| b.is_ascii_uppercase()) {
        return Ok(false);
    }
    let Ok(expected) = hex::decode(signature) else {
        return Ok(false);
    };

    let mac = payment_mac(key_secret, order_id, payment_id)?;
    Ok(mac.verify_slice(&expected).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SECRET: &str = "rzp_test_secret";

    fn client(secret: Option<&str>) -> GatewayClient {
        GatewayClient::new(&GatewayConfig {
            key_id: Some("rzp_test_key".to_string()),
            key_secret: secret.map(str::to_string),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
            currency: "INR".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(to_minor_units(19.99).unwrap(), 1999);
        assert_eq!(to_minor_units(499.0).unwrap(), 49900);
        assert_eq!(to_minor_units(0.01).unwrap(), 1);
        assert_eq!(to_minor_units(1.005).unwrap(), 100);
    }

    #[test]
    fn test_minor_unit_conversion_rejects_non_positive() {
        assert!(matches!(to_minor_units(0.0), Err(GatewayError::InvalidAmount(_))));
        assert!(matches!(to_minor_units(-5.0), Err(GatewayError::InvalidAmount(_))));
        assert!(matches!(to_minor_units(f64::NAN), Err(GatewayError::InvalidAmount(_))));
        assert!(matches!(to_minor_units(f64::INFINITY), Err(GatewayError::InvalidAmount(_))));
        // Rounds to zero minor units
        assert!(matches!(to_minor_units(0.004), Err(GatewayError::InvalidAmount(_))));
    }

    #[test]
    fn test_signature_is_hex_hmac_of_order_and_payment() {
        let gateway = client(Some(SECRET));
        let signature = sign_payment(SECRET, "order_abc", "pay_xyz").unwrap();

        assert_eq!(signature.len(), 64);
        assert!(gateway.verify_signature("order_abc", "pay_xyz", &signature).unwrap());
    }

    #[test]
    fn test_signature_mismatches() {
        let gateway = client(Some(SECRET));
        let signature = sign_payment(SECRET, "order_abc", "pay_xyz").unwrap();

        // swapped ids
        assert!(!gateway.verify_signature("pay_xyz", "order_abc", &signature).unwrap());
        // other secret
        let forged = sign_payment("other_secret", "order_abc", "pay_xyz").unwrap();
        assert!(!gateway.verify_signature("order_abc", "pay_xyz", &forged).unwrap());
        // not hex, truncated, uppercase
        assert!(!gateway.verify_signature("order_abc", "pay_xyz", "zz-not-hex").unwrap());
        assert!(!gateway.verify_signature("order_abc", "pay_xyz", &signature[..32]).unwrap());
        assert!(
            !gateway
                .verify_signature("order_abc", "pay_xyz", &signature.to_uppercase())
                .unwrap()
        );
    }

    #[test]
    fn test_missing_secret_is_unavailable() {
        let gateway = client(None);
        let result = gateway.verify_signature("order_abc", "pay_xyz", "00");
        assert!(matches!(result, Err(GatewayError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_create_order_rejects_zero_amount_before_any_call() {
        let gateway = client(Some(SECRET));
        let notes = OrderNotes {
            course_id: "c1".to_string(),
            user_id: "u1".to_string(),
        };
        let result = gateway.create_remote_order(0.0, "INR", notes).await;
        assert!(matches!(result, Err(GatewayError::InvalidAmount(_))));
    }
}
