//! Payment order types and status enum
//!
//! Status progresses: created → completed
//!                            ↘ failed

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Gateway order exists, no payment confirmed yet
    Created,
    /// Signed payment confirmation verified
    Completed,
    /// Payment declined or abandoned on the hosted page
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Completed => "completed",
            OrderStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(OrderStatus::Created),
            "completed" => Ok(OrderStatus::Completed),
            "failed" => Ok(OrderStatus::Failed),
            _ => Err(format!("Unknown order status: {}", s)),
        }
    }
}

/// Request body for POST /api/payments/create-order
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Major currency units, e.g. 499 or 19.99
    pub amount: Option<f64>,
    pub course_id: Option<String>,
}

/// Descriptor handed to the hosted payment widget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub success: bool,
    pub id: String,
    pub currency: String,
    pub amount: i64,
    pub receipt: String,
}

/// Signed payload the gateway hands back to the storefront
///
/// Field names are dictated by the gateway checkout widget.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentRequest {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    #[serde(rename = "courseId")]
    pub course_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentFailureRequest {
    pub razorpay_order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub success: bool,
    pub message: String,
}
