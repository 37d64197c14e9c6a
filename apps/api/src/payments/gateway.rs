//! Razorpay orders API and checkout signature verification.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::info;

use crate::errors::AppError;

const ORDERS_URL: &str = "https://api.razorpay.com/v1/orders";

/// An order to open with the gateway.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub amount_paise: i64,
    pub currency: &'static str,
    pub receipt: String,
    pub notes: Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key the checkout widget is opened with.
    fn key_id(&self) -> &str;

    /// Creates an order and returns its gateway id.
    async fn create_order(&self, order: NewOrder) -> Result<String, AppError>;

    /// Checks the signature the checkout widget returned for a payment.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// HMAC-SHA256 over `order_id|payment_id`, compared in constant time against
/// the hex `signature`.
pub fn signature_matches(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&expected).is_ok()
}

pub struct RazorpayGateway {
    client: Client,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_id: String, key_secret: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(20)).build()?,
            key_id,
            key_secret,
        })
    }
}

#[derive(Deserialize)]
struct OrderCreated {
    id: String,
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    async fn create_order(&self, order: NewOrder) -> Result<String, AppError> {
        let response = self
            .client
            .post(ORDERS_URL)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": order.amount_paise,
                "currency": order.currency,
                "receipt": order.receipt,
                "notes": order.notes,
            }))
            .send()
            .await
            .map_err(|e| AppError::Payment(format!("order request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Payment(format!("razorpay returned {status}: {body}")));
        }
        let created: OrderCreated = response
            .json()
            .await
            .map_err(|e| AppError::Payment(format!("unreadable order response: {e}")))?;
        info!(order_id = %created.id, amount = order.amount_paise, "payment order created");
        Ok(created.id)
    }

    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        signature_matches(&self.key_secret, order_id, payment_id, signature)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    pub const SECRET: &str = "rzp_test_secret";

    /// Hands out sequential order ids and checks signatures with [`SECRET`].
    #[derive(Default)]
    pub struct FakeGateway {
        pub orders: Mutex<Vec<NewOrder>>,
    }

    pub fn sign(order_id: &str, payment_id: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        fn key_id(&self) -> &str {
            "rzp_test_key"
        }

        async fn create_order(&self, order: NewOrder) -> Result<String, AppError> {
            let mut orders = self.orders.lock().unwrap();
            orders.push(order);
            Ok(format!("order_test_{}", orders.len()))
        }

        fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
            signature_matches(SECRET, order_id, payment_id, signature)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{sign, SECRET};
    use super::*;

    #[test]
    fn test_signature_accepts_matching_hmac() {
        let signature = sign("order_1", "pay_1");
        assert!(signature_matches(SECRET, "order_1", "pay_1", &signature));
    }

    #[test]
    fn test_signature_rejects_swapped_ids_and_garbage() {
        let signature = sign("order_1", "pay_1");
        assert!(!signature_matches(SECRET, "pay_1", "order_1", &signature));
        assert!(!signature_matches("other", "order_1", "pay_1", &signature));
        assert!(!signature_matches(SECRET, "order_1", "pay_1", "zz-not-hex"));
        assert!(!signature_matches(SECRET, "order_1", "pay_1", ""));
    }
}
