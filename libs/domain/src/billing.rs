//! Credits, purchasable plans and payment records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const INITIAL_CREDITS: i64 = 10;
pub const INITIAL_MAX_RESUMES: i64 = 2;

/// Credits charged per action.
pub mod cost {
    pub const EXTRACT_RESUME: i64 = 5;
    pub const REPHRASE: i64 = 2;
    pub const SELECT_RESUME_ELEMENTS: i64 = 5;
    pub const CUSTOM_RESUME_SLOT: i64 = 30;
}

/// Donation bounds in rupees.
pub const COFFEE_MIN_INR: i64 = 10;
pub const COFFEE_MAX_INR: i64 = 10_000;
pub const COFFEE_PLAN_NAME: &str = "COFFEE";
pub const CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanName {
    Starter,
    Popular,
    Premium,
}

impl PlanName {
    pub const ALL: [PlanName; 3] = [PlanName::Starter, PlanName::Popular, PlanName::Premium];

    pub fn as_str(self) -> &'static str {
        match self {
            PlanName::Starter => "STARTER",
            PlanName::Popular => "POPULAR",
            PlanName::Premium => "PREMIUM",
        }
    }

    pub fn plan(self) -> Plan {
        let (credits, price_inr, display_name) = match self {
            PlanName::Starter => (70, 60, "Starter Plan"),
            PlanName::Popular => (400, 250, "Popular Plan"),
            PlanName::Premium => (1000, 500, "Premium Plan"),
        };
        Plan {
            name: self,
            credits,
            price_inr,
            display_name: display_name.to_string(),
        }
    }
}

impl fmt::Display for PlanName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown plan '{0}'")]
pub struct UnknownPlan(pub String);

impl FromStr for PlanName {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanName::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlan(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: PlanName,
    pub credits: i64,
    pub price_inr: i64,
    pub display_name: String,
}

impl Plan {
    /// Razorpay amounts are in the smallest unit (paise).
    pub fn amount_paise(&self) -> i64 {
        self.price_inr * 100
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub plan_name: String,
}

/// Everything the checkout widget needs to open a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order_id: String,
    /// In paise.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub plan_name: String,
    pub credits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
    pub plan_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoffeeOrderRequest {
    /// In rupees.
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoffeeVerifyRequest {
    pub payment_id: String,
    pub order_id: String,
    pub signature: String,
    pub amount: i64,
}

pub fn check_coffee_amount(amount: i64) -> Result<(), String> {
    if amount < COFFEE_MIN_INR {
        Err(format!("Amount must be at least ₹{COFFEE_MIN_INR}"))
    } else if amount > COFFEE_MAX_INR {
        Err(format!("Amount must not exceed ₹{COFFEE_MAX_INR}"))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_name: String,
    pub credits_added: i64,
    /// In paise.
    pub amount_paid: i64,
    pub payment_id: String,
    pub order_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentHistory {
    pub payments: Vec<PaymentRecord>,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyResumeSlotResponse {
    pub message: String,
    pub credits_remaining: i64,
    pub max_resume: i64,
}
