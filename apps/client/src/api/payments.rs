use resume_domain::billing::{
    check_coffee_amount, BuyResumeSlotResponse, CoffeeOrderRequest, CoffeeVerifyRequest,
    CreateOrderRequest, OrderResponse, PaymentHistory, PaymentRecord, Plan, PlanName,
    VerifyPaymentRequest,
};
use resume_domain::ValidationErrors;

use crate::error::ClientError;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn plans(&self) -> Result<Vec<Plan>, ClientError> {
        self.get("/api/payment/plans").await
    }

    pub async fn create_order(&self, plan: PlanName) -> Result<OrderResponse, ClientError> {
        let body = CreateOrderRequest {
            plan_name: plan.as_str().to_string(),
        };
        self.post("/api/payment/create-order", &body).await
    }

    /// Confirms a checkout. The granted credits are added to the cached balance.
    pub async fn verify_payment(&self, req: &VerifyPaymentRequest) -> Result<PaymentRecord, ClientError> {
        let record: PaymentRecord = self.post("/api/payment/verify-payment", req).await?;
        self.add_credits(record.credits_added);
        Ok(record)
    }

    pub async fn buy_resume_slot(&self) -> Result<BuyResumeSlotResponse, ClientError> {
        let response: BuyResumeSlotResponse = self.post_empty("/api/payment/buy-resume-slot").await?;
        self.session().set_credits(response.credits_remaining);
        Ok(response)
    }

    pub async fn create_coffee_order(&self, amount_inr: i64) -> Result<OrderResponse, ClientError> {
        if let Err(message) = check_coffee_amount(amount_inr) {
            let mut errors = ValidationErrors::new();
            errors.push("amount", message);
            return Err(errors.into());
        }
        let body = CoffeeOrderRequest { amount: amount_inr };
        self.post("/api/payment/buy-coffee/create-order", &body).await
    }

    pub async fn verify_coffee(&self, req: &CoffeeVerifyRequest) -> Result<PaymentRecord, ClientError> {
        self.post("/api/payment/buy-coffee/verify", req).await
    }

    pub async fn payment_history(&self) -> Result<PaymentHistory, ClientError> {
        self.get("/api/payment/history").await
    }

    fn add_credits(&self, delta: i64) {
        if let Some(current) = self.session().credits() {
            self.session().set_credits(current + delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::http::testing::{client, token_body, ScriptedTransport};

    #[tokio::test]
    async fn test_verified_payment_adds_credits() {
        let transport = ScriptedTransport::new(|_, _| {
            (
                StatusCode::OK,
                json!({
                    "id": "7f0c4f5e-6a53-4c43-9a2b-1f4a9a7d2c11",
                    "user_id": "1b2d3c4e-0000-4000-8000-000000000001",
                    "plan_name": "STARTER",
                    "credits_added": 50,
                    "amount_paid": 9900,
                    "payment_id": "pay_1",
                    "order_id": "order_1",
                    "status": "completed",
                    "created_at": "2024-05-01T10:00:00Z"
                }),
            )
        });
        let client = client(transport);
        client
            .session()
            .establish(&serde_json::from_value(token_body("t", 10)).unwrap());
        let req = VerifyPaymentRequest {
            payment_id: "pay_1".into(),
            order_id: "order_1".into(),
            signature: "sig".into(),
            plan_name: "STARTER".into(),
        };
        client.verify_payment(&req).await.unwrap();
        assert_eq!(client.session().credits(), Some(60));
    }

    #[tokio::test]
    async fn test_coffee_amount_checked_locally() {
        let transport = ScriptedTransport::new(|_, _| panic!("no request expected"));
        let err = client(transport).create_coffee_order(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
