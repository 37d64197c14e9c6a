use axum::{extract::State, Json};
use chrono::Utc;
use resume_domain::billing::{
    check_coffee_amount, cost, BuyResumeSlotResponse, CoffeeOrderRequest, CoffeeVerifyRequest,
    CreateOrderRequest, OrderResponse, PaymentHistory, PaymentRecord, Plan, PlanName,
    VerifyPaymentRequest, COFFEE_PLAN_NAME, CURRENCY,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::credits;
use crate::errors::{AppError, AppJson};
use crate::models::payment::PaymentRow;
use crate::payments::gateway::NewOrder;
use crate::state::AppState;

fn parse_plan(name: &str) -> Result<Plan, AppError> {
    name.parse::<PlanName>().map(PlanName::plan).map_err(|_| {
        let names: Vec<&str> = PlanName::ALL.iter().map(|p| p.as_str()).collect();
        AppError::BadRequest(format!(
            "Invalid plan name. Must be one of: {}",
            names.join(", ")
        ))
    })
}

fn check_signature(
    state: &AppState,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), AppError> {
    if state.payments.verify_signature(order_id, payment_id, signature) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Invalid payment signature. Payment verification failed.".into(),
        ))
    }
}

/// A verified payment to record exactly once.
struct Settlement<'a> {
    user_id: Uuid,
    plan_name: &'a str,
    credits: i64,
    amount_paise: i64,
    payment_id: &'a str,
    order_id: &'a str,
}

/// Records the payment and adds its credits in one transaction. Replaying a
/// payment that was already settled returns the stored record unchanged.
async fn settle(state: &AppState, s: Settlement<'_>) -> Result<PaymentRecord, AppError> {
    let mut tx = state.db.begin().await?;

    let inserted: Option<PaymentRow> = sqlx::query_as(
        r#"
        INSERT INTO payments
            (user_id, plan_name, credits_added, amount_paid, payment_id, order_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'completed')
        ON CONFLICT (payment_id, order_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(s.user_id)
    .bind(s.plan_name)
    .bind(s.credits)
    .bind(s.amount_paise)
    .bind(s.payment_id)
    .bind(s.order_id)
    .fetch_optional(&mut *tx)
    .await?;

    let row = match inserted {
        Some(row) => {
            if s.credits > 0 {
                credits::add(&mut *tx, s.user_id, s.credits).await?;
            }
            info!(user_id = %s.user_id, plan = s.plan_name, credits = s.credits, "payment settled");
            row
        }
        None => {
            sqlx::query_as::<_, PaymentRow>(
                "SELECT * FROM payments WHERE payment_id = $1 AND order_id = $2",
            )
            .bind(s.payment_id)
            .bind(s.order_id)
            .fetch_one(&mut *tx)
            .await?
        }
    };
    tx.commit().await?;
    Ok(row.into())
}

/// GET /api/payment/plans
pub async fn plans() -> Json<Vec<Plan>> {
    Json(PlanName::ALL.iter().map(|p| p.plan()).collect())
}

/// POST /api/payment/create-order
pub async fn create_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let plan = parse_plan(&req.plan_name)?;
    let order_id = state
        .payments
        .create_order(NewOrder {
            amount_paise: plan.amount_paise(),
            currency: CURRENCY,
            receipt: format!("credits_{}_{}", plan.name, Utc::now().timestamp()),
            notes: json!({
                "plan_name": plan.name.as_str(),
                "credits": plan.credits.to_string(),
                "user_id": user.id.to_string(),
            }),
        })
        .await?;

    Ok(Json(OrderResponse {
        order_id,
        amount: plan.amount_paise(),
        currency: CURRENCY.to_string(),
        key_id: state.payments.key_id().to_string(),
        plan_name: plan.name.as_str().to_string(),
        credits: plan.credits,
    }))
}

/// POST /api/payment/verify-payment
pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<VerifyPaymentRequest>,
) -> Result<Json<PaymentRecord>, AppError> {
    let plan = parse_plan(&req.plan_name)?;
    check_signature(&state, &req.order_id, &req.payment_id, &req.signature)?;
    let record = settle(
        &state,
        Settlement {
            user_id: user.id,
            plan_name: plan.name.as_str(),
            credits: plan.credits,
            amount_paise: plan.amount_paise(),
            payment_id: &req.payment_id,
            order_id: &req.order_id,
        },
    )
    .await?;
    Ok(Json(record))
}

/// POST /api/payment/buy-resume-slot
pub async fn buy_resume_slot(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<BuyResumeSlotResponse>, AppError> {
    let updated: Option<(i64, i64)> = sqlx::query_as(
        r#"
        UPDATE users
        SET credits = credits - $2, max_resume = max_resume + 1, updated_at = NOW()
        WHERE id = $1 AND credits >= $2
        RETURNING credits, max_resume
        "#,
    )
    .bind(user.id)
    .bind(cost::CUSTOM_RESUME_SLOT)
    .fetch_optional(&state.db)
    .await?;

    let Some((credits_remaining, max_resume)) = updated else {
        return Err(AppError::InsufficientCredits {
            required: cost::CUSTOM_RESUME_SLOT,
            available: credits::balance(&state.db, user.id).await?,
        });
    };
    info!(user_id = %user.id, max_resume, "resume slot purchased");
    Ok(Json(BuyResumeSlotResponse {
        message: format!(
            "Resume slot purchased. You can now create up to {max_resume} resumes"
        ),
        credits_remaining,
        max_resume,
    }))
}

/// POST /api/payment/buy-coffee/create-order
pub async fn create_coffee_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<CoffeeOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    check_coffee_amount(req.amount).map_err(AppError::BadRequest)?;
    let amount_paise = req.amount * 100;
    let order_id = state
        .payments
        .create_order(NewOrder {
            amount_paise,
            currency: CURRENCY,
            receipt: format!("coffee_{}", Utc::now().timestamp()),
            notes: json!({ "type": "coffee", "user_id": user.id.to_string() }),
        })
        .await?;

    Ok(Json(OrderResponse {
        order_id,
        amount: amount_paise,
        currency: CURRENCY.to_string(),
        key_id: state.payments.key_id().to_string(),
        plan_name: COFFEE_PLAN_NAME.to_string(),
        credits: 0,
    }))
}

/// POST /api/payment/buy-coffee/verify
pub async fn verify_coffee(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<CoffeeVerifyRequest>,
) -> Result<Json<PaymentRecord>, AppError> {
    check_coffee_amount(req.amount).map_err(AppError::BadRequest)?;
    check_signature(&state, &req.order_id, &req.payment_id, &req.signature)?;
    let record = settle(
        &state,
        Settlement {
            user_id: user.id,
            plan_name: COFFEE_PLAN_NAME,
            credits: 0,
            amount_paise: req.amount * 100,
            payment_id: &req.payment_id,
            order_id: &req.order_id,
        },
    )
    .await?;
    Ok(Json(record))
}

/// GET /api/payment/history
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<PaymentHistory>, AppError> {
    let rows: Vec<PaymentRow> =
        sqlx::query_as("SELECT * FROM payments WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(user.id)
            .fetch_all(&state.db)
            .await?;
    let payments: Vec<PaymentRecord> = rows.into_iter().map(PaymentRecord::from).collect();
    Ok(Json(PaymentHistory {
        total: payments.len() as i64,
        payments,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_is_case_insensitive() {
        let plan = parse_plan("popular").unwrap();
        assert_eq!(plan.credits, 400);
        assert_eq!(plan.amount_paise(), 25_000);
    }

    #[test]
    fn test_parse_plan_lists_valid_names() {
        match parse_plan("GOLD") {
            Err(AppError::BadRequest(msg)) => {
                assert!(msg.contains("STARTER, POPULAR, PREMIUM"), "{msg}")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
