use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use resume_domain::{Element, ElementKind, Record};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::elements::store;
use crate::errors::{AppError, AppJson};
use crate::state::AppState;

/// Ids arrive as raw strings so a malformed one is a 400 with the usual body.
pub fn parse_id(raw: &str, kind: ElementKind) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", kind.label().to_lowercase())))
}

/// GET /api/<kind>/
pub async fn list<T: Element>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Record<T>>>, AppError> {
    Ok(Json(store::list::<T>(&state.db, user.id).await?))
}

/// GET /api/<kind>/:id
pub async fn get<T: Element>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<Record<T>>, AppError> {
    let id = parse_id(&raw_id, T::KIND)?;
    Ok(Json(store::get::<T>(&state.db, user.id, id).await?))
}

/// POST /api/<kind>/
pub async fn create<T: Element>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(data): AppJson<T>,
) -> Result<(StatusCode, Json<Record<T>>), AppError> {
    data.validate()?;
    let record = store::insert(&state.db, user.id, &data).await?;
    info!(user_id = %user.id, kind = %T::KIND, id = %record.id, "element created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/<kind>/:id
pub async fn update<T: Element>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
    AppJson(update): AppJson<T::Update>,
) -> Result<Json<Record<T>>, AppError> {
    let id = parse_id(&raw_id, T::KIND)?;
    Ok(Json(store::update::<T>(&state.db, user.id, id, update).await?))
}

/// DELETE /api/<kind>/:id
pub async fn delete<T: Element>(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw_id, T::KIND)?;
    store::delete::<T>(&state.db, user.id, id).await?;
    info!(user_id = %user.id, kind = %T::KIND, %id, "element deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), ElementKind::Award).unwrap(), id);
        match parse_id("not-a-uuid", ElementKind::Award) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid award ID"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
