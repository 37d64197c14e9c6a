use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use resume_domain::ai::{AiAction, SelectElementsRequest, SelectElementsResponse};
use resume_domain::billing::cost;
use resume_domain::{
    Award, Certification, CustomResume, CustomResumeCreate, CustomResumeUpdate, DownloadRecorded,
    Education, Element, ElementKind, ElementSelection, Experience, GeneratedResume, Heading,
    Project, ResumeSections, Skill, Volunteer,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::ai::usage::{charge, Charge};
use crate::auth::AuthUser;
use crate::credits;
use crate::custom_resume::compile::{compile, Toolchain};
use crate::custom_resume::render::{render_document, Author};
use crate::custom_resume::store;
use crate::elements::store::all_rows;
use crate::errors::{AppError, AppJson};
use crate::llm_client::{complete_json, prompts, CompletionRequest};
use crate::models::element::ElementRow;
use crate::state::AppState;
use crate::storage::resume_asset_key;

const SELECT_MAX_TOKENS: u32 = 1024;

fn parse_resume_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest("Invalid custom resume ID".into()))
}

/// Ids present in `new` but not in `old`, per kind.
fn added_ids(old: &ElementSelection, new: &ElementSelection) -> ElementSelection {
    let mut added = ElementSelection::default();
    for kind in ElementKind::ALL {
        let before: HashSet<&Uuid> = old.ids(kind).iter().collect();
        *added.ids_mut(kind) = new
            .ids(kind)
            .iter()
            .filter(|id| !before.contains(id))
            .copied()
            .collect();
    }
    added
}

/// GET /api/custom-resume/
pub async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CustomResume>>, AppError> {
    let rows = store::list(&state.db, user.id).await?;
    let mut resumes = Vec::with_capacity(rows.len());
    for row in rows {
        resumes.push(store::populate(&state.db, row).await?);
    }
    Ok(Json(resumes))
}

/// GET /api/custom-resume/:id
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<CustomResume>, AppError> {
    let id = parse_resume_id(&raw_id)?;
    let row = store::get(&state.db, user.id, id).await?;
    Ok(Json(store::populate(&state.db, row).await?))
}

/// POST /api/custom-resume/
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<CustomResumeCreate>,
) -> Result<(StatusCode, Json<CustomResume>), AppError> {
    req.validate()?;
    store::check_references(&state.db, user.id, &req.selection).await?;

    let row = store::insert_within_limit(&state.db, user.id, req.name.trim(), &req.selection)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Resume limit reached. You can create up to {} resumes; buy another slot to add more.",
                user.max_resume
            ))
        })?;
    info!(user_id = %user.id, resume_id = %row.id, "custom resume created");
    Ok((StatusCode::CREATED, Json(store::populate(&state.db, row).await?)))
}

/// PUT /api/custom-resume/:id
///
/// Only ids the update introduces are checked; ids already stored that point
/// at deleted elements are tolerated and skipped when populating.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
    AppJson(req): AppJson<CustomResumeUpdate>,
) -> Result<Json<CustomResume>, AppError> {
    let id = parse_resume_id(&raw_id)?;
    let row = store::get(&state.db, user.id, id).await?;

    let mut next = CustomResumeCreate {
        name: row.name.clone(),
        selection: row.selection.0.clone(),
    };
    req.apply(&mut next.name, &mut next.selection);
    next.validate()?;
    store::check_references(&state.db, user.id, &added_ids(&row.selection.0, &next.selection))
        .await?;

    let saved = store::save(&state.db, user.id, id, next.name.trim(), &next.selection).await?;
    Ok(Json(store::populate(&state.db, saved).await?))
}

/// DELETE /api/custom-resume/:id
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_resume_id(&raw_id)?;
    store::delete(&state.db, user.id, id).await?;
    info!(user_id = %user.id, resume_id = %id, "custom resume deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/custom-resume/user-elements
pub async fn user_elements(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ResumeSections>, AppError> {
    let rows = all_rows(&state.db, user.id).await?;
    Ok(Json(store::group(&rows)?))
}

fn summarize<T: Element>(row: &ElementRow) -> Result<String, AppError> {
    let record = row
        .clone()
        .into_record::<T>()
        .with_context(|| format!("stored {} {} does not decode", T::KIND, row.id))?;
    Ok(record.data.summary())
}

fn catalog_line(row: &ElementRow, kind: ElementKind) -> Result<String, AppError> {
    let summary = match kind {
        ElementKind::Heading => summarize::<Heading>(row)?,
        ElementKind::Education => summarize::<Education>(row)?,
        ElementKind::Experience => summarize::<Experience>(row)?,
        ElementKind::Project => summarize::<Project>(row)?,
        ElementKind::Skill => summarize::<Skill>(row)?,
        ElementKind::Certification => summarize::<Certification>(row)?,
        ElementKind::Award => summarize::<Award>(row)?,
        ElementKind::Volunteer => summarize::<Volunteer>(row)?,
    };
    Ok(format!("{kind} {}: {summary}", row.id))
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    #[serde(flatten)]
    selection: ElementSelection,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Keeps only ids listed under their own kind, once each.
fn sanitize(selection: &mut ElementSelection, kinds: &HashMap<Uuid, ElementKind>) {
    for kind in ElementKind::ALL {
        let mut seen = HashSet::new();
        selection
            .ids_mut(kind)
            .retain(|id| kinds.get(id) == Some(&kind) && seen.insert(*id));
    }
    let known: HashSet<Uuid> = kinds.keys().copied().collect();
    selection.retain_known(&known);
}

/// POST /api/custom-resume/select-elements
pub async fn select_elements(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<SelectElementsRequest>,
) -> Result<Json<SelectElementsResponse>, AppError> {
    let job_description = req.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::BadRequest("job_description must not be empty".into()));
    }
    let rows = all_rows(&state.db, user.id).await?;
    if rows.is_empty() {
        return Err(AppError::BadRequest(
            "Add some resume elements before asking for a selection".into(),
        ));
    }
    credits::ensure(&state.db, user.id, cost::SELECT_RESUME_ELEMENTS).await?;

    let mut kinds = HashMap::with_capacity(rows.len());
    let mut catalog = Vec::with_capacity(rows.len());
    for row in &rows {
        let kind: ElementKind = row
            .kind
            .parse()
            .map_err(|_| anyhow!("element {} has unknown kind {}", row.id, row.kind))?;
        kinds.insert(row.id, kind);
        catalog.push(catalog_line(row, kind)?);
    }

    let prompt = prompts::select_elements(job_description, &catalog.join("\n"));
    let (mut suggestion, tokens_used): (Suggestion, i64) = complete_json(
        state.llm.as_ref(),
        CompletionRequest {
            system: prompts::JSON_ONLY_SYSTEM,
            prompt: &prompt,
            max_tokens: SELECT_MAX_TOKENS,
            temperature: 0.2,
        },
    )
    .await?;
    sanitize(&mut suggestion.selection, &kinds);

    let credits_remaining = charge(
        &state.db,
        Charge {
            user_id: user.id,
            action: AiAction::SelectElements,
            section: "custom_resume",
            item_id: None,
            credits: cost::SELECT_RESUME_ELEMENTS,
            tokens_used,
        },
    )
    .await?;

    Ok(Json(SelectElementsResponse {
        selection: suggestion.selection,
        reasoning: suggestion.reasoning,
        tokens_used,
        credits_remaining,
    }))
}

/// POST /api/custom-resume/:id/generate
pub async fn generate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<GeneratedResume>, AppError> {
    let id = parse_resume_id(&raw_id)?;
    let resume = store::populate(&state.db, store::get(&state.db, user.id, id).await?).await?;

    let full_name = user.full_name();
    let latex = render_document(
        &resume.sections,
        &Author {
            full_name: &full_name,
            email: &user.email,
        },
    );
    let compiled = compile(&Toolchain::from_config(&state.config), &latex).await?;

    let stamp = Utc::now().timestamp_millis();
    let pdf_key = resume_asset_key(user.id, id, stamp, "pdf");
    let pdf_url = state
        .storage
        .put(&pdf_key, compiled.pdf, "application/pdf")
        .await?;
    let latex_url = state
        .storage
        .put(
            &resume_asset_key(user.id, id, stamp, "tex"),
            latex.into_bytes(),
            "application/x-tex",
        )
        .await?;
    let thumbnail_url = match compiled.thumbnail {
        Some(png) => Some(
            state
                .storage
                .put(&resume_asset_key(user.id, id, stamp, "png"), png, "image/png")
                .await?,
        ),
        None => None,
    };

    let mut tx = state.db.begin().await?;
    let updated = sqlx::query(
        r#"
        UPDATE custom_resumes
        SET pdf_url = $3, latex_url = $4, thumbnail_url = $5, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user.id)
    .bind(&pdf_url)
    .bind(&latex_url)
    .bind(&thumbnail_url)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        // deleted while compiling
        return Err(store::not_found());
    }
    sqlx::query(
        r#"
        INSERT INTO pdf_history
            (user_id, custom_resume_id, resume_name, pdf_url, latex_url, thumbnail_url, s3_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(user.id)
    .bind(id)
    .bind(&resume.name)
    .bind(&pdf_url)
    .bind(&latex_url)
    .bind(&thumbnail_url)
    .bind(&pdf_key)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        r#"
        UPDATE users
        SET pdfs_generated_count = pdfs_generated_count + 1, last_pdf_generated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user.id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(user_id = %user.id, resume_id = %id, %pdf_url, "resume PDF generated");
    Ok(Json(GeneratedResume {
        resume_id: id,
        pdf_url,
        latex_url,
        thumbnail_url,
        message: "Resume generated successfully".to_string(),
    }))
}

/// POST /api/custom-resume/:id/download
pub async fn download(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<DownloadRecorded>, AppError> {
    let id = parse_resume_id(&raw_id)?;
    store::get(&state.db, user.id, id).await?;

    let mut tx = state.db.begin().await?;
    let (pdf_url, downloaded_at): (String, DateTime<Utc>) = sqlx::query_as(
        r#"
        UPDATE pdf_history SET downloaded_at = NOW()
        WHERE id = (
            SELECT id FROM pdf_history
            WHERE custom_resume_id = $1 AND user_id = $2
            ORDER BY compiled_at DESC
            LIMIT 1
        )
        RETURNING pdf_url, downloaded_at
        "#,
    )
    .bind(id)
    .bind(user.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound("No PDF has been generated for this resume".into()))?;
    sqlx::query("UPDATE users SET pdfs_downloaded_count = pdfs_downloaded_count + 1 WHERE id = $1")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(Json(DownloadRecorded {
        pdf_url,
        downloaded_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_ids_only_new_ones() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let old = ElementSelection {
            project_ids: vec![a, b],
            ..Default::default()
        };
        let new = ElementSelection {
            project_ids: vec![b, c],
            skill_ids: vec![a],
            ..Default::default()
        };
        let added = added_ids(&old, &new);
        assert_eq!(added.project_ids, vec![c]);
        assert_eq!(added.skill_ids, vec![a]);
        assert_eq!(added.total(), 2);
    }

    #[test]
    fn test_sanitize_drops_unknown_misplaced_and_repeated() {
        let (h1, h2, p, ghost) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let kinds = HashMap::from([
            (h1, ElementKind::Heading),
            (h2, ElementKind::Heading),
            (p, ElementKind::Project),
        ]);
        let mut selection = ElementSelection {
            heading_ids: vec![h1, h2],
            project_ids: vec![p, ghost, p],
            skill_ids: vec![p],
            ..Default::default()
        };
        sanitize(&mut selection, &kinds);
        assert_eq!(selection.heading_ids, vec![h1]);
        assert_eq!(selection.project_ids, vec![p]);
        assert!(selection.skill_ids.is_empty());
    }

    #[test]
    fn test_suggestion_tolerates_missing_lists() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"project_ids": ["{id}"], "reasoning": "closest match"}}"#);
        let suggestion: Suggestion = serde_json::from_str(&raw).unwrap();
        assert_eq!(suggestion.selection.project_ids, vec![id]);
        assert!(suggestion.selection.heading_ids.is_empty());
        assert_eq!(suggestion.reasoning.as_deref(), Some("closest match"));
    }

    #[test]
    fn test_malformed_resume_id() {
        assert!(matches!(
            parse_resume_id("not-a-uuid"),
            Err(AppError::BadRequest(msg)) if msg == "Invalid custom resume ID"
        ));
    }
}
