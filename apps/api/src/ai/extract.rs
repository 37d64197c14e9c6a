//! Resume import: a PDF goes in, structured sections come out for review,
//! and the reviewed sections are saved in one transaction.

use anyhow::Context;
use axum::{extract::Multipart, extract::State, Json};
use resume_domain::ai::{
    AiAction, ExtractResumeResponse, SaveExtractedRequest, SaveExtractedResponse,
};
use resume_domain::billing::cost;
use resume_domain::{escape_reserved, review, Element, ExtractedResumeData, Record};
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::usage::{charge, Charge};
use crate::auth::AuthUser;
use crate::credits;
use crate::elements::store;
use crate::errors::{AppError, AppJson};
use crate::llm_client::{complete_json, prompts, CompletionRequest};
use crate::state::AppState;
use crate::storage::upload_key;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const EXTRACT_MAX_TOKENS: u32 = 4096;
/// Resume text beyond this is cut before prompting.
const MAX_PROMPT_CHARS: usize = 30_000;

fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

async fn read_pdf_field(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::BadRequest("File must be at most 10 MB".into()));
        }
        if !is_pdf(&bytes) {
            return Err(AppError::BadRequest("Only PDF files are supported".into()));
        }
        return Ok(bytes.to_vec());
    }
    Err(AppError::BadRequest("Missing 'file' field".into()))
}

/// PDF text extraction is synchronous and can be slow on large files.
async fn pdf_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .context("pdf extraction task panicked")?
        .map_err(|e| AppError::BadRequest(format!("Could not read PDF: {e}")))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::BadRequest(
            "Could not extract any text from the PDF".into(),
        ));
    }
    Ok(text)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// POST /api/ai/extract-resume (multipart, field `file`)
pub async fn extract_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<Json<ExtractResumeResponse>, AppError> {
    let pdf = read_pdf_field(multipart).await?;
    credits::ensure(&state.db, user.id, cost::EXTRACT_RESUME).await?;

    let text = pdf_text(pdf.clone()).await?;
    let prompt = prompts::extract_resume(truncate_chars(&text, MAX_PROMPT_CHARS));
    let (extracted_data, tokens_used): (ExtractedResumeData, i64) = complete_json(
        state.llm.as_ref(),
        CompletionRequest {
            system: prompts::JSON_ONLY_SYSTEM,
            prompt: &prompt,
            max_tokens: EXTRACT_MAX_TOKENS,
            temperature: 0.1,
        },
    )
    .await?;

    let extraction_id = Uuid::new_v4();
    let key = upload_key(user.id, extraction_id);
    let resume_url = state.storage.put(&key, pdf, "application/pdf").await?;
    let stored_data =
        serde_json::to_value(&extracted_data).context("extracted data does not serialize")?;
    sqlx::query(
        r#"
        INSERT INTO uploaded_resumes (id, user_id, pdf_url, s3_key, extracted_data, tokens_used)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(extraction_id)
    .bind(user.id)
    .bind(&resume_url)
    .bind(&key)
    .bind(stored_data)
    .bind(tokens_used)
    .execute(&state.db)
    .await?;

    let credits_remaining = charge(
        &state.db,
        Charge {
            user_id: user.id,
            action: AiAction::ExtractResume,
            section: "resume",
            item_id: Some(extraction_id),
            credits: cost::EXTRACT_RESUME,
            tokens_used,
        },
    )
    .await?;

    Ok(Json(ExtractResumeResponse {
        extracted_data,
        extraction_id,
        resume_url,
        tokens_used,
        credits_remaining,
    }))
}

async fn insert_all<T: Element>(
    tx: &mut sqlx::PgConnection,
    user_id: Uuid,
    items: &[T],
) -> Result<Vec<Uuid>, AppError> {
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let record: Record<T> = store::insert(&mut *tx, user_id, item).await?;
        ids.push(record.id);
    }
    Ok(ids)
}

/// POST /api/ai/save-extracted
///
/// All sections are saved or none are.
pub async fn save_extracted(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<SaveExtractedRequest>,
) -> Result<Json<SaveExtractedResponse>, AppError> {
    let data = escape_reserved(&req.extracted_data);
    let report = review(&data);
    if !report.is_valid() {
        return Err(report.errors().into());
    }
    if data.is_empty() {
        return Err(AppError::BadRequest("Nothing to save".into()));
    }

    let mut tx = state.db.begin().await?;
    let heading_id = match &data.heading {
        Some(heading) => Some(store::insert(&mut *tx, user.id, heading).await?.id),
        None => None,
    };
    let mut saved = SaveExtractedResponse {
        heading_id,
        experience_ids: insert_all(&mut tx, user.id, &data.experiences).await?,
        project_ids: insert_all(&mut tx, user.id, &data.projects).await?,
        education_ids: insert_all(&mut tx, user.id, &data.education).await?,
        skill_ids: insert_all(&mut tx, user.id, &data.skills).await?,
        certification_ids: insert_all(&mut tx, user.id, &data.certifications).await?,
        award_ids: insert_all(&mut tx, user.id, &data.awards).await?,
        volunteer_ids: insert_all(&mut tx, user.id, &data.volunteer_experiences).await?,
        message: String::new(),
    };

    if let Some(extraction_id) = req.extraction_id {
        let marked = sqlx::query(
            r#"
            UPDATE uploaded_resumes SET saved = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(extraction_id)
        .bind(user.id)
        .execute(&mut *tx)
        .await?;
        if marked.rows_affected() == 0 {
            warn!(%extraction_id, "saved extraction has no upload record");
        }
    }
    tx.commit().await?;

    let total = saved.heading_id.iter().count()
        + saved.experience_ids.len()
        + saved.project_ids.len()
        + saved.education_ids.len()
        + saved.skill_ids.len()
        + saved.certification_ids.len()
        + saved.award_ids.len()
        + saved.volunteer_ids.len();
    info!(user_id = %user.id, total, "extracted resume saved");
    saved.message = format!("Saved {total} resume elements");
    Ok(Json(saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_magic() {
        assert!(is_pdf(b"%PDF-1.7\n..."));
        assert!(!is_pdf(b"PK\x03\x04"));
        assert!(!is_pdf(b""));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
