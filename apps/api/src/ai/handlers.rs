use axum::{extract::State, Json};
use resume_domain::ai::{
    AiAction, GenerateSubpointsRequest, GenerateSubpointsResponse, RephraseSubpointsRequest,
    RephraseSubpointsResponse, RephraseTitleRequest, RephraseTitleResponse,
};
use resume_domain::billing::cost;

use crate::ai::usage::{charge, Charge};
use crate::auth::AuthUser;
use crate::credits;
use crate::errors::{AppError, AppJson};
use crate::llm_client::{parse_bullets, prompts, CompletionRequest};
use crate::state::AppState;

const WRITING_MAX_TOKENS: u32 = 500;
const WRITING_TEMPERATURE: f32 = 0.7;

fn writing_request(prompt: &str) -> CompletionRequest<'_> {
    CompletionRequest {
        system: prompts::RESUME_WRITER_SYSTEM,
        prompt,
        max_tokens: WRITING_MAX_TOKENS,
        temperature: WRITING_TEMPERATURE,
    }
}

/// Models like to wrap a single line in quotes or prefix it with a label.
fn clean_title(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    let line = line
        .strip_prefix("Rephrased title:")
        .or_else(|| line.strip_prefix("Title:"))
        .unwrap_or(line)
        .trim();
    line.trim_matches(|c| c == '"' || c == '\'' || c == '*')
        .trim()
        .to_string()
}

/// POST /api/ai/generate-subpoints
pub async fn generate_subpoints(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<GenerateSubpointsRequest>,
) -> Result<Json<GenerateSubpointsResponse>, AppError> {
    credits::ensure(&state.db, user.id, cost::REPHRASE).await?;

    let prompt =
        prompts::generate_subpoints(req.section, req.name.as_deref(), req.tech_stack.as_deref());
    let completion = state.llm.complete(writing_request(&prompt)).await?;
    let subpoints = parse_bullets(&completion.text);
    if subpoints.is_empty() {
        return Err(AppError::Llm("no bullet points in reply".into()));
    }

    let credits_remaining = charge(
        &state.db,
        Charge {
            user_id: user.id,
            action: AiAction::GenerateSubpoints,
            section: req.section.as_str(),
            item_id: req.item_id,
            credits: cost::REPHRASE,
            tokens_used: completion.tokens_used,
        },
    )
    .await?;
    Ok(Json(GenerateSubpointsResponse {
        subpoints,
        tokens_used: completion.tokens_used,
        credits_remaining,
    }))
}

/// POST /api/ai/rephrase-title
pub async fn rephrase_title(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<RephraseTitleRequest>,
) -> Result<Json<RephraseTitleResponse>, AppError> {
    let current = req.current_title.trim();
    if current.is_empty() {
        return Err(AppError::BadRequest("current_title must not be empty".into()));
    }
    credits::ensure(&state.db, user.id, cost::REPHRASE).await?;

    let prompt = prompts::rephrase_title(req.section, current);
    let completion = state.llm.complete(writing_request(&prompt)).await?;
    let rephrased_title = clean_title(&completion.text);
    if rephrased_title.is_empty() {
        return Err(AppError::Llm("empty title in reply".into()));
    }

    let credits_remaining = charge(
        &state.db,
        Charge {
            user_id: user.id,
            action: AiAction::RephraseTitle,
            section: req.section.as_str(),
            item_id: req.item_id,
            credits: cost::REPHRASE,
            tokens_used: completion.tokens_used,
        },
    )
    .await?;
    Ok(Json(RephraseTitleResponse {
        rephrased_title,
        tokens_used: completion.tokens_used,
        credits_remaining,
    }))
}

/// POST /api/ai/rephrase-subpoints
pub async fn rephrase_subpoints(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<RephraseSubpointsRequest>,
) -> Result<Json<RephraseSubpointsResponse>, AppError> {
    let subpoints: Vec<String> = req
        .subpoints
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if subpoints.is_empty() {
        return Err(AppError::BadRequest("subpoints must not be empty".into()));
    }
    credits::ensure(&state.db, user.id, cost::REPHRASE).await?;

    let prompt = prompts::rephrase_subpoints(req.section, &subpoints);
    let completion = state.llm.complete(writing_request(&prompt)).await?;
    let rephrased_subpoints = parse_bullets(&completion.text);
    if rephrased_subpoints.is_empty() {
        return Err(AppError::Llm("no bullet points in reply".into()));
    }

    let credits_remaining = charge(
        &state.db,
        Charge {
            user_id: user.id,
            action: AiAction::RephraseSubpoints,
            section: req.section.as_str(),
            item_id: req.item_id,
            credits: cost::REPHRASE,
            tokens_used: completion.tokens_used,
        },
    )
    .await?;
    Ok(Json(RephraseSubpointsResponse {
        rephrased_subpoints,
        tokens_used: completion.tokens_used,
        credits_remaining,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_title_strips_quotes_and_labels() {
        assert_eq!(clean_title("\"Lead Platform Engineer\""), "Lead Platform Engineer");
        assert_eq!(
            clean_title("\nRephrased title: Staff Data Engineer\nextra"),
            "Staff Data Engineer"
        );
        assert_eq!(clean_title("**Architect**"), "Architect");
        assert_eq!(clean_title("   "), "");
    }
}
