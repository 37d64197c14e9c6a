//! Custom resume rows and the element lookups that populate them.

use std::collections::{HashMap, HashSet};

use resume_domain::{CustomResume, ElementKind, ElementSelection, ResumeSections};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::elements::store::{decode_rows, owned_rows};
use crate::errors::AppError;
use crate::models::element::ElementRow;
use crate::models::resume::CustomResumeRow;

pub fn not_found() -> AppError {
    AppError::NotFound("Custom resume not found".into())
}

/// Groups rows by kind, keeping the order of `rows` within each kind.
pub fn group(rows: &[ElementRow]) -> Result<ResumeSections, AppError> {
    Ok(ResumeSections {
        headings: decode_rows(rows)?,
        educations: decode_rows(rows)?,
        experiences: decode_rows(rows)?,
        projects: decode_rows(rows)?,
        skills: decode_rows(rows)?,
        certifications: decode_rows(rows)?,
        awards: decode_rows(rows)?,
        volunteers: decode_rows(rows)?,
    })
}

/// Rows for the selected ids in selection order. Ids whose element is gone
/// or has a different kind are skipped.
fn in_selection_order(selection: &ElementSelection, rows: Vec<ElementRow>) -> Vec<ElementRow> {
    let by_id: HashMap<Uuid, ElementRow> = rows.into_iter().map(|r| (r.id, r)).collect();
    selection
        .iter()
        .filter_map(|(kind, id)| by_id.get(&id).filter(|row| row.kind == kind.as_str()))
        .cloned()
        .collect()
}

fn selected_ids(selection: &ElementSelection) -> Vec<Uuid> {
    selection.iter().map(|(_, id)| id).collect()
}

/// Fills in the referenced records of a stored resume.
pub async fn populate(db: &PgPool, row: CustomResumeRow) -> Result<CustomResume, AppError> {
    let selection = row.selection.0;
    let rows = owned_rows(db, row.user_id, &selected_ids(&selection)).await?;
    let sections = group(&in_selection_order(&selection, rows))?;
    Ok(CustomResume {
        id: row.id,
        user_id: row.user_id,
        name: row.name,
        sections,
        thumbnail_url: row.thumbnail_url,
        pdf_url: row.pdf_url,
        latex_url: row.latex_url,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Selected ids with no owned element of the stated kind.
fn missing(selection: &ElementSelection, rows: &[ElementRow]) -> Vec<(ElementKind, Uuid)> {
    let found: HashSet<(Uuid, &str)> = rows.iter().map(|r| (r.id, r.kind.as_str())).collect();
    selection
        .iter()
        .filter(|(kind, id)| !found.contains(&(*id, kind.as_str())))
        .collect()
}

/// Every referenced id must name an element of the right kind owned by `user_id`.
pub async fn check_references(
    db: &PgPool,
    user_id: Uuid,
    selection: &ElementSelection,
) -> Result<(), AppError> {
    let rows = owned_rows(db, user_id, &selected_ids(selection)).await?;
    let missing = missing(selection, &rows);
    if missing.is_empty() {
        return Ok(());
    }
    let listed: Vec<String> = missing
        .iter()
        .map(|(kind, id)| format!("{kind} {id}"))
        .collect();
    Err(AppError::NotFound(format!(
        "Elements not found: {}",
        listed.join(", ")
    )))
}

pub async fn list(db: &PgPool, user_id: Uuid) -> Result<Vec<CustomResumeRow>, AppError> {
    Ok(sqlx::query_as(
        "SELECT * FROM custom_resumes WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?)
}

pub async fn get(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<CustomResumeRow, AppError> {
    sqlx::query_as("SELECT * FROM custom_resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(not_found)
}

/// Inserts only while the user is below their slot limit; `None` when full.
pub async fn insert_within_limit(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    selection: &ElementSelection,
) -> Result<Option<CustomResumeRow>, AppError> {
    Ok(sqlx::query_as(
        r#"
        INSERT INTO custom_resumes (user_id, name, selection)
        SELECT $1, $2, $3
        WHERE (SELECT COUNT(*) FROM custom_resumes WHERE user_id = $1)
            < (SELECT max_resume FROM users WHERE id = $1)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(Json(selection))
    .fetch_optional(db)
    .await?)
}

pub async fn save(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    name: &str,
    selection: &ElementSelection,
) -> Result<CustomResumeRow, AppError> {
    sqlx::query_as(
        r#"
        UPDATE custom_resumes
        SET name = $3, selection = $4, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(Json(selection))
    .fetch_optional(db)
    .await?
    .ok_or_else(not_found)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM custom_resumes WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn row(kind: &str, data: serde_json::Value) -> ElementRow {
        ElementRow {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            kind: kind.to_string(),
            data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn award(title: &str) -> ElementRow {
        row("award", json!({ "title": title, "date": "2024" }))
    }

    #[test]
    fn test_selection_order_is_kept() {
        let (a, b, c) = (award("a"), award("b"), award("c"));
        let selection = ElementSelection {
            award_ids: vec![c.id, a.id, b.id],
            ..Default::default()
        };
        let ordered = in_selection_order(&selection, vec![a.clone(), b.clone(), c.clone()]);
        let sections = group(&ordered).unwrap();
        let titles: Vec<_> = sections.awards.iter().map(|r| r.data.title.as_str()).collect();
        assert_eq!(titles, ["c", "a", "b"]);
    }

    #[test]
    fn test_stale_and_mismatched_ids_are_skipped() {
        let a = award("a");
        let selection = ElementSelection {
            award_ids: vec![Uuid::new_v4(), a.id],
            skill_ids: vec![a.id],
            ..Default::default()
        };
        let ordered = in_selection_order(&selection, vec![a.clone()]);
        assert_eq!(ordered.len(), 1);
        let sections = group(&ordered).unwrap();
        assert_eq!(sections.awards.len(), 1);
        assert!(sections.skills.is_empty());
    }

    #[test]
    fn test_missing_reports_wrong_kind() {
        let a = award("a");
        let ghost = Uuid::new_v4();
        let selection = ElementSelection {
            award_ids: vec![a.id, ghost],
            project_ids: vec![a.id],
            ..Default::default()
        };
        let missing = missing(&selection, &[a.clone()]);
        assert_eq!(
            missing,
            vec![(ElementKind::Project, a.id), (ElementKind::Award, ghost)]
        );
    }
}
