use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct PatternRequest {
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct PatternUpdateRequest {
    pub old_template: String,
    pub new_template: String,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/patterns/add", post(add_pattern))
        .route("/patterns/all", get(all_patterns))
        .route("/patterns/table", get(pattern_table))
        .route("/patterns/update", put(update_pattern))
        .route("/patterns/:template", get(get_pattern).delete(delete_pattern))
}

async fn add_pattern(
    State(state): State<AppState>,
    Json(payload): Json<PatternRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let total_patterns = state
        .mutate(
            |lexicon| {
                lexicon.add_pattern(&payload.template)?;
                Ok(lexicon.pattern_index().size())
            },
            |_| true,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("pattern '{}' added", payload.template),
            "total_patterns": total_patterns,
        })),
    ))
}

async fn all_patterns(State(state): State<AppState>) -> Json<Value> {
    let patterns = state.lexicon().await.patterns();
    Json(json!({ "count": patterns.len(), "patterns": patterns }))
}

async fn pattern_table(State(state): State<AppState>) -> Json<Value> {
    let table = state.lexicon().await.pattern_table();
    Json(json!({ "success": true, "table": table }))
}

async fn get_pattern(Path(template): Path<String>, State(state): State<AppState>) -> Json<Value> {
    let exists = state.lexicon().await.contains_pattern(&template);
    Json(json!({ "template": template, "exists": exists }))
}

async fn delete_pattern(
    Path(template): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let total_patterns = state
        .mutate(
            |lexicon| {
                lexicon.remove_pattern(&template)?;
                Ok(lexicon.pattern_index().size())
            },
            |_| true,
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("pattern '{}' deleted", template),
        "total_patterns": total_patterns,
    })))
}

async fn update_pattern(
    State(state): State<AppState>,
    Json(payload): Json<PatternUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let total_patterns = state
        .mutate(
            |lexicon| {
                lexicon.rename_pattern(&payload.old_template, &payload.new_template)?;
                Ok(lexicon.pattern_index().size())
            },
            |_| true,
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!(
            "pattern '{}' renamed to '{}'",
            payload.old_template, payload.new_template
        ),
        "total_patterns": total_patterns,
    })))
}
