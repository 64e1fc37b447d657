use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::roots::RootRequest;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub root: String,
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateManyRequest {
    pub root: String,
    pub templates: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub word: String,
    pub root: String,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/generator/generate", post(generate))
        .route("/generator/generate-multiple", post(generate_multiple))
        .route("/generator/derivatives", post(derivatives))
        .route("/validator/validate", post(validate))
}

async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let derivative = state
        .mutate(
            |lexicon| lexicon.generate(&payload.root, &payload.template),
            |derivative| !derivative.generated_word.is_empty(),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "root": payload.root,
        "template": payload.template,
        "word": derivative.generated_word,
        "vocalized": derivative.vocalized,
    })))
}

async fn generate_multiple(
    State(state): State<AppState>,
    Json(payload): Json<GenerateManyRequest>,
) -> Result<Json<Value>, ApiError> {
    let report = state
        .mutate(
            |lexicon| lexicon.generate_many(&payload.root, &payload.templates),
            |report| !report.derivatives.is_empty(),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "root": payload.root,
        "count": report.derivatives.len(),
        "derivatives": report.derivatives,
        "skipped": report.skipped,
    })))
}

async fn derivatives(
    State(state): State<AppState>,
    Json(payload): Json<RootRequest>,
) -> Result<Json<Value>, ApiError> {
    let derivatives = state
        .mutate(
            |lexicon| lexicon.derive_all(&payload.root),
            |derivatives| !derivatives.is_empty(),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "root": payload.root,
        "count": derivatives.len(),
        "derivatives": derivatives,
    })))
}

async fn validate(
    State(state): State<AppState>,
    Json(payload): Json<ValidateRequest>,
) -> Result<Json<Value>, ApiError> {
    let template = state
        .mutate(
            |lexicon| lexicon.validate(&payload.word, &payload.root),
            |template| template.is_some(),
        )
        .await?;
    let is_valid = template.is_some();
    Ok(Json(json!({
        "success": true,
        "word": payload.word,
        "root": payload.root,
        "is_valid": is_valid,
        "template_used": template,
        "message": format!(
            "word '{}' is {} for root '{}'",
            payload.word,
            if is_valid { "valid" } else { "not valid" },
            payload.root
        ),
    })))
}
