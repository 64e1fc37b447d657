use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct RootRequest {
    pub root: String,
}

#[derive(Debug, Deserialize)]
pub struct RootUpdateRequest {
    pub old_root: String,
    pub new_root: String,
}

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/roots/add", post(add_root))
        .route("/roots/upload", post(upload_roots))
        .route("/roots/all", get(all_roots))
        .route("/roots/tree", get(root_tree))
        .route("/roots/search/:root", get(search_root))
        .route("/roots/update", put(update_root))
        .route("/roots/:root", delete(delete_root))
        .route("/roots/:root/words", get(derived_words))
}

async fn add_root(
    State(state): State<AppState>,
    Json(payload): Json<RootRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let total_roots = state
        .mutate(
            |lexicon| {
                lexicon.add_root(&payload.root)?;
                Ok(lexicon.root_index().size())
            },
            |_| true,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": format!("root '{}' added", payload.root),
            "total_roots": total_roots,
        })),
    ))
}

/// Imports a text file with one root per line from the `file` form field.
async fn upload_roots(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut text = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        let contents = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::BadRequest("file must be UTF-8 text".into()))?;
        text = Some(contents);
    }
    let text = text.ok_or_else(|| ApiError::BadRequest("missing 'file' field".into()))?;

    let (report, total_roots) = state
        .mutate(
            |lexicon| {
                let report = lexicon.import_roots(text.trim_start_matches('\u{feff}'));
                Ok((report, lexicon.root_index().size()))
            },
            |(report, _)| report.added > 0,
        )
        .await?;
    info!(added = report.added, skipped = report.skipped, "root file imported");

    Ok(Json(json!({
        "success": true,
        "message": format!("added {} roots", report.added),
        "added_count": report.added,
        "skipped_count": report.skipped,
        "errors": report.errors,
        "total_roots": total_roots,
    })))
}

async fn all_roots(State(state): State<AppState>) -> Json<Value> {
    let roots = state.lexicon().await.roots();
    Json(json!({ "count": roots.len(), "roots": roots }))
}

async fn root_tree(State(state): State<AppState>) -> Json<Value> {
    let lexicon = state.lexicon().await;
    Json(json!({
        "success": true,
        "tree": lexicon.root_tree(),
        "height": lexicon.root_index().height(),
        "count": lexicon.root_index().size(),
    }))
}

async fn search_root(Path(root): Path<String>, State(state): State<AppState>) -> Json<Value> {
    let exists = state.lexicon().await.contains_root(&root);
    Json(json!({ "root": root, "exists": exists }))
}

async fn delete_root(
    Path(root): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let (removed_words, total_roots) = state
        .mutate(
            |lexicon| {
                let removed = lexicon.remove_root(&root)?;
                Ok((removed.len(), lexicon.root_index().size()))
            },
            |_| true,
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("root '{}' deleted", root),
        "removed_words": removed_words,
        "total_roots": total_roots,
    })))
}

async fn update_root(
    State(state): State<AppState>,
    Json(payload): Json<RootUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let total_roots = state
        .mutate(
            |lexicon| {
                lexicon.rename_root(&payload.old_root, &payload.new_root)?;
                Ok(lexicon.root_index().size())
            },
            |_| true,
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("root '{}' renamed to '{}'", payload.old_root, payload.new_root),
        "total_roots": total_roots,
    })))
}

async fn derived_words(
    Path(root): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let lexicon = state.lexicon().await;
    let words = lexicon.derived_words(&root)?;
    Ok(Json(json!({
        "success": true,
        "root": root,
        "count": words.len(),
        "derived_words": words,
    })))
}
