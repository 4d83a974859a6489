//! Latest configuration revision (`/v1/revision`)

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;
use super::error::{ApiError, blocking};
use crate::Error;

#[derive(Debug, Serialize)]
pub struct RevisionResponse {
    #[serde(rename = "revisionId")]
    pub revision_id: i64,
    #[serde(rename = "revisionDate")]
    pub revision_date: i64,
}

/// Latest committed revision; 404 until the first change is made
async fn latest_revision(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<RevisionResponse>, ApiError> {
    let revisions = state.revisions.clone();

    let revision = blocking(move || revisions.latest())
        .await?
        .ok_or_else(|| Error::NotFound("no revision recorded yet".into()))?;

    Ok(Json(RevisionResponse {
        revision_id: revision.id,
        revision_date: revision.date,
    }))
}

/// Build revision routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(latest_revision))
        .with_state(state)
}
