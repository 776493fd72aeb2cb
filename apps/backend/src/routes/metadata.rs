//! Plural and conjugation endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/metadata/plural
pub async fn plural(
    State(state): State<AppState>,
    Json(request): Json<PluralRequest>,
) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state
        .workflow
        .submit_plural(&mut session, request.plural.as_deref())
        .await?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/metadata/conjugations
pub async fn conjugations(
    State(state): State<AppState>,
    Json(request): Json<ConjugationsRequest>,
) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state
        .workflow
        .submit_conjugations(&mut session, request.conjugations)
        .await?;
    Ok(Json(SessionResponse::from(&*session)))
}
