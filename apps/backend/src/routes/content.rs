//! Definition, sentence, image and card preview endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/definition
pub async fn definition(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state.workflow.generate_definition(&mut session).await?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/sentence
pub async fn sentence(
    State(state): State<AppState>,
    Json(request): Json<SentenceRequest>,
) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state
        .workflow
        .check_sentence(&mut session, &request.sentence)
        .await?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/image
pub async fn image(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state.workflow.generate_image(&mut session).await?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/image/skip
pub async fn skip_image(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state.workflow.skip_image(&mut session)?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// GET /api/card
pub async fn card(State(state): State<AppState>) -> Result<Json<CardArtifact>> {
    let session = state.session.lock().await;
    Ok(Json(state.workflow.preview(&session)?))
}
