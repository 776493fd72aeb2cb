//! Export endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// GET /api/decks
pub async fn decks(State(state): State<AppState>) -> Result<Json<DeckListResponse>> {
    let decks = state.workflow.collaborators().export.deck_names().await?;
    Ok(Json(DeckListResponse {
        decks,
        default_deck: state.config.anki.deck.clone(),
    }))
}

/// GET /api/export/status
pub async fn status(State(state): State<AppState>) -> Json<ExportStatusResponse> {
    let response = match state.workflow.collaborators().export.check_connection().await {
        Ok(version) => ExportStatusResponse {
            connected: true,
            version: Some(version),
            error: None,
        },
        Err(err) => ExportStatusResponse {
            connected: false,
            version: None,
            error: Some(err.to_string()),
        },
    };
    Json(response)
}

/// POST /api/export
///
/// On success the session starts over and the card's local media files are
/// deleted; on failure the card stays ready for retry.
pub async fn export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportResponse>> {
    let deck = request
        .deck
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| state.config.anki.deck.clone());

    let mut session = state.session.lock().await;
    let media: Vec<MediaRef> = session
        .artifact()
        .map(|artifact| artifact.media_refs.clone())
        .unwrap_or_default();
    let receipt = state.workflow.export(&mut session, &deck).await?;
    // Anki keeps its own copy once the note is added
    state.media.discard(&media).await;
    Ok(Json(ExportResponse {
        receipt,
        stage: session.stage(),
    }))
}
