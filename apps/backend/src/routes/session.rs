//! Session endpoints

use axum::{extract::State, Json};

use crate::models::*;
use crate::AppState;

/// GET /api/options
pub async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        languages: Language::ALL.iter().copied().map(LanguageOptions::from).collect(),
    })
}

/// GET /api/session
pub async fn get(State(state): State<AppState>) -> Json<SessionResponse> {
    let session = state.session.lock().await;
    Json(SessionResponse::from(&*session))
}

/// POST /api/session/reset
///
/// Drops the card in progress along with its downloaded media.
pub async fn reset(State(state): State<AppState>) -> Json<SessionResponse> {
    let mut session = state.session.lock().await;
    let media: Vec<MediaRef> = session
        .pronunciation()
        .into_iter()
        .chain(session.image())
        .cloned()
        .collect();
    state.workflow.reset(&mut session);
    state.media.discard(&media).await;
    Json(SessionResponse::from(&*session))
}
