//! Word entry and type/gender endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::*;
use crate::AppState;

/// POST /api/word
///
/// Enters a new word or replaces the current one.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<SubmitWordRequest>,
) -> Result<Json<SessionResponse>> {
    let entry = request.into_entry()?;
    let mut session = state.session.lock().await;
    state.workflow.submit_word(&mut session, entry)?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// PUT /api/word/type
pub async fn edit_type(
    State(state): State<AppState>,
    Json(request): Json<EditTypeRequest>,
) -> Result<Json<SessionResponse>> {
    let gender = parse_gender(request.gender.as_deref())?;
    let mut session = state.session.lock().await;
    state
        .workflow
        .edit_claimed_type(&mut session, WordType::parse(&request.word_type), gender)?;
    Ok(Json(SessionResponse::from(&*session)))
}

/// POST /api/word/check
///
/// A mismatch is a successful response with the verdicts in the state.
pub async fn check(State(state): State<AppState>) -> Result<Json<SessionResponse>> {
    let mut session = state.session.lock().await;
    state.workflow.check_type_gender(&mut session).await?;
    Ok(Json(SessionResponse::from(&*session)))
}
