//! Error types for forge-core.

use crate::workflow::Stage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using WorkflowError.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Errors raised while extracting labeled fields from oracle text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing required field {label}")]
    MissingField { label: String },

    #[error("empty response")]
    EmptyResponse,
}

/// A fact could not be resolved from the oracle.
///
/// Carries the reason shown to the learner next to the retry affordance.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("resolution failed: {reason}")]
pub struct ResolutionFailure {
    pub reason: String,
}

impl ResolutionFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<ParseError> for ResolutionFailure {
    fn from(err: ParseError) -> Self {
        Self::new(err.to_string())
    }
}

impl From<CollaboratorError> for ResolutionFailure {
    fn from(err: CollaboratorError) -> Self {
        Self::new(format!("oracle call failed: {}", err))
    }
}

/// Errors reported by external collaborators (oracle, media, export).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service error: {status} - {message}")]
    Status { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Errors returned by workflow transitions.
///
/// None of these are fatal: the session stays resumable after every one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("cannot {action} while in stage {stage}")]
    InvalidTransition { stage: Stage, action: &'static str },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    #[error("collaborator failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("export failed: {0}")]
    Export(CollaboratorError),

    #[error("card is incomplete: missing {0}")]
    Incomplete(&'static str),
}
