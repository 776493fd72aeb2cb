//! Contracts for the external services the workflow drives.
//!
//! Transport lives behind these traits; the core only sees text, typed
//! results and [`CollaboratorError`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::compiler::CardArtifact;
use crate::error::CollaboratorError;
use crate::types::{Article, GrammarCheck, Language, MediaRef, WordType};

/// Language model queried for grammatical facts.
#[async_trait]
pub trait LanguageOracle: Send + Sync {
    /// Send a prompt, receive the raw response text.
    async fn resolve(&self, prompt: &str) -> Result<String, CollaboratorError>;
}

/// What the definition generator needs to know about the word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRequest {
    pub word: String,
    pub language: Language,
    pub word_type: WordType,
    pub gender: Option<Article>,
    /// Plural with article, e.g. "die Hunde".
    pub plural: Option<String>,
}

#[async_trait]
pub trait DefinitionGenerator: Send + Sync {
    async fn define(&self, request: &DefinitionRequest) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait GrammarChecker: Send + Sync {
    async fn check(
        &self,
        sentence: &str,
        language: Language,
        word: &str,
    ) -> Result<GrammarCheck, CollaboratorError>;
}

/// Pronunciation lookup. Best-effort: failures never block the workflow.
#[async_trait]
pub trait PronunciationProvider: Send + Sync {
    /// `fallback_text` is spoken by text-to-speech when no recording exists.
    async fn fetch(
        &self,
        word: &str,
        language: Language,
        fallback_text: Option<&str>,
    ) -> Result<MediaRef, CollaboratorError>;
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate an illustration for the example sentence.
    async fn generate(
        &self,
        sentence: &str,
        language: Language,
        word: &str,
    ) -> Result<MediaRef, CollaboratorError>;
}

/// Identifier returned by a successful export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReceipt {
    pub id: String,
    pub deck: String,
}

/// Flashcard deck the compiled card is uploaded to.
#[async_trait]
pub trait ExportTarget: Send + Sync {
    async fn upload(
        &self,
        artifact: &CardArtifact,
        deck: &str,
    ) -> Result<ExportReceipt, CollaboratorError>;

    /// Deck names available for upload.
    async fn deck_names(&self) -> Result<Vec<String>, CollaboratorError>;

    /// Check the target is reachable; returns its version string.
    async fn check_connection(&self) -> Result<String, CollaboratorError>;
}

/// The full set of collaborators a workflow runs against.
#[derive(Clone)]
pub struct Collaborators {
    pub oracle: Arc<dyn LanguageOracle>,
    pub definitions: Arc<dyn DefinitionGenerator>,
    pub grammar: Arc<dyn GrammarChecker>,
    pub pronunciation: Arc<dyn PronunciationProvider>,
    pub images: Arc<dyn ImageProvider>,
    pub export: Arc<dyn ExportTarget>,
}
