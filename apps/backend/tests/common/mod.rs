//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wiring the router to in-memory collaborators
//! - Scripted oracle answers keyed by word (see `fixtures`)
//! - Switches to make individual collaborators fail
//!
//! No network access is needed: every collaborator is a mock.

#![allow(dead_code)]

pub mod fixtures;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use forge_core::{
    CardArtifact, CollaboratorError, Collaborators, DefinitionGenerator, DefinitionRequest,
    ExportReceipt, ExportTarget, GrammarCheck, GrammarChecker, ImageProvider, Language,
    LanguageOracle, MediaKind, MediaRef, PronunciationProvider, Workflow,
};

use card_forge_backend::config::Config;
use card_forge_backend::{build_router, AppState};

/// Which fact a prompt asks for, recognized by its response labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    TypeGender,
    Plural,
    Conjugation,
}

impl FactKind {
    fn of(prompt: &str) -> Option<Self> {
        if prompt.contains("AI_TYPE:") {
            Some(Self::TypeGender)
        } else if prompt.contains("OVERALL:") {
            Some(Self::Conjugation)
        } else if prompt.contains("STATUS:") {
            Some(Self::Plural)
        } else {
            None
        }
    }
}

/// Oracle answering from fixture text keyed by fact kind and word.
#[derive(Default)]
pub struct MockOracle {
    answers: HashMap<(FactKind, &'static str), &'static str>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockOracle {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl LanguageOracle for MockOracle {
    async fn resolve(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Status {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }
        let kind = FactKind::of(prompt)
            .ok_or_else(|| CollaboratorError::InvalidResponse("unexpected prompt".into()))?;
        self.answers
            .iter()
            .find(|((k, word), _)| *k == kind && prompt.contains(&format!("{}\"", word)))
            .map(|(_, answer)| answer.to_string())
            .ok_or_else(|| CollaboratorError::InvalidResponse("no scripted answer".into()))
    }
}

pub struct MockDefinitions;

#[async_trait]
impl DefinitionGenerator for MockDefinitions {
    async fn define(&self, request: &DefinitionRequest) -> Result<String, CollaboratorError> {
        Ok(fixtures::definition(&request.word))
    }
}

pub struct MockGrammar;

#[async_trait]
impl GrammarChecker for MockGrammar {
    async fn check(
        &self,
        sentence: &str,
        _language: Language,
        _word: &str,
    ) -> Result<GrammarCheck, CollaboratorError> {
        Ok(fixtures::grammar_check(sentence))
    }
}

/// Audio and image provider writing small files into the media dir.
pub struct MockMedia {
    dir: PathBuf,
    failing: AtomicBool,
}

impl MockMedia {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn media(&self, kind: MediaKind, file: String) -> Result<MediaRef, CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Transport("connection reset".into()));
        }
        let path = self.dir.join(file);
        std::fs::create_dir_all(&self.dir).unwrap();
        std::fs::write(&path, b"media").unwrap();
        Ok(MediaRef::new(kind, path))
    }
}

#[async_trait]
impl PronunciationProvider for MockMedia {
    async fn fetch(
        &self,
        word: &str,
        _language: Language,
        _fallback_text: Option<&str>,
    ) -> Result<MediaRef, CollaboratorError> {
        self.media(MediaKind::Audio, format!("{}.mp3", word))
    }
}

#[async_trait]
impl ImageProvider for MockMedia {
    async fn generate(
        &self,
        _sentence: &str,
        _language: Language,
        word: &str,
    ) -> Result<MediaRef, CollaboratorError> {
        self.media(MediaKind::Image, format!("{}.png", word))
    }
}

/// Export target recording uploaded cards.
#[derive(Default)]
pub struct MockExport {
    uploads: Mutex<Vec<(CardArtifact, String)>>,
    failing: AtomicBool,
}

impl MockExport {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<(CardArtifact, String)> {
        self.uploads.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Transport(
                "could not reach AnkiConnect".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ExportTarget for MockExport {
    async fn upload(
        &self,
        artifact: &CardArtifact,
        deck: &str,
    ) -> Result<ExportReceipt, CollaboratorError> {
        self.check()?;
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((artifact.clone(), deck.to_string()));
        Ok(ExportReceipt {
            id: format!("{}", 1_700_000_000_000i64 + uploads.len() as i64),
            deck: deck.to_string(),
        })
    }

    async fn deck_names(&self) -> Result<Vec<String>, CollaboratorError> {
        self.check()?;
        Ok(vec!["Default".to_string(), "Deutsch".to_string()])
    }

    async fn check_connection(&self) -> Result<String, CollaboratorError> {
        self.check()?;
        Ok("6".to_string())
    }
}

/// Test context: router plus handles on the mock collaborators.
pub struct TestContext {
    pub oracle: Arc<MockOracle>,
    pub pronunciation: Arc<MockMedia>,
    pub images: Arc<MockMedia>,
    pub export: Arc<MockExport>,
    pub media_dir: PathBuf,
    app: Router,
}

impl TestContext {
    /// Create a new test context with every fixture word scripted.
    pub fn new() -> Self {
        let oracle = Arc::new(MockOracle {
            answers: fixtures::oracle_answers(),
            ..MockOracle::default()
        });
        static CONTEXTS: AtomicUsize = AtomicUsize::new(0);
        let media_dir = std::env::temp_dir().join(format!(
            "card-forge-tests-{}-{}",
            std::process::id(),
            CONTEXTS.fetch_add(1, Ordering::SeqCst)
        ));
        let pronunciation = Arc::new(MockMedia::new(media_dir.clone()));
        let images = Arc::new(MockMedia::new(media_dir.clone()));
        let export = Arc::new(MockExport::default());

        let collaborators = Collaborators {
            oracle: oracle.clone(),
            definitions: Arc::new(MockDefinitions),
            grammar: Arc::new(MockGrammar),
            pronunciation: pronunciation.clone(),
            images: images.clone(),
            export: export.clone(),
        };
        let config = Config::from_lookup(|key| match key {
            "ANKI_DECK" => Some("Deutsch".to_string()),
            "MEDIA_DIR" => Some(media_dir.display().to_string()),
            _ => None,
        })
        .expect("test config");

        let state = AppState::new(Workflow::new(collaborators), config);
        let app = build_router(state);

        Self {
            oracle,
            pronunciation,
            images,
            export,
            media_dir,
            app,
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("test server")
    }

    /// Names of the files currently in the media dir.
    pub fn media_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.media_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_dir);
    }
}

/// Drive a session through the word and type/gender gates.
pub async fn validated_word(server: &TestServer, word: serde_json::Value) -> serde_json::Value {
    server.post("/api/word").json(&word).await.assert_status_ok();
    let response = server.post("/api/word/check").await;
    response.assert_status_ok();
    response.json()
}

/// Drive a noun session to `sentence_checked`.
pub async fn sentence_checked(server: &TestServer, sentence: &str) {
    validated_word(server, fixtures::hund()).await;
    server
        .post("/api/metadata/plural")
        .json(&serde_json::json!({ "plural": "Hunde" }))
        .await
        .assert_status_ok();
    server.post("/api/definition").await.assert_status_ok();
    server
        .post("/api/sentence")
        .json(&serde_json::json!({ "sentence": sentence }))
        .await
        .assert_status_ok();
}
