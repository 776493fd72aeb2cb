//! Scripted collaborators for workflow tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::collaborators::{
    Collaborators, DefinitionGenerator, DefinitionRequest, ExportReceipt, ExportTarget,
    GrammarChecker, ImageProvider, LanguageOracle, PronunciationProvider,
};
use crate::compiler::CardArtifact;
use crate::error::CollaboratorError;
use crate::types::{GrammarCheck, Language, MediaKind, MediaRef};
use crate::workflow::Workflow;

/// Canned oracle answers for one word.
pub(crate) struct Script {
    type_gender: &'static str,
    plural: &'static str,
    conjugation: &'static str,
    oracle_down: bool,
}

impl Script {
    pub fn hund() -> Self {
        Self {
            type_gender: "AI_TYPE: noun\nAI_GENDER: der\nPLURAL_ONLY: NO\nREASON: Masculine noun.",
            plural: "STATUS: HAS_PLURAL\nPLURAL_FORM: Hunde\nPLURAL_ARTICLE: die\nREASON: Adds -e.",
            conjugation: "",
            oracle_down: false,
        }
    }

    pub fn leute() -> Self {
        Self {
            type_gender: "AI_TYPE: noun\nAI_GENDER: die\nPLURAL_ONLY: YES\nREASON: Only used in the plural.",
            plural: "",
            conjugation: "",
            oracle_down: false,
        }
    }

    pub fn gehen() -> Self {
        Self {
            type_gender: "AI_TYPE: verb\nAI_GENDER: none\nPLURAL_ONLY: NO",
            plural: "",
            conjugation: "OVERALL: INCORRECT\n- ich: CORRECT\n- du: CORRECT\n- er: INCORRECT | geht\nEXPLANATION: Third person singular ends in -t.",
            oracle_down: false,
        }
    }

    pub fn schnell() -> Self {
        Self {
            type_gender: "AI_TYPE: adjective\nAI_GENDER: none\nPLURAL_ONLY: NO",
            plural: "",
            conjugation: "",
            oracle_down: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            oracle_down: true,
            ..Self::hund()
        }
    }
}

pub(crate) struct ScriptedOracle {
    script: Script,
    calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl ScriptedOracle {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl LanguageOracle for ScriptedOracle {
    async fn resolve(&self, prompt: &str) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.script.oracle_down || self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CollaboratorError::Transport("oracle unreachable".into()));
        }
        let text = if prompt.contains("AI_TYPE:") {
            self.script.type_gender
        } else if prompt.contains("OVERALL:") {
            self.script.conjugation
        } else if prompt.contains("STATUS:") {
            self.script.plural
        } else {
            ""
        };
        Ok(text.to_string())
    }
}

struct StaticDefinitions;

#[async_trait]
impl DefinitionGenerator for StaticDefinitions {
    async fn define(&self, request: &DefinitionRequest) -> Result<String, CollaboratorError> {
        Ok(format!("Definition of {}.", request.word))
    }
}

/// Flags sentences ending in "bellen." and corrects them.
struct ScriptedGrammar;

#[async_trait]
impl GrammarChecker for ScriptedGrammar {
    async fn check(
        &self,
        sentence: &str,
        _language: Language,
        _word: &str,
    ) -> Result<GrammarCheck, CollaboratorError> {
        Ok(match sentence.strip_suffix("bellen.") {
            Some(head) => GrammarCheck {
                is_correct: false,
                corrected_sentence: Some(format!("{}bellt.", head)),
                explanation: "The verb must agree with the singular subject.".to_string(),
            },
            None => GrammarCheck {
                is_correct: true,
                corrected_sentence: None,
                explanation: String::new(),
            },
        })
    }
}

#[derive(Default)]
pub(crate) struct FlakyMedia {
    failing: AtomicBool,
}

impl FlakyMedia {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn produce(&self, kind: MediaKind, name: String) -> Result<MediaRef, CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(MediaRef::new(kind, format!("/tmp/card-forge/{}", name)))
    }
}

#[async_trait]
impl PronunciationProvider for FlakyMedia {
    async fn fetch(
        &self,
        word: &str,
        _language: Language,
        _fallback_text: Option<&str>,
    ) -> Result<MediaRef, CollaboratorError> {
        self.produce(MediaKind::Audio, format!("{}.mp3", word))
    }
}

#[async_trait]
impl ImageProvider for FlakyMedia {
    async fn generate(
        &self,
        _sentence: &str,
        _language: Language,
        word: &str,
    ) -> Result<MediaRef, CollaboratorError> {
        self.produce(MediaKind::Image, format!("{}_1.png", word))
    }
}

#[derive(Default)]
pub(crate) struct RecordingExport {
    uploads: Mutex<Vec<(CardArtifact, String)>>,
    failing: AtomicBool,
}

impl RecordingExport {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn uploads(&self) -> Vec<(CardArtifact, String)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExportTarget for RecordingExport {
    async fn upload(
        &self,
        artifact: &CardArtifact,
        deck: &str,
    ) -> Result<ExportReceipt, CollaboratorError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Transport("connection refused".into()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((artifact.clone(), deck.to_string()));
        Ok(ExportReceipt {
            id: uploads.len().to_string(),
            deck: deck.to_string(),
        })
    }

    async fn deck_names(&self) -> Result<Vec<String>, CollaboratorError> {
        Ok(vec!["Default".to_string()])
    }

    async fn check_connection(&self) -> Result<String, CollaboratorError> {
        Ok("6".to_string())
    }
}

pub(crate) struct Handles {
    pub oracle: Arc<ScriptedOracle>,
    pub pronunciation: Arc<FlakyMedia>,
    pub images: Arc<FlakyMedia>,
    pub export: Arc<RecordingExport>,
}

pub(crate) fn workflow(script: Script) -> (Workflow, Handles) {
    let handles = Handles {
        oracle: Arc::new(ScriptedOracle {
            script,
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }),
        pronunciation: Arc::new(FlakyMedia::default()),
        images: Arc::new(FlakyMedia::default()),
        export: Arc::new(RecordingExport::default()),
    };
    let collaborators = Collaborators {
        oracle: handles.oracle.clone(),
        definitions: Arc::new(StaticDefinitions),
        grammar: Arc::new(ScriptedGrammar),
        pronunciation: handles.pronunciation.clone(),
        images: handles.images.clone(),
        export: handles.export.clone(),
    };
    (Workflow::new(collaborators), handles)
}
