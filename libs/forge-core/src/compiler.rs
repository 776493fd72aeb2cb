//! Card assembly from a validated workflow state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};
use crate::types::{Article, MediaKind, MediaRef, PronounCheck};
use crate::workflow::{display_word, MetadataCheck, WorkflowState};

pub const DEFAULT_BASE_TAG: &str = "card-forge";

/// One conjugation line on the card back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationRow {
    pub pronoun: String,
    pub submitted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected: Option<String>,
}

impl ConjugationRow {
    /// "gehe", or "get → geht" when corrected.
    pub fn display(&self) -> String {
        match &self.corrected {
            Some(corrected) => format!("{} → {}", self.submitted, corrected),
            None => self.submitted.clone(),
        }
    }
}

impl From<&PronounCheck> for ConjugationRow {
    fn from(check: &PronounCheck) -> Self {
        Self {
            pronoun: check.pronoun.clone(),
            submitted: check.submitted.clone(),
            corrected: check.corrected_form.clone(),
        }
    }
}

/// Renderable unit of card content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Word {
        text: String,
    },
    Pronunciation {
        file: String,
    },
    Image {
        file: String,
        alt: String,
    },
    Definition {
        text: String,
    },
    Sentence {
        text: String,
    },
    GrammarNote {
        text: String,
    },
    NounInfo {
        gender: Option<Article>,
        /// Plural with article, e.g. "die Hunde".
        plural: Option<String>,
        plural_only: bool,
    },
    Conjugations {
        rows: Vec<ConjugationRow>,
    },
}

/// A compiled card ready for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardArtifact {
    pub front_blocks: Vec<ContentBlock>,
    pub back_blocks: Vec<ContentBlock>,
    pub tags: BTreeSet<String>,
    /// Files the blocks reference, image first.
    pub media_refs: Vec<MediaRef>,
}

impl CardArtifact {
    pub fn media(&self, kind: MediaKind) -> impl Iterator<Item = &MediaRef> {
        self.media_refs.iter().filter(move |m| m.kind == kind)
    }
}

/// Builds a [`CardArtifact`] from a state that has passed every gate.
///
/// Compilation is pure: the same state always compiles to the same card.
#[derive(Debug, Clone)]
pub struct CardCompiler {
    base_tag: String,
}

impl Default for CardCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_TAG)
    }
}

impl CardCompiler {
    pub fn new(base_tag: impl Into<String>) -> Self {
        Self {
            base_tag: base_tag.into(),
        }
    }

    pub fn compile(&self, state: &WorkflowState) -> Result<CardArtifact> {
        let entry = state.entry().ok_or(WorkflowError::Incomplete("word"))?;
        let fact = state
            .type_gender()
            .filter(|check| check.passed())
            .and_then(|check| check.fact())
            .ok_or(WorkflowError::Incomplete("type and gender"))?;
        let metadata = state
            .metadata()
            .filter(|m| m.passed())
            .ok_or(WorkflowError::Incomplete("metadata"))?;
        let definition = state
            .definition()
            .ok_or(WorkflowError::Incomplete("definition"))?;
        let sentence = state
            .sentence()
            .ok_or(WorkflowError::Incomplete("sentence"))?;

        let word = display_word(entry, fact);

        let mut front_blocks = vec![ContentBlock::Word { text: word.clone() }];
        let mut media_refs = Vec::new();
        if let Some(image) = state.image() {
            media_refs.push(image.clone());
        }
        if let Some(audio) = state.pronunciation() {
            front_blocks.push(ContentBlock::Pronunciation {
                file: audio.file_name(),
            });
            media_refs.push(audio.clone());
        }
        if let Some(image) = state.image() {
            front_blocks.push(ContentBlock::Image {
                file: image.file_name(),
                alt: entry.text.clone(),
            });
        }

        let mut back_blocks = vec![
            ContentBlock::Word { text: word },
            ContentBlock::Definition {
                text: definition.to_string(),
            },
            ContentBlock::Sentence {
                text: sentence.final_sentence().to_string(),
            },
        ];
        if !sentence.check.is_correct && !sentence.check.explanation.trim().is_empty() {
            back_blocks.push(ContentBlock::GrammarNote {
                text: sentence.check.explanation.trim().to_string(),
            });
        }
        match metadata {
            MetadataCheck::Noun { verdict, .. } => back_blocks.push(ContentBlock::NounInfo {
                gender: fact.resolved_gender,
                plural: verdict.fact.as_ref().and_then(|p| p.display()),
                plural_only: fact.is_plural_only,
            }),
            MetadataCheck::Verb { verdict, .. } => {
                if let Some(conjugation) = &verdict.fact {
                    back_blocks.push(ContentBlock::Conjugations {
                        rows: conjugation.per_pronoun.iter().map(ConjugationRow::from).collect(),
                    });
                }
            }
            MetadataCheck::NotApplicable => {}
        }

        let tags = [
            self.base_tag.as_str(),
            fact.resolved_type.as_str(),
            entry.language.name(),
        ]
        .into_iter()
        .map(tag)
        .filter(|t| !t.is_empty())
        .collect();

        Ok(CardArtifact {
            front_blocks,
            back_blocks,
            tags,
            media_refs,
        })
    }
}

fn tag(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
