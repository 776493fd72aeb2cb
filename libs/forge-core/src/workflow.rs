//! Gated workflow for creating one card.
//!
//! Stages advance strictly in order. Each transition takes the session's
//! [`WorkflowState`] explicitly; a transition that fails leaves the state as
//! it was, apart from recording an `unknown` verdict for the gate that could
//! not be checked. Edits rewind the state and drop everything recorded
//! downstream of the edited field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collaborators::{Collaborators, DefinitionRequest, ExportReceipt};
use crate::compiler::{CardArtifact, CardCompiler};
use crate::error::{ResolutionFailure, Result, WorkflowError};
use crate::matching::{same_form, word_diff, DiffSegment};
use crate::resolver::FactResolver;
use crate::types::{
    Article, ConjugationEntry, GrammarCheck, MediaRef, PluralFact, TypeGenderFact, Verdict,
    WordCategory, WordEntry, WordType,
};
use crate::validator::{ClaimValidator, ConjugationVerdict, GenderVerdict, PluralVerdict, TypeVerdict};

/// Position in the gate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    WordEntered,
    TypeGenderPending,
    TypeGenderValidated,
    MetadataValidated,
    DefinitionReady,
    SentenceChecked,
    ArtifactReady,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WordEntered => "word_entered",
            Self::TypeGenderPending => "type_gender_pending",
            Self::TypeGenderValidated => "type_gender_validated",
            Self::MetadataValidated => "metadata_validated",
            Self::DefinitionReady => "definition_ready",
            Self::SentenceChecked => "sentence_checked",
            Self::ArtifactReady => "artifact_ready",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdicts recorded at the type/gender gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeGenderCheck {
    pub type_verdict: TypeVerdict,
    /// Present only for nouns in a language with grammatical gender.
    pub gender_verdict: Option<GenderVerdict>,
}

impl TypeGenderCheck {
    pub fn fact(&self) -> Option<&TypeGenderFact> {
        self.type_verdict.fact.as_ref()
    }

    pub fn passed(&self) -> bool {
        self.type_verdict.matches_claim.is_match()
            && self
                .gender_verdict
                .as_ref()
                .map_or(true, |g| g.matches_claim.is_match())
    }
}

/// Verdict recorded at the metadata gate, shaped by word category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum MetadataCheck {
    Noun {
        verdict: PluralVerdict,
        acknowledged: bool,
    },
    Verb {
        verdict: ConjugationVerdict,
        acknowledged: bool,
    },
    /// No category-specific metadata to check.
    NotApplicable,
}

impl MetadataCheck {
    /// A match, or a mismatch the learner re-submitted unchanged.
    pub fn passed(&self) -> bool {
        match self {
            Self::Noun {
                verdict,
                acknowledged,
            } => gate_passes(verdict.matches_claim, *acknowledged),
            Self::Verb {
                verdict,
                acknowledged,
            } => gate_passes(verdict.matches_claim, *acknowledged),
            Self::NotApplicable => true,
        }
    }

    pub fn plural_fact(&self) -> Option<&PluralFact> {
        match self {
            Self::Noun { verdict, .. } => verdict.fact.as_ref(),
            _ => None,
        }
    }
}

fn gate_passes(verdict: Verdict, acknowledged: bool) -> bool {
    match verdict {
        Verdict::Matches => true,
        Verdict::Mismatch => acknowledged,
        Verdict::Unknown => false,
    }
}

/// The learner's example sentence and its grammar check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceResult {
    pub original: String,
    pub check: GrammarCheck,
    /// Word diff from the original to the correction, empty when correct.
    pub diff: Vec<DiffSegment>,
}

impl SentenceResult {
    /// The corrected sentence when the check flagged an error, else the original.
    pub fn final_sentence(&self) -> &str {
        match (&self.check.corrected_sentence, self.check.is_correct) {
            (Some(corrected), false) => corrected,
            _ => &self.original,
        }
    }
}

/// Everything accumulated for one in-progress card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowState {
    stage: Stage,
    started_at: DateTime<Utc>,
    entry: Option<WordEntry>,
    type_gender: Option<TypeGenderCheck>,
    metadata: Option<MetadataCheck>,
    definition: Option<String>,
    pronunciation: Option<MediaRef>,
    sentence: Option<SentenceResult>,
    image: Option<MediaRef>,
    artifact: Option<CardArtifact>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            stage: Stage::WordEntered,
            started_at: Utc::now(),
            entry: None,
            type_gender: None,
            metadata: None,
            definition: None,
            pronunciation: None,
            sentence: None,
            image: None,
            artifact: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn entry(&self) -> Option<&WordEntry> {
        self.entry.as_ref()
    }

    pub fn type_gender(&self) -> Option<&TypeGenderCheck> {
        self.type_gender.as_ref()
    }

    /// The resolved type/gender fact, if the gate has resolved one.
    pub fn type_gender_fact(&self) -> Option<&TypeGenderFact> {
        self.type_gender.as_ref().and_then(TypeGenderCheck::fact)
    }

    pub fn metadata(&self) -> Option<&MetadataCheck> {
        self.metadata.as_ref()
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn pronunciation(&self) -> Option<&MediaRef> {
        self.pronunciation.as_ref()
    }

    pub fn sentence(&self) -> Option<&SentenceResult> {
        self.sentence.as_ref()
    }

    pub fn image(&self) -> Option<&MediaRef> {
        self.image.as_ref()
    }

    pub fn artifact(&self) -> Option<&CardArtifact> {
        self.artifact.as_ref()
    }

    /// Category of the validated word type.
    pub fn category(&self) -> Option<WordCategory> {
        self.type_gender_fact().map(|f| f.resolved_type.category())
    }

    /// Drop everything recorded for the gates from `to` onwards and move back to `to`.
    fn rewind(&mut self, to: Stage) {
        if to <= Stage::SentenceChecked {
            self.image = None;
            self.artifact = None;
        }
        if to <= Stage::DefinitionReady {
            self.sentence = None;
        }
        if to <= Stage::MetadataValidated {
            self.definition = None;
            self.pronunciation = None;
        }
        if to <= Stage::TypeGenderValidated {
            self.metadata = None;
        }
        if to <= Stage::TypeGenderPending {
            self.type_gender = None;
        }
        if to <= Stage::WordEntered {
            self.entry = None;
        }
        self.stage = to;
    }

    fn advance(&mut self, to: Stage) {
        tracing::info!(from = %self.stage, to = %to, "workflow advanced");
        self.stage = to;
    }

    fn require(&self, min: Stage, action: &'static str) -> Result<()> {
        if self.stage < min {
            return Err(WorkflowError::InvalidTransition {
                stage: self.stage,
                action,
            });
        }
        Ok(())
    }

    fn require_entry(&self, action: &'static str) -> Result<&WordEntry> {
        self.entry.as_ref().ok_or(WorkflowError::InvalidTransition {
            stage: self.stage,
            action,
        })
    }

    fn require_fact(&self, action: &'static str) -> Result<&TypeGenderFact> {
        match self.type_gender_fact() {
            Some(fact) if self.stage >= Stage::TypeGenderValidated => Ok(fact),
            _ => Err(WorkflowError::InvalidTransition {
                stage: self.stage,
                action,
            }),
        }
    }
}

/// Drives a [`WorkflowState`] through its gates using the collaborators.
pub struct Workflow {
    collaborators: Collaborators,
    validator: ClaimValidator,
    compiler: CardCompiler,
}

impl Workflow {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            validator: ClaimValidator::default(),
            compiler: CardCompiler::default(),
        }
    }

    pub fn with_validator(mut self, validator: ClaimValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_compiler(mut self, compiler: CardCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Start a session at `WordEntered`.
    pub fn start(&self) -> WorkflowState {
        WorkflowState::new()
    }

    /// Discard the in-progress card.
    pub fn reset(&self, state: &mut WorkflowState) {
        tracing::info!(stage = %state.stage, "workflow reset");
        *state = WorkflowState::new();
    }

    /// Enter the word and claims, or replace them. Drops everything recorded so far.
    pub fn submit_word(&self, state: &mut WorkflowState, entry: WordEntry) -> Result<Stage> {
        let entry = normalize_entry(entry)?;
        tracing::info!(word = %entry.text, claimed_type = %entry.claimed_type, "word submitted");

        state.rewind(Stage::WordEntered);
        state.entry = Some(entry);
        state.advance(Stage::TypeGenderPending);
        Ok(state.stage)
    }

    /// Change the claimed type and gender of the current word.
    ///
    /// Plural and conjugation verdicts depended on the old claim and are dropped.
    pub fn edit_claimed_type(
        &self,
        state: &mut WorkflowState,
        claimed_type: WordType,
        claimed_gender: Option<Article>,
    ) -> Result<Stage> {
        let current = state.require_entry("edit the word type")?;
        let entry = normalize_entry(WordEntry {
            text: current.text.clone(),
            language: current.language,
            claimed_type,
            claimed_gender,
        })?;

        state.rewind(Stage::TypeGenderPending);
        state.entry = Some(entry);
        Ok(state.stage)
    }

    /// Resolve type and gender and compare them with the claim.
    ///
    /// A mismatch keeps the state at `TypeGenderPending` with the corrected
    /// fact recorded. A resolution failure records an unknown verdict and
    /// returns the failure.
    pub async fn check_type_gender(&self, state: &mut WorkflowState) -> Result<Stage> {
        if state.stage != Stage::TypeGenderPending {
            return Err(WorkflowError::InvalidTransition {
                stage: state.stage,
                action: "check type and gender",
            });
        }
        let entry = state.require_entry("check type and gender")?.clone();

        let resolver = FactResolver::new(self.collaborators.oracle.as_ref());
        let fact = resolver.type_gender(&entry).await;

        let check = TypeGenderCheck {
            type_verdict: self
                .validator
                .validate_type(&entry.claimed_type, fact.as_ref()),
            gender_verdict: self.validator.validate_gender(
                entry.claimed_gender,
                entry.language,
                fact.as_ref(),
            ),
        };
        let passed = check.passed();
        state.type_gender = Some(check);

        if let Err(failure) = fact {
            return Err(failure.into());
        }
        if !passed {
            tracing::info!(word = %entry.text, "type/gender claim rejected");
            return Ok(state.stage);
        }

        state.advance(Stage::TypeGenderValidated);

        let needs_metadata = match state.category() {
            Some(WordCategory::Noun) => true,
            Some(WordCategory::Verb) => entry.language.conjugation_pattern().is_some(),
            _ => false,
        };
        if !needs_metadata {
            state.metadata = Some(MetadataCheck::NotApplicable);
            state.advance(Stage::MetadataValidated);
        }

        Ok(state.stage)
    }

    /// Check the learner's plural for a noun.
    ///
    /// Re-submitting the same plural after a mismatch acknowledges the
    /// correction and advances.
    pub async fn submit_plural(
        &self,
        state: &mut WorkflowState,
        plural: Option<&str>,
    ) -> Result<Stage> {
        let action = "submit a plural";
        let fact = state.require_fact(action)?.clone();
        if fact.resolved_type.category() != WordCategory::Noun {
            return Err(WorkflowError::InvalidInput(format!(
                "a plural only applies to nouns, not to a {}",
                fact.resolved_type
            )));
        }
        let claim = plural.map(str::trim).filter(|p| !p.is_empty());

        if state.stage == Stage::TypeGenderValidated {
            if let Some(MetadataCheck::Noun {
                verdict,
                acknowledged,
            }) = state.metadata.as_mut()
            {
                let unchanged = match (&verdict.claim, claim) {
                    (Some(previous), Some(current)) => same_form(previous, current),
                    (None, None) => true,
                    _ => false,
                };
                if verdict.matches_claim == Verdict::Mismatch && unchanged {
                    *acknowledged = true;
                    tracing::info!("plural mismatch acknowledged");
                    state.advance(Stage::MetadataValidated);
                    return Ok(state.stage);
                }
            }
        }

        let entry = state.require_entry(action)?.clone();
        let resolved = if fact.is_plural_only {
            Ok(PluralFact::plural_only(format!(
                "{} only exists in the plural.",
                entry.text
            )))
        } else {
            FactResolver::new(self.collaborators.oracle.as_ref())
                .plural(&entry, fact.resolved_gender)
                .await
        };
        let verdict = self.validator.validate_plural(claim, resolved.as_ref());

        self.record_metadata(
            state,
            MetadataCheck::Noun {
                verdict,
                acknowledged: false,
            },
            resolved.err(),
        )
    }

    /// Check the learner's conjugated forms for a verb.
    ///
    /// Re-submitting the same forms after a mismatch acknowledges the
    /// corrections and advances.
    pub async fn submit_conjugations(
        &self,
        state: &mut WorkflowState,
        forms: Vec<ConjugationEntry>,
    ) -> Result<Stage> {
        let action = "submit conjugations";
        let fact = state.require_fact(action)?.clone();
        let entry = state.require_entry(action)?.clone();
        if fact.resolved_type.category() != WordCategory::Verb
            || entry.language.conjugation_pattern().is_none()
        {
            return Err(WorkflowError::InvalidInput(format!(
                "conjugations do not apply to a {} in {}",
                fact.resolved_type, entry.language
            )));
        }
        let forms = normalize_conjugations(forms)?;

        if state.stage == Stage::TypeGenderValidated {
            if let Some(MetadataCheck::Verb {
                verdict,
                acknowledged,
            }) = state.metadata.as_mut()
            {
                let unchanged = verdict.claim.len() == forms.len()
                    && verdict.claim.iter().zip(&forms).all(|(a, b)| {
                        same_form(&a.pronoun, &b.pronoun) && same_form(&a.form, &b.form)
                    });
                if verdict.matches_claim == Verdict::Mismatch && unchanged {
                    *acknowledged = true;
                    tracing::info!("conjugation mismatch acknowledged");
                    state.advance(Stage::MetadataValidated);
                    return Ok(state.stage);
                }
            }
        }

        let resolved = FactResolver::new(self.collaborators.oracle.as_ref())
            .conjugation(&entry, &forms)
            .await;
        let verdict = self.validator.validate_conjugation(&forms, resolved.as_ref());

        self.record_metadata(
            state,
            MetadataCheck::Verb {
                verdict,
                acknowledged: false,
            },
            resolved.err(),
        )
    }

    fn record_metadata(
        &self,
        state: &mut WorkflowState,
        check: MetadataCheck,
        failure: Option<ResolutionFailure>,
    ) -> Result<Stage> {
        if let Some(failure) = failure {
            // Later stages keep their work; only the open gate records the unknown verdict
            if state.stage == Stage::TypeGenderValidated {
                state.metadata = Some(check);
            }
            return Err(failure.into());
        }

        let passed = check.passed();
        state.rewind(Stage::TypeGenderValidated);
        state.metadata = Some(check);
        if passed {
            state.advance(Stage::MetadataValidated);
        }
        Ok(state.stage)
    }

    /// Generate the definition and fetch a pronunciation (best-effort).
    pub async fn generate_definition(&self, state: &mut WorkflowState) -> Result<Stage> {
        state.require(Stage::MetadataValidated, "generate a definition")?;
        let entry = state.require_entry("generate a definition")?.clone();
        let fact = state.require_fact("generate a definition")?;

        let request = DefinitionRequest {
            word: entry.text.clone(),
            language: entry.language,
            word_type: fact.resolved_type.clone(),
            gender: fact.resolved_gender,
            plural: state
                .metadata
                .as_ref()
                .and_then(MetadataCheck::plural_fact)
                .and_then(PluralFact::display),
        };
        let spoken = display_word(&entry, fact);

        let definition = self.collaborators.definitions.define(&request).await?;

        let pronunciation = match self
            .collaborators
            .pronunciation
            .fetch(&entry.text, entry.language, Some(&spoken))
            .await
        {
            Ok(media) => Some(media),
            Err(err) => {
                tracing::warn!(error = %err, word = %entry.text, "pronunciation unavailable, continuing without");
                None
            }
        };

        state.rewind(Stage::MetadataValidated);
        state.definition = Some(definition.trim().to_string());
        state.pronunciation = pronunciation;
        state.advance(Stage::DefinitionReady);
        Ok(state.stage)
    }

    /// Grammar-check the learner's example sentence.
    ///
    /// An incorrect sentence still advances; the correction is kept for the card.
    pub async fn check_sentence(&self, state: &mut WorkflowState, sentence: &str) -> Result<Stage> {
        state.require(Stage::DefinitionReady, "check a sentence")?;
        let entry = state.require_entry("check a sentence")?.clone();
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "the example sentence is empty".to_string(),
            ));
        }

        let mut check = self
            .collaborators
            .grammar
            .check(sentence, entry.language, &entry.text)
            .await?;

        if check.is_correct {
            check.corrected_sentence = None;
        }
        let diff = match &check.corrected_sentence {
            Some(corrected) if !check.is_correct => word_diff(sentence, corrected),
            _ => Vec::new(),
        };

        state.rewind(Stage::DefinitionReady);
        state.sentence = Some(SentenceResult {
            original: sentence.to_string(),
            check,
            diff,
        });
        state.advance(Stage::SentenceChecked);
        Ok(state.stage)
    }

    /// Generate an illustration for the sentence and compile the card.
    pub async fn generate_image(&self, state: &mut WorkflowState) -> Result<Stage> {
        state.require(Stage::SentenceChecked, "generate an image")?;
        let entry = state.require_entry("generate an image")?.clone();
        let sentence = state
            .sentence
            .as_ref()
            .map(|s| s.final_sentence().to_string())
            .ok_or(WorkflowError::Incomplete("sentence"))?;

        let image = self
            .collaborators
            .images
            .generate(&sentence, entry.language, &entry.text)
            .await?;

        self.finish_artifact(state, Some(image))
    }

    /// Continue without an image and compile the card.
    pub fn skip_image(&self, state: &mut WorkflowState) -> Result<Stage> {
        state.require(Stage::SentenceChecked, "skip the image")?;
        self.finish_artifact(state, None)
    }

    fn finish_artifact(&self, state: &mut WorkflowState, image: Option<MediaRef>) -> Result<Stage> {
        let mut next = state.clone();
        next.rewind(Stage::SentenceChecked);
        next.image = image;
        next.artifact = Some(self.compiler.compile(&next)?);
        next.advance(Stage::ArtifactReady);

        *state = next;
        Ok(state.stage)
    }

    /// Compiled card for the current state.
    pub fn preview(&self, state: &WorkflowState) -> Result<CardArtifact> {
        match &state.artifact {
            Some(artifact) => Ok(artifact.clone()),
            None => self.compiler.compile(state),
        }
    }

    /// Upload the card. Success starts a fresh session; failure changes nothing.
    pub async fn export(&self, state: &mut WorkflowState, deck: &str) -> Result<ExportReceipt> {
        if state.stage != Stage::ArtifactReady {
            return Err(WorkflowError::InvalidTransition {
                stage: state.stage,
                action: "export",
            });
        }
        let deck = deck.trim();
        if deck.is_empty() {
            return Err(WorkflowError::InvalidInput("deck name is empty".to_string()));
        }

        let artifact = self.preview(state)?;
        let receipt = self
            .collaborators
            .export
            .upload(&artifact, deck)
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, deck, "export failed, card kept for retry");
                WorkflowError::Export(err)
            })?;

        tracing::info!(id = %receipt.id, deck = %receipt.deck, "card exported");
        *state = WorkflowState::new();
        Ok(receipt)
    }
}

/// Word as shown on the card: with its article for gendered nouns.
pub(crate) fn display_word(entry: &WordEntry, fact: &TypeGenderFact) -> String {
    match (fact.resolved_type.is_noun(), fact.resolved_gender) {
        (true, Some(article)) => format!("{} {}", article, entry.text),
        _ => entry.text.clone(),
    }
}

fn normalize_entry(entry: WordEntry) -> Result<WordEntry> {
    let text = entry.text.trim().to_string();
    if text.is_empty() {
        return Err(WorkflowError::InvalidInput("the word is empty".to_string()));
    }
    if entry.claimed_type.as_str().is_empty() {
        return Err(WorkflowError::InvalidInput("select a word type".to_string()));
    }

    let needs_gender = entry.claimed_type.is_noun() && entry.language.has_grammatical_gender();
    if needs_gender && entry.claimed_gender.is_none() {
        return Err(WorkflowError::InvalidInput(
            "select an article for the noun".to_string(),
        ));
    }

    Ok(WordEntry {
        text,
        language: entry.language,
        claimed_gender: if needs_gender { entry.claimed_gender } else { None },
        claimed_type: entry.claimed_type,
    })
}

fn normalize_conjugations(forms: Vec<ConjugationEntry>) -> Result<Vec<ConjugationEntry>> {
    if forms.is_empty() {
        return Err(WorkflowError::InvalidInput(
            "enter at least one conjugated form".to_string(),
        ));
    }

    let mut normalized: Vec<ConjugationEntry> = Vec::with_capacity(forms.len());
    for entry in forms {
        let pronoun = entry.pronoun.trim();
        let form = entry.form.trim();
        if pronoun.is_empty() || form.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "every conjugation needs a pronoun and a form".to_string(),
            ));
        }
        if normalized
            .iter()
            .any(|e| e.pronoun.eq_ignore_ascii_case(pronoun))
        {
            return Err(WorkflowError::InvalidInput(format!(
                "pronoun {} submitted twice",
                pronoun
            )));
        }
        normalized.push(ConjugationEntry::new(pronoun, form));
    }
    Ok(normalized)
}
