//! Core card-creation library used by the backend.
//!
//! Provides:
//! - Labeled-field parser for oracle responses
//! - Fact resolution (type/gender, plural, conjugation) with grammar rules applied
//! - Claim validation with tri-state verdicts and near-miss feedback
//! - The gated card-creation workflow and card compiler
//! - Collaborator traits for the oracle, media providers and export target

pub mod collaborators;
pub mod compiler;
pub mod error;
pub mod matching;
pub mod parser;
pub mod resolver;
pub mod types;
pub mod validator;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use collaborators::{
    Collaborators, DefinitionGenerator, DefinitionRequest, ExportReceipt, ExportTarget,
    GrammarChecker, ImageProvider, LanguageOracle, PronunciationProvider,
};
pub use compiler::{CardArtifact, CardCompiler, ContentBlock, ConjugationRow};
pub use error::{CollaboratorError, ParseError, ResolutionFailure, Result, WorkflowError};
pub use matching::{
    compare_forms, levenshtein_distance, normalized_similarity, word_diff, DiffSegment, DiffType,
    FormComparison,
};
pub use resolver::FactResolver;
pub use types::{
    Article, ConjugationEntry, ConjugationFact, GrammarCheck, Language, MediaKind, MediaRef,
    PluralFact, PluralStatus, PronounCheck, TypeGenderFact, ValidationVerdict, Verdict,
    WordCategory, WordEntry, WordType,
};
pub use validator::{ClaimValidator, ConjugationVerdict, GenderVerdict, PluralVerdict, TypeVerdict};
pub use workflow::{MetadataCheck, SentenceResult, Stage, TypeGenderCheck, Workflow, WorkflowState};
