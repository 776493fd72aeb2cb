//! Core types for card creation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Target language of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[serde(alias = "German")]
    German,
}

const GERMAN_WORD_TYPES: &[&str] = &[
    "noun",
    "verb",
    "adjective",
    "adverb",
    "preposition",
    "conjunction",
    "pronoun",
];

const GERMAN_PRESENT_PRONOUNS: &[&str] = &["ich", "du", "er/sie/es", "wir", "ihr", "sie/Sie"];

impl Language {
    /// All supported languages.
    pub const ALL: &'static [Language] = &[Language::German];

    /// Display name, e.g. "German".
    pub fn name(&self) -> &'static str {
        match self {
            Self::German => "German",
        }
    }

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::German => "de",
        }
    }

    /// Parse from a display name or code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "german" | "de" | "deutsch" => Some(Self::German),
            _ => None,
        }
    }

    /// Whether nouns carry a grammatical gender (and so a gender claim).
    pub fn has_grammatical_gender(&self) -> bool {
        match self {
            Self::German => true,
        }
    }

    /// Definite articles a learner can choose for a singular noun.
    pub fn articles(&self) -> &'static [Article] {
        match self {
            Self::German => &[Article::Der, Article::Die, Article::Das],
        }
    }

    /// Article used for every plural form.
    pub fn plural_article(&self) -> Article {
        match self {
            Self::German => Article::Die,
        }
    }

    /// Word types offered to the learner.
    pub fn word_types(&self) -> &'static [&'static str] {
        match self {
            Self::German => GERMAN_WORD_TYPES,
        }
    }

    /// Present-tense pronouns, if verbs of this language have a conjugation pattern.
    pub fn conjugation_pattern(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::German => Some(GERMAN_PRESENT_PRONOUNS),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grammatical word type, normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    Other(String),
}

impl WordType {
    pub fn parse(s: &str) -> Self {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "noun" => Self::Noun,
            "verb" => Self::Verb,
            "adjective" => Self::Adjective,
            "adverb" => Self::Adverb,
            "preposition" => Self::Preposition,
            "conjunction" => Self::Conjunction,
            "pronoun" => Self::Pronoun,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Noun => "noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Preposition => "preposition",
            Self::Conjunction => "conjunction",
            Self::Pronoun => "pronoun",
            Self::Other(s) => s,
        }
    }

    /// Category that decides which metadata gate applies.
    pub fn category(&self) -> WordCategory {
        match self {
            Self::Noun => WordCategory::Noun,
            Self::Verb => WordCategory::Verb,
            _ => WordCategory::Other,
        }
    }

    pub fn is_noun(&self) -> bool {
        matches!(self, Self::Noun)
    }
}

impl From<String> for WordType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<WordType> for String {
    fn from(t: WordType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for WordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of categories with distinct metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordCategory {
    Noun,
    Verb,
    Other,
}

/// German definite article, standing in for grammatical gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Article {
    Der,
    Die,
    Das,
}

impl Article {
    /// Parse an article or gender name. Anything outside the closed set is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "der" | "masculine" => Some(Self::Der),
            "die" | "feminine" => Some(Self::Die),
            "das" | "neuter" => Some(Self::Das),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Der => "der",
            Self::Die => "die",
            Self::Das => "das",
        }
    }

    pub fn gender_name(&self) -> &'static str {
        match self {
            Self::Der => "masculine",
            Self::Die => "feminine",
            Self::Das => "neuter",
        }
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The word a learner is building a card for, with their claims about it.
///
/// Replaced as a whole when the learner edits the word or its claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub text: String,
    pub language: Language,
    pub claimed_type: WordType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_gender: Option<Article>,
}

impl WordEntry {
    pub fn new(text: impl Into<String>, language: Language, claimed_type: WordType) -> Self {
        Self {
            text: text.into(),
            language,
            claimed_type,
            claimed_gender: None,
        }
    }

    pub fn with_gender(mut self, gender: Article) -> Self {
        self.claimed_gender = Some(gender);
        self
    }
}

/// One learner-entered conjugated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationEntry {
    pub pronoun: String,
    pub form: String,
}

impl ConjugationEntry {
    pub fn new(pronoun: impl Into<String>, form: impl Into<String>) -> Self {
        Self {
            pronoun: pronoun.into(),
            form: form.into(),
        }
    }
}

/// Plurality of a noun. Form and article exist only when a plural exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluralStatus {
    HasPlural { form: String, article: Article },
    NoPlural,
    AlreadyPlural,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluralFact {
    pub status: PluralStatus,
    pub rationale: String,
}

impl PluralFact {
    /// Fact for a noun that only exists in the plural.
    pub fn plural_only(rationale: impl Into<String>) -> Self {
        Self {
            status: PluralStatus::AlreadyPlural,
            rationale: rationale.into(),
        }
    }

    pub fn form(&self) -> Option<&str> {
        match &self.status {
            PluralStatus::HasPlural { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Plural with its article, e.g. "die Hunde".
    pub fn display(&self) -> Option<String> {
        match &self.status {
            PluralStatus::HasPlural { form, article } => Some(format!("{} {}", article, form)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeGenderFact {
    pub resolved_type: WordType,
    pub resolved_gender: Option<Article>,
    pub is_plural_only: bool,
    pub rationale: String,
}

/// Oracle feedback for one submitted pronoun.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronounCheck {
    pub pronoun: String,
    pub submitted: String,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_form: Option<String>,
    /// False when the oracle gave no feedback line for this pronoun.
    pub verified: bool,
}

impl PronounCheck {
    /// Fail-closed entry for a pronoun the oracle did not address.
    pub fn unverified(pronoun: impl Into<String>, submitted: impl Into<String>) -> Self {
        Self {
            pronoun: pronoun.into(),
            submitted: submitted.into(),
            correct: false,
            corrected_form: None,
            verified: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationFact {
    pub overall_correct: bool,
    /// One entry per submitted pronoun, in submission order.
    pub per_pronoun: Vec<PronounCheck>,
    pub rationale: String,
}

impl ConjugationFact {
    pub fn get(&self, pronoun: &str) -> Option<&PronounCheck> {
        self.per_pronoun
            .iter()
            .find(|c| c.pronoun.trim().eq_ignore_ascii_case(pronoun.trim()))
    }

    pub fn has_corrections(&self) -> bool {
        self.per_pronoun.iter().any(|c| c.corrected_form.is_some())
    }
}

/// Tri-state outcome of comparing a claim to a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Matches,
    Mismatch,
    /// The fact could not be resolved. Never treated as a match.
    Unknown,
}

impl Verdict {
    pub fn from_bool(matches: bool) -> Self {
        if matches {
            Self::Matches
        } else {
            Self::Mismatch
        }
    }

    pub fn is_match(self) -> bool {
        self == Self::Matches
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict<F, C> {
    pub matches_claim: Verdict,
    /// `None` exactly when the verdict is unknown.
    pub fact: Option<F>,
    pub claim: C,
    /// Human-readable detail for the learner.
    pub feedback: String,
}

/// Grammar-check result for an example sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarCheck {
    pub is_correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_sentence: Option<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Image,
}

/// A media file attached to a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl MediaRef {
    pub fn new(kind: MediaKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// File name as referenced from card content.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
