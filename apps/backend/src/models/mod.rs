//! API request and response types

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// Re-export shared types from forge-core
pub use forge_core::{
    Article, CardArtifact, ConjugationEntry, ExportReceipt, Language, MediaRef, Stage, WordEntry,
    WordType, WorkflowState,
};

// === Options ===

/// Choices offered to the learner for one language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageOptions {
    pub language: Language,
    pub name: &'static str,
    pub word_types: Vec<&'static str>,
    pub articles: Vec<Article>,
    pub plural_article: Article,
    /// Present-tense pronouns; empty when verbs are not conjugated.
    pub pronouns: Vec<&'static str>,
}

impl From<Language> for LanguageOptions {
    fn from(language: Language) -> Self {
        Self {
            language,
            name: language.name(),
            word_types: language.word_types().to_vec(),
            articles: language.articles().to_vec(),
            plural_article: language.plural_article(),
            pronouns: language.conjugation_pattern().unwrap_or_default().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub languages: Vec<LanguageOptions>,
}

// === Session ===

/// Current stage plus everything recorded so far.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub stage: Stage,
    pub state: WorkflowState,
}

impl From<&WorkflowState> for SessionResponse {
    fn from(state: &WorkflowState) -> Self {
        Self {
            stage: state.stage(),
            state: state.clone(),
        }
    }
}

// === Word ===

#[derive(Debug, Deserialize)]
pub struct SubmitWordRequest {
    pub word: String,
    #[serde(default = "default_language")]
    pub language: Language,
    pub word_type: String,
    #[serde(default)]
    pub gender: Option<String>,
}

impl SubmitWordRequest {
    pub fn into_entry(self) -> Result<WordEntry, ApiError> {
        let gender = parse_gender(self.gender.as_deref())?;
        Ok(WordEntry {
            text: self.word,
            language: self.language,
            claimed_type: WordType::parse(&self.word_type),
            claimed_gender: gender,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EditTypeRequest {
    pub word_type: String,
    #[serde(default)]
    pub gender: Option<String>,
}

fn default_language() -> Language {
    Language::German
}

/// Blank means no article; anything outside der/die/das is rejected.
pub fn parse_gender(raw: Option<&str>) -> Result<Option<Article>, ApiError> {
    match raw.map(str::trim).filter(|g| !g.is_empty()) {
        None => Ok(None),
        Some(raw) => Article::parse(raw)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown article {}", raw))),
    }
}

// === Metadata ===

#[derive(Debug, Deserialize)]
pub struct PluralRequest {
    /// Blank or absent for nouns without a separate plural.
    #[serde(default)]
    pub plural: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConjugationsRequest {
    pub conjugations: Vec<ConjugationEntry>,
}

// === Content ===

#[derive(Debug, Deserialize)]
pub struct SentenceRequest {
    pub sentence: String,
}

// === Export ===

#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    /// Falls back to the configured deck.
    #[serde(default)]
    pub deck: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub receipt: ExportReceipt,
    pub stage: Stage,
}

#[derive(Debug, Serialize)]
pub struct DeckListResponse {
    pub decks: Vec<String>,
    pub default_deck: String,
}

#[derive(Debug, Serialize)]
pub struct ExportStatusResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gender() {
        assert_eq!(parse_gender(None).unwrap(), None);
        assert_eq!(parse_gender(Some(" ")).unwrap(), None);
        assert_eq!(parse_gender(Some("Der")).unwrap(), Some(Article::Der));
        assert!(parse_gender(Some("den")).is_err());
    }

    #[test]
    fn test_submit_word_defaults_to_german() {
        let request: SubmitWordRequest =
            serde_json::from_str(r#"{"word": "Hund", "word_type": "Noun", "gender": "der"}"#)
                .unwrap();
        let entry = request.into_entry().unwrap();
        assert_eq!(entry.language, Language::German);
        assert_eq!(entry.claimed_type, WordType::Noun);
        assert_eq!(entry.claimed_gender, Some(Article::Der));
    }

    #[test]
    fn test_language_options() {
        let options = LanguageOptions::from(Language::German);
        assert_eq!(options.articles, vec![Article::Der, Article::Die, Article::Das]);
        assert_eq!(options.pronouns.len(), 6);
        assert!(options.word_types.contains(&"conjunction"));
    }
}
