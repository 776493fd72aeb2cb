//! Resolution of oracle responses into typed linguistic facts.
//!
//! Each fact kind lives in its own module with three pieces: the response
//! schema, the prompt that asks for it, and `interpret`, which applies the
//! grammar rules the oracle cannot be trusted with. `interpret` never invents
//! a fact: missing or unrecognized required values are a [`ResolutionFailure`].

pub mod conjugation;
pub mod plural;
pub mod type_gender;

use crate::collaborators::LanguageOracle;
use crate::error::ResolutionFailure;
use crate::types::{Article, ConjugationEntry, ConjugationFact, PluralFact, TypeGenderFact, WordEntry};

/// Resolves facts for one word by querying the oracle.
pub struct FactResolver<'a> {
    oracle: &'a dyn LanguageOracle,
}

impl<'a> FactResolver<'a> {
    pub fn new(oracle: &'a dyn LanguageOracle) -> Self {
        Self { oracle }
    }

    /// Resolve word type, gender and plural-only status.
    #[tracing::instrument(skip(self, entry), fields(word = %entry.text))]
    pub async fn type_gender(&self, entry: &WordEntry) -> Result<TypeGenderFact, ResolutionFailure> {
        let text = self.ask(&type_gender::prompt(entry)).await?;
        type_gender::interpret(&text, entry.language)
    }

    /// Resolve whether and how the noun forms a plural.
    #[tracing::instrument(skip(self, entry), fields(word = %entry.text))]
    pub async fn plural(
        &self,
        entry: &WordEntry,
        gender: Option<Article>,
    ) -> Result<PluralFact, ResolutionFailure> {
        let text = self.ask(&plural::prompt(entry, gender)).await?;
        plural::interpret(&text, entry.language)
    }

    /// Check the learner's conjugated forms, one verdict per submitted pronoun.
    #[tracing::instrument(skip(self, entry, submitted), fields(word = %entry.text))]
    pub async fn conjugation(
        &self,
        entry: &WordEntry,
        submitted: &[ConjugationEntry],
    ) -> Result<ConjugationFact, ResolutionFailure> {
        let text = self.ask(&conjugation::prompt(entry, submitted)).await?;
        conjugation::interpret(&text, submitted)
    }

    async fn ask(&self, prompt: &str) -> Result<String, ResolutionFailure> {
        self.oracle.resolve(prompt).await.map_err(|err| {
            tracing::warn!(error = %err, "oracle call failed");
            ResolutionFailure::from(err)
        })
    }
}

/// Values the oracle uses to say "nothing here".
pub(crate) fn is_none_marker(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "" | "none" | "n/a" | "na" | "-" | "null" | "keine" | "no gender"
    )
}

/// Trim whitespace, trailing periods and markdown emphasis or code ticks.
pub(crate) fn strip_decoration(value: &str) -> &str {
    value
        .trim()
        .trim_matches(|c: char| c == '.' || c == '*' || c == '`')
        .trim()
}

/// Normalize an enum-like value: upper case, spaces and dashes to underscores.
pub(crate) fn normalize_token(value: &str) -> String {
    strip_decoration(value)
        .to_uppercase()
        .replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;
    use crate::types::{Language, WordType};
    use async_trait::async_trait;

    struct FixedOracle(Result<String, CollaboratorError>);

    #[async_trait]
    impl LanguageOracle for FixedOracle {
        async fn resolve(&self, _prompt: &str) -> Result<String, CollaboratorError> {
            self.0.clone()
        }
    }

    fn hund() -> WordEntry {
        WordEntry::new("Hund", Language::German, WordType::Noun).with_gender(Article::Der)
    }

    #[tokio::test]
    async fn transport_error_is_a_resolution_failure() {
        let oracle = FixedOracle(Err(CollaboratorError::Transport("connection reset".into())));
        let resolver = FactResolver::new(&oracle);

        let result = resolver.type_gender(&hund()).await;

        let failure = result.unwrap_err();
        assert!(failure.reason.contains("connection reset"));
    }

    #[tokio::test]
    async fn missing_required_field_is_a_resolution_failure() {
        let oracle = FixedOracle(Ok("AI_GENDER: der".into()));
        let resolver = FactResolver::new(&oracle);

        let failure = resolver.type_gender(&hund()).await.unwrap_err();
        assert!(failure.reason.contains("AI_TYPE"));
    }

    #[tokio::test]
    async fn resolves_plural_through_oracle() {
        let oracle = FixedOracle(Ok("STATUS: HAS_PLURAL\nPLURAL_FORM: Hunde".into()));
        let resolver = FactResolver::new(&oracle);

        let fact = resolver.plural(&hund(), Some(Article::Der)).await.unwrap();
        assert_eq!(fact.display().as_deref(), Some("die Hunde"));
    }

    #[test]
    fn none_markers() {
        assert!(is_none_marker(" None "));
        assert!(is_none_marker("N/A"));
        assert!(!is_none_marker("der"));
    }

    #[test]
    fn normalize_tokens() {
        assert_eq!(normalize_token("has plural"), "HAS_PLURAL");
        assert_eq!(normalize_token("**Already-Plural**."), "ALREADY_PLURAL");
    }

    #[test]
    fn strip_decoration_keeps_inner_text() {
        assert_eq!(strip_decoration(" `Noun`. "), "Noun");
        assert_eq!(strip_decoration("**der**"), "der");
        assert_eq!(strip_decoration("er/sie/es"), "er/sie/es");
    }
}
