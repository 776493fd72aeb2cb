//! Word type and gender resolution.

use super::{is_none_marker, normalize_token, strip_decoration};
use crate::error::ResolutionFailure;
use crate::parser::{self, FieldSpec, Schema};
use crate::types::{Article, Language, TypeGenderFact, WordEntry, WordType};

pub const AI_TYPE: &str = "AI_TYPE";
pub const AI_GENDER: &str = "AI_GENDER";
pub const PLURAL_ONLY: &str = "PLURAL_ONLY";
pub const REASON: &str = "REASON";

pub const SCHEMA: Schema = Schema::new(&[
    FieldSpec::required(AI_TYPE, "noun | verb | adjective | adverb | preposition | conjunction | pronoun"),
    FieldSpec::optional(AI_GENDER, "der | die | das | none"),
    FieldSpec::optional(PLURAL_ONLY, "YES | NO"),
    FieldSpec::optional(REASON, "one short sentence"),
]);

pub fn prompt(entry: &WordEntry) -> String {
    let language = entry.language.name();
    format!(
        "You are a {language} grammar expert. Classify the {language} word \"{word}\".\n\
         \n\
         Respond with exactly these lines and nothing else:\n\
         {template}\n\
         \n\
         AI_GENDER is the definite singular article if the word is a noun, otherwise none.\n\
         PLURAL_ONLY is YES only for nouns that have no singular form.",
        word = entry.text.trim(),
        template = SCHEMA.template(),
    )
}

/// Build a type/gender fact from oracle text.
///
/// The gender is restricted to the closed article set; anything else is
/// dropped. Plural-only nouns always take the plural article.
pub fn interpret(text: &str, language: Language) -> Result<TypeGenderFact, ResolutionFailure> {
    let fields = parser::parse(text, &SCHEMA)?;

    let resolved_type = WordType::parse(strip_decoration(fields.require(AI_TYPE)?));
    let rationale = fields.get(REASON).unwrap_or_default().to_string();

    let flagged_plural_only = match fields.get(PLURAL_ONLY).map(normalize_token).as_deref() {
        None | Some("NO") | Some("FALSE") | Some("N") => false,
        Some("YES") | Some("TRUE") | Some("Y") => true,
        Some(other) => {
            tracing::warn!(value = other, "unrecognized PLURAL_ONLY value, treating as NO");
            false
        }
    };

    let is_plural_only = if flagged_plural_only && !resolved_type.is_noun() {
        tracing::warn!(word_type = %resolved_type, "PLURAL_ONLY set on a non-noun, ignoring");
        false
    } else {
        flagged_plural_only
    };

    let emitted_gender = match fields.get(AI_GENDER) {
        Some(raw) if is_none_marker(raw) => None,
        Some(raw) => {
            let article = Article::parse(strip_decoration(raw));
            if article.is_none() {
                tracing::warn!(value = raw, "oracle gender outside the article set, dropping");
            }
            article
        }
        None => None,
    };

    let resolved_gender = if !resolved_type.is_noun() || !language.has_grammatical_gender() {
        if let Some(article) = emitted_gender {
            tracing::debug!(%article, word_type = %resolved_type, "ignoring gender on a non-noun");
        }
        None
    } else if is_plural_only {
        let plural = language.plural_article();
        if emitted_gender.is_some_and(|g| g != plural) {
            tracing::warn!(
                emitted = ?emitted_gender,
                "plural-only noun, overriding emitted gender with the plural article"
            );
        }
        Some(plural)
    } else {
        emitted_gender
    };

    Ok(TypeGenderFact {
        resolved_type,
        resolved_gender,
        is_plural_only,
        rationale,
    })
}
