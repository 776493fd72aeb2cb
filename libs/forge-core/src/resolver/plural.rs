//! Noun plurality resolution.

use super::{is_none_marker, normalize_token};
use crate::error::ResolutionFailure;
use crate::parser::{self, FieldSpec, Schema};
use crate::types::{Article, Language, PluralFact, PluralStatus, WordEntry};

pub const STATUS: &str = "STATUS";
pub const PLURAL_FORM: &str = "PLURAL_FORM";
pub const PLURAL_ARTICLE: &str = "PLURAL_ARTICLE";
pub const REASON: &str = "REASON";

pub const SCHEMA: Schema = Schema::new(&[
    FieldSpec::required(STATUS, "HAS_PLURAL | NO_PLURAL | ALREADY_PLURAL"),
    FieldSpec::optional(PLURAL_FORM, "the plural form without article, or none"),
    FieldSpec::optional(PLURAL_ARTICLE, "the plural article, or none"),
    FieldSpec::optional(REASON, "one short sentence"),
]);

pub fn prompt(entry: &WordEntry, gender: Option<Article>) -> String {
    let language = entry.language.name();
    let word = match gender {
        Some(article) => format!("{} {}", article, entry.text.trim()),
        None => entry.text.trim().to_string(),
    };
    format!(
        "You are a {language} grammar expert. Does the {language} noun \"{word}\" have a plural form?\n\
         \n\
         Respond with exactly these lines and nothing else:\n\
         {template}\n\
         \n\
         Use NO_PLURAL for nouns that are not used in the plural and ALREADY_PLURAL \
         for nouns that are themselves plural.",
        template = SCHEMA.template(),
    )
}

/// Build a plural fact from oracle text.
///
/// A `HAS_PLURAL` status without a usable form is a failure, not a guess.
pub fn interpret(text: &str, language: Language) -> Result<PluralFact, ResolutionFailure> {
    let fields = parser::parse(text, &SCHEMA)?;
    let rationale = fields.get(REASON).unwrap_or_default().to_string();
    let raw_form = fields.get(PLURAL_FORM).filter(|f| !is_none_marker(f));

    let status = match normalize_token(fields.require(STATUS)?).as_str() {
        "HAS_PLURAL" => {
            let raw_form = raw_form.ok_or_else(|| {
                ResolutionFailure::new("oracle reported a plural but gave no PLURAL_FORM")
            })?;
            let (prefix, form) = split_article(raw_form);
            if form.is_empty() {
                return Err(ResolutionFailure::new("oracle gave an empty PLURAL_FORM"));
            }

            let emitted = fields
                .get(PLURAL_ARTICLE)
                .filter(|a| !is_none_marker(a))
                .map(|a| (a, Article::parse(a)));
            let article = language.plural_article();
            match (emitted, prefix) {
                (Some((raw, parsed)), _) if parsed != Some(article) => {
                    tracing::warn!(value = raw, %article, "plural article discrepancy, using the plural article");
                }
                (None, Some(p)) if p != article => {
                    tracing::warn!(emitted = %p, %article, "plural form carried a non-plural article");
                }
                _ => {}
            }

            PluralStatus::HasPlural {
                form: form.to_string(),
                article,
            }
        }
        "NO_PLURAL" => {
            warn_ignored_form(raw_form);
            PluralStatus::NoPlural
        }
        "ALREADY_PLURAL" => {
            warn_ignored_form(raw_form);
            PluralStatus::AlreadyPlural
        }
        other => {
            tracing::warn!(value = other, "unrecognized plural STATUS");
            return Err(ResolutionFailure::new(format!(
                "unrecognized plural status {}",
                other
            )));
        }
    };

    Ok(PluralFact { status, rationale })
}

/// Split a leading article off a plural form ("die Hunde" -> (die, "Hunde")).
fn split_article(raw: &str) -> (Option<Article>, &str) {
    let raw = raw.trim();
    if let Some((head, rest)) = raw.split_once(char::is_whitespace) {
        if let Some(article) = Article::parse(head) {
            return (Some(article), rest.trim());
        }
    }
    (None, raw)
}

fn warn_ignored_form(raw_form: Option<&str>) {
    if let Some(form) = raw_form {
        tracing::warn!(form, "plural form given for a noun without a separate plural, ignoring");
    }
}
