//! Verb conjugation checking.
//!
//! Feedback lines are aligned against the exact pronoun set the learner
//! submitted. A submitted pronoun without a feedback line is unverified and
//! counts as incorrect.

use super::{is_none_marker, normalize_token};
use crate::error::ResolutionFailure;
use crate::matching::same_form;
use crate::parser::{self, FieldSpec, Schema};
use crate::types::{ConjugationEntry, ConjugationFact, PronounCheck, WordEntry};

pub const OVERALL: &str = "OVERALL";
pub const EXPLANATION: &str = "EXPLANATION";

pub const SCHEMA: Schema = Schema::new(&[
    FieldSpec::required(OVERALL, "CORRECT | INCORRECT"),
    FieldSpec::optional(EXPLANATION, "short explanation of any mistakes"),
]);

pub fn prompt(entry: &WordEntry, submitted: &[ConjugationEntry]) -> String {
    let language = entry.language.name();
    let forms = submitted
        .iter()
        .map(|c| format!("- {}: {}", c.pronoun.trim(), c.form.trim()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a {language} grammar expert. A learner conjugated the {language} verb \
         \"{word}\" in the present tense:\n\
         {forms}\n\
         \n\
         Respond with exactly these lines and nothing else:\n\
         {template}\n\
         followed by one line per pronoun above, in this form:\n\
         - pronoun: CORRECT\n\
         - pronoun: INCORRECT | corrected form",
        word = entry.text.trim(),
        template = SCHEMA.template(),
    )
}

/// Build a conjugation fact for exactly the submitted pronouns.
pub fn interpret(
    text: &str,
    submitted: &[ConjugationEntry],
) -> Result<ConjugationFact, ResolutionFailure> {
    let fields = parser::parse(text, &SCHEMA)?;

    let oracle_overall = match normalize_token(fields.require(OVERALL)?).as_str() {
        "CORRECT" => true,
        "INCORRECT" => false,
        other => {
            return Err(ResolutionFailure::new(format!(
                "unrecognized conjugation OVERALL value {}",
                other
            )))
        }
    };

    let feedback = parser::parse_entries(text);
    let per_pronoun: Vec<PronounCheck> = submitted
        .iter()
        .map(|entry| {
            let line = feedback
                .iter()
                .find(|(pronoun, _)| pronoun.trim().eq_ignore_ascii_case(entry.pronoun.trim()));
            match line {
                Some((_, value)) => check_line(entry, value),
                None => {
                    tracing::warn!(pronoun = %entry.pronoun, "no feedback line for pronoun, marking unverified");
                    PronounCheck::unverified(&entry.pronoun, &entry.form)
                }
            }
        })
        .collect();

    let all_correct = per_pronoun
        .iter()
        .all(|c| c.correct && c.corrected_form.is_none());
    if oracle_overall && !all_correct {
        tracing::warn!("oracle reported OVERALL CORRECT but not every pronoun checks out");
    }

    Ok(ConjugationFact {
        overall_correct: oracle_overall && all_correct,
        per_pronoun,
        rationale: fields.get(EXPLANATION).unwrap_or_default().to_string(),
    })
}

/// Interpret one `CORRECT|INCORRECT | correction` value.
fn check_line(entry: &ConjugationEntry, value: &str) -> PronounCheck {
    let (verdict, correction) = match value.split_once('|') {
        Some((verdict, correction)) => (verdict, Some(correction.trim())),
        None => (value, None),
    };

    // A "correction" identical to what was submitted is no correction
    let correction = correction
        .filter(|c| !is_none_marker(c))
        .filter(|c| !same_form(c, &entry.form))
        .map(str::to_string);

    let correct = match normalize_token(verdict).as_str() {
        "CORRECT" if correction.is_some() => {
            tracing::warn!(pronoun = %entry.pronoun, "CORRECT line carries a correction, treating as incorrect");
            false
        }
        "CORRECT" => true,
        "INCORRECT" => false,
        other => {
            tracing::warn!(pronoun = %entry.pronoun, value = other, "unrecognized pronoun verdict, marking unverified");
            return PronounCheck::unverified(&entry.pronoun, &entry.form);
        }
    };

    PronounCheck {
        pronoun: entry.pronoun.clone(),
        submitted: entry.form.clone(),
        correct,
        corrected_form: correction,
        verified: true,
    }
}
