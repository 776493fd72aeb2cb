//! Test fixtures: scripted oracle answers and request bodies.

use std::collections::HashMap;

use forge_core::GrammarCheck;
use serde_json::{json, Value};

use super::FactKind;

/// Oracle answers for every fixture word.
pub fn oracle_answers() -> HashMap<(FactKind, &'static str), &'static str> {
    HashMap::from([
        (
            (FactKind::TypeGender, "Hund"),
            "AI_TYPE: noun\nAI_GENDER: der\nPLURAL_ONLY: NO\nREASON: Masculine noun.",
        ),
        (
            (FactKind::Plural, "Hund"),
            "STATUS: HAS_PLURAL\nPLURAL_FORM: Hunde\nPLURAL_ARTICLE: die\nREASON: Plural with -e.",
        ),
        (
            (FactKind::TypeGender, "Leute"),
            "AI_TYPE: noun\nAI_GENDER: die\nPLURAL_ONLY: YES\nREASON: Only used in the plural.",
        ),
        (
            (FactKind::TypeGender, "gehen"),
            "AI_TYPE: verb\nAI_GENDER: none\nPLURAL_ONLY: NO",
        ),
        (
            (FactKind::Conjugation, "gehen"),
            "OVERALL: INCORRECT\n- ich: CORRECT\n- du: CORRECT\n- er/sie/es: INCORRECT | geht\nEXPLANATION: Third person singular ends in -t.",
        ),
        (
            (FactKind::TypeGender, "schnell"),
            "AI_TYPE: adjective\nAI_GENDER: none\nPLURAL_ONLY: NO",
        ),
    ])
}

pub fn definition(word: &str) -> String {
    format!("{} ist ein Wort für Lernende.", word)
}

/// Sentences ending in "bellen." are corrected to "bellt."
pub fn grammar_check(sentence: &str) -> GrammarCheck {
    match sentence.strip_suffix("bellen.") {
        Some(head) => GrammarCheck {
            is_correct: false,
            corrected_sentence: Some(format!("{}bellt.", head)),
            explanation: "Das Verb muss zum Subjekt passen.".to_string(),
        },
        None => GrammarCheck {
            is_correct: true,
            corrected_sentence: None,
            explanation: "Der Satz ist korrekt.".to_string(),
        },
    }
}

pub fn hund() -> Value {
    json!({ "word": "Hund", "language": "german", "word_type": "noun", "gender": "der" })
}

pub fn leute() -> Value {
    json!({ "word": "Leute", "language": "german", "word_type": "noun", "gender": "die" })
}

pub fn gehen() -> Value {
    json!({ "word": "gehen", "language": "german", "word_type": "verb" })
}

pub fn schnell() -> Value {
    json!({ "word": "schnell", "word_type": "adjective" })
}

/// Present-tense forms of "gehen" with one mistake.
pub fn gehen_forms() -> Value {
    json!({
        "conjugations": [
            { "pronoun": "ich", "form": "gehe" },
            { "pronoun": "du", "form": "gehst" },
            { "pronoun": "er/sie/es", "form": "get" }
        ]
    })
}
