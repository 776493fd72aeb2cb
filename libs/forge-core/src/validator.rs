//! Comparison of learner claims against resolved facts.
//!
//! Every check takes the resolution outcome as-is: an `Err` produces an
//! `Unknown` verdict and nothing else does.

use crate::error::ResolutionFailure;
use crate::matching::{compare_forms, same_form, DEFAULT_NEAR_MISS_THRESHOLD};
use crate::types::{
    Article, ConjugationEntry, ConjugationFact, Language, PluralFact, PluralStatus,
    TypeGenderFact, ValidationVerdict, Verdict, WordType,
};

pub type TypeVerdict = ValidationVerdict<TypeGenderFact, WordType>;
/// Fact is the expected article.
pub type GenderVerdict = ValidationVerdict<Article, Option<Article>>;
/// Claim is the entered plural, `None` when left blank.
pub type PluralVerdict = ValidationVerdict<PluralFact, Option<String>>;
pub type ConjugationVerdict = ValidationVerdict<ConjugationFact, Vec<ConjugationEntry>>;

/// Decides whether learner claims match resolved facts.
#[derive(Debug, Clone, Copy)]
pub struct ClaimValidator {
    /// Similarity at which a wrong form is reported as close.
    pub near_miss_threshold: f64,
}

impl Default for ClaimValidator {
    fn default() -> Self {
        Self {
            near_miss_threshold: DEFAULT_NEAR_MISS_THRESHOLD,
        }
    }
}

impl ClaimValidator {
    pub fn new(near_miss_threshold: f64) -> Self {
        Self {
            near_miss_threshold,
        }
    }

    /// Case-insensitive match of the claimed type against the resolved type.
    pub fn validate_type(
        &self,
        claim: &WordType,
        fact: Result<&TypeGenderFact, &ResolutionFailure>,
    ) -> TypeVerdict {
        let fact = match fact {
            Ok(fact) => fact,
            Err(failure) => return unknown(claim.clone(), failure),
        };

        let matches = same_form(claim.as_str(), fact.resolved_type.as_str());
        let feedback = if matches {
            format!("Correct, it is a {}.", fact.resolved_type)
        } else {
            with_rationale(
                format!("It is a {}, not a {}.", fact.resolved_type, claim),
                &fact.rationale,
            )
        };

        ValidationVerdict {
            matches_claim: Verdict::from_bool(matches),
            fact: Some(fact.clone()),
            claim: claim.clone(),
            feedback,
        }
    }

    /// Check the claimed article. `None` when gender does not apply to the word.
    ///
    /// Plural-only nouns are checked against the plural article.
    pub fn validate_gender(
        &self,
        claim: Option<Article>,
        language: Language,
        fact: Result<&TypeGenderFact, &ResolutionFailure>,
    ) -> Option<GenderVerdict> {
        let fact = match fact {
            Ok(fact) => fact,
            Err(failure) => return claim.map(|c| unknown(Some(c), failure)),
        };

        if !fact.resolved_type.is_noun() || !language.has_grammatical_gender() {
            return None;
        }

        let expected = if fact.is_plural_only {
            Some(language.plural_article())
        } else {
            fact.resolved_gender
        };

        let Some(expected) = expected else {
            return Some(ValidationVerdict {
                matches_claim: Verdict::Unknown,
                fact: None,
                claim,
                feedback: "The gender of this noun could not be determined.".to_string(),
            });
        };

        let matches = claim == Some(expected);
        let feedback = match (matches, fact.is_plural_only, claim) {
            (true, true, _) => format!("Correct, plural-only nouns take \"{}\".", expected),
            (true, false, _) => format!("Correct, it is \"{}\".", expected),
            (false, true, _) => with_rationale(
                format!(
                    "This noun only exists in the plural and takes \"{}\".",
                    expected
                ),
                &fact.rationale,
            ),
            (false, false, Some(claimed)) => with_rationale(
                format!("It is \"{}\", not \"{}\".", expected, claimed),
                &fact.rationale,
            ),
            (false, false, None) => format!("Select an article; it is \"{}\".", expected),
        };

        Some(ValidationVerdict {
            matches_claim: Verdict::from_bool(matches),
            fact: Some(expected),
            claim,
            feedback,
        })
    }

    /// Check the entered plural. Blank is only correct when there is no separate plural.
    pub fn validate_plural(
        &self,
        claim: Option<&str>,
        fact: Result<&PluralFact, &ResolutionFailure>,
    ) -> PluralVerdict {
        let claim = claim
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let fact = match fact {
            Ok(fact) => fact,
            Err(failure) => return unknown(claim, failure),
        };

        let (matches, feedback) = match (&fact.status, claim.as_deref()) {
            (PluralStatus::HasPlural { form, article }, Some(entered)) => {
                let comparison = compare_forms(entered, form, self.near_miss_threshold);
                if comparison.matches {
                    (true, format!("Correct, the plural is \"{} {}\".", article, form))
                } else if comparison.near_miss {
                    (
                        false,
                        format!("Close! The plural is \"{} {}\".", article, form),
                    )
                } else {
                    (
                        false,
                        with_rationale(
                            format!("The plural is \"{} {}\", not \"{}\".", article, form, entered),
                            &fact.rationale,
                        ),
                    )
                }
            }
            (PluralStatus::HasPlural { form, article }, None) => (
                false,
                format!("This noun has a plural: \"{} {}\".", article, form),
            ),
            (PluralStatus::NoPlural, None) => (true, "Correct, this noun has no plural.".to_string()),
            (PluralStatus::AlreadyPlural, None) => (
                true,
                "Correct, this noun is already plural.".to_string(),
            ),
            (PluralStatus::NoPlural, Some(_)) => (
                false,
                with_rationale(
                    "This noun has no plural; leave the field blank.".to_string(),
                    &fact.rationale,
                ),
            ),
            (PluralStatus::AlreadyPlural, Some(_)) => (
                false,
                with_rationale(
                    "This noun is already plural; leave the field blank.".to_string(),
                    &fact.rationale,
                ),
            ),
        };

        ValidationVerdict {
            matches_claim: Verdict::from_bool(matches),
            fact: Some(fact.clone()),
            claim,
            feedback,
        }
    }

    /// All-or-nothing check of the submitted conjugations.
    ///
    /// Any incorrect, corrected or unverified pronoun fails the whole set.
    pub fn validate_conjugation(
        &self,
        claim: &[ConjugationEntry],
        fact: Result<&ConjugationFact, &ResolutionFailure>,
    ) -> ConjugationVerdict {
        let fact = match fact {
            Ok(fact) => fact,
            Err(failure) => return unknown(claim.to_vec(), failure),
        };

        let mut problems = Vec::new();
        for entry in claim {
            match fact.get(&entry.pronoun) {
                Some(check) if check.correct && check.corrected_form.is_none() => {}
                Some(check) if !check.verified => {
                    problems.push(format!("{}: could not be verified", entry.pronoun));
                }
                Some(check) => match &check.corrected_form {
                    Some(corrected) => {
                        let close = compare_forms(&entry.form, corrected, self.near_miss_threshold)
                            .near_miss;
                        problems.push(format!(
                            "{}: {} → {}{}",
                            entry.pronoun,
                            entry.form,
                            corrected,
                            if close { " (close)" } else { "" }
                        ));
                    }
                    None => problems.push(format!("{}: {} is incorrect", entry.pronoun, entry.form)),
                },
                None => problems.push(format!("{}: could not be verified", entry.pronoun)),
            }
        }

        let matches = fact.overall_correct && problems.is_empty();
        let feedback = if matches {
            "All forms are correct.".to_string()
        } else if problems.is_empty() {
            with_rationale("Not all forms are correct.".to_string(), &fact.rationale)
        } else {
            with_rationale(problems.join("\n"), &fact.rationale)
        };

        ValidationVerdict {
            matches_claim: Verdict::from_bool(matches),
            fact: Some(fact.clone()),
            claim: claim.to_vec(),
            feedback,
        }
    }
}

fn unknown<F, C>(claim: C, failure: &ResolutionFailure) -> ValidationVerdict<F, C> {
    ValidationVerdict {
        matches_claim: Verdict::Unknown,
        fact: None,
        claim,
        feedback: format!("Could not be checked: {}", failure.reason),
    }
}

fn with_rationale(message: String, rationale: &str) -> String {
    if rationale.trim().is_empty() {
        message
    } else {
        format!("{} {}", message, rationale.trim())
    }
}
