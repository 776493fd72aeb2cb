//! Comparison of learner-typed forms against resolved forms.

use serde::{Deserialize, Serialize};

/// Default similarity at or above which a wrong answer counts as a near miss.
pub const DEFAULT_NEAR_MISS_THRESHOLD: f64 = 0.8;

/// Result of comparing a typed form to the expected form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormComparison {
    /// Case-insensitive equality after whitespace normalization.
    pub matches: bool,
    /// Similarity score between 0.0 and 1.0.
    pub similarity: f64,
    /// Wrong, but close enough to hint at a typo.
    pub near_miss: bool,
}

/// Compare a typed form to the expected form, ignoring case and extra whitespace.
pub fn compare_forms(typed: &str, expected: &str, near_miss_threshold: f64) -> FormComparison {
    let typed = normalize_whitespace(typed).to_lowercase();
    let expected = normalize_whitespace(expected).to_lowercase();

    if typed == expected {
        return FormComparison {
            matches: true,
            similarity: 1.0,
            near_miss: false,
        };
    }

    let similarity = normalized_similarity(&typed, &expected);
    FormComparison {
        matches: false,
        similarity,
        near_miss: !typed.is_empty() && similarity >= near_miss_threshold,
    }
}

/// Case-insensitive equality after whitespace normalization.
pub fn same_form(a: &str, b: &str) -> bool {
    normalize_whitespace(a).to_lowercase() == normalize_whitespace(b).to_lowercase()
}

/// Normalize whitespace in a string (trim and collapse multiple spaces).
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Edit distance in characters (insert, delete, substitute).
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    // row[j] is the distance from the prefix of `a` seen so far to target[..j]
    let mut row: Vec<usize> = (0..=target.len()).collect();

    for (i, source) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &expected) in target.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(source != expected);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }

    row[target.len()]
}

/// 1.0 for identical strings, falling linearly with edit distance.
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    match longest {
        0 => 1.0,
        n => 1.0 - levenshtein_distance(a, b) as f64 / n as f64,
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    /// Word is the same in both sentences.
    Same,
    /// Word was added by the correction.
    Added,
    /// Word was removed by the correction.
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffSegment {
    pub text: String,
    pub diff_type: DiffType,
}

impl DiffSegment {
    fn new(text: &str, diff_type: DiffType) -> Self {
        Self {
            text: text.to_string(),
            diff_type,
        }
    }
}

/// Word-level diff from the learner's sentence to the corrected sentence.
pub fn word_diff(original: &str, corrected: &str) -> Vec<DiffSegment> {
    let original_words: Vec<&str> = original.split_whitespace().collect();
    let corrected_words: Vec<&str> = corrected.split_whitespace().collect();

    let mut result = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < original_words.len() || j < corrected_words.len() {
        if i < original_words.len() && j < corrected_words.len() {
            if original_words[i] == corrected_words[j] {
                result.push(DiffSegment::new(original_words[i], DiffType::Same));
                i += 1;
                j += 1;
                continue;
            }

            // Look a couple of words ahead for a resync point
            if let Some(k) = (j + 1..corrected_words.len().min(j + 3))
                .find(|&k| original_words[i] == corrected_words[k])
            {
                for word in &corrected_words[j..k] {
                    result.push(DiffSegment::new(word, DiffType::Added));
                }
                j = k;
                continue;
            }

            if let Some(k) = (i + 1..original_words.len().min(i + 3))
                .find(|&k| corrected_words[j] == original_words[k])
            {
                for word in &original_words[i..k] {
                    result.push(DiffSegment::new(word, DiffType::Removed));
                }
                i = k;
                continue;
            }

            result.push(DiffSegment::new(original_words[i], DiffType::Removed));
            result.push(DiffSegment::new(corrected_words[j], DiffType::Added));
            i += 1;
            j += 1;
        } else if i < original_words.len() {
            result.push(DiffSegment::new(original_words[i], DiffType::Removed));
            i += 1;
        } else {
            result.push(DiffSegment::new(corrected_words[j], DiffType::Added));
            j += 1;
        }
    }

    result
}
