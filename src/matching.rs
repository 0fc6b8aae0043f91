//! # Fuzzy Name Matching Module
//!
//! ## Purpose
//! Normalized string similarity for party-name screening, tolerant of word
//! reordering, extra corporate suffixes, and transliteration noise.
//!
//! ## Input/Output Specification
//! - **Input**: Query text and a candidate name or alias
//! - **Output**: Similarity score in `[0.0, 1.0]`
//! - **Convention**: Token-set ratio over normalized Levenshtein distance,
//!   case-folded before comparison
//!
//! ## Key Features
//! - A name containing every query token scores 1.0 regardless of word
//!   order or additional tokens ("huawei" vs "Huawei Technologies")
//! - Character-level edit distance still catches misspellings inside tokens
//!   ("Huaewi" vs "Huawei" scores roughly 0.67)
//! - Symmetric: `similarity(a, b) == similarity(b, a)`

use std::collections::BTreeSet;

/// Compute the similarity between two strings as a token-set ratio.
///
/// Both sides are lower-cased and split into alphanumeric tokens. The score
/// is the best normalized Levenshtein ratio among the sorted token
/// intersection and the two sorted token differences, so shared tokens are
/// rewarded independently of word order. Two empty token sets are identical
/// (1.0); an empty set against a non-empty one scores 0.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let tokens_a = fold_tokens(a);
    let tokens_b = fold_tokens(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return if tokens_a.is_empty() && tokens_b.is_empty() {
            1.0
        } else {
            0.0
        };
    }

    let shared = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = concat(&shared, &only_a);
    let combined_b = concat(&shared, &only_b);

    let base = strsim::normalized_levenshtein(&shared, &combined_a)
        .max(strsim::normalized_levenshtein(&shared, &combined_b));
    base.max(strsim::normalized_levenshtein(&combined_a, &combined_b))
}

/// Whether a score clears the acceptance threshold
pub fn accepts(score: f64, threshold: f64) -> bool {
    score >= threshold
}

/// Lower-cased alphanumeric tokens, deduplicated and sorted
fn fold_tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn join<'a, I: Iterator<Item = &'a String>>(tokens: I) -> String {
    let mut out = String::new();
    for token in tokens {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn concat(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        (false, false) => format!("{} {}", head, tail),
    }
}
