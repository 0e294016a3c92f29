use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::tokenize::tokenize;

/// Fraction of pairs whose trimmed prediction equals the trimmed reference.
///
/// Returns 0.0 for empty input.
pub fn exact_match<'a, I>(pairs: I) -> f64
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let (matches, total) = pairs
        .into_iter()
        .fold((0usize, 0usize), |(matches, total), (prediction, reference)| {
            let hit = prediction.trim() == reference.trim();
            (matches + usize::from(hit), total + 1)
        });
    if total == 0 {
        0.0
    } else {
        matches as f64 / total as f64
    }
}

/// Token-set precision, recall and F1 of one prediction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct F1Score {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Compares the *sets* of tokens in prediction and reference.
///
/// All scores are 0 when either side has no tokens.
pub fn token_f1(prediction: &str, reference: &str) -> F1Score {
    let predicted: HashSet<&str> = tokenize(prediction).into_iter().collect();
    let expected: HashSet<&str> = tokenize(reference).into_iter().collect();

    if predicted.is_empty() || expected.is_empty() {
        return F1Score::default();
    }

    let common = predicted.intersection(&expected).count() as f64;
    let precision = common / predicted.len() as f64;
    let recall = common / expected.len() as f64;
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    F1Score {
        precision,
        recall,
        f1,
    }
}
