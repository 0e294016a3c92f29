use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Precision, recall and F-measure of one ROUGE comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

impl RougeScore {
    fn from_counts(overlap: usize, predicted: usize, expected: usize) -> Self {
        let precision = overlap as f64 / predicted.max(1) as f64;
        let recall = overlap as f64 / expected.max(1) as f64;
        let fmeasure = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            fmeasure,
        }
    }
}

fn ngram_counts<T: AsRef<str>>(tokens: &[T], n: usize) -> HashMap<Vec<&str>, usize> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        let key: Vec<&str> = window.iter().map(AsRef::as_ref).collect();
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// ROUGE-N between token sequences, counting repeated n-grams with clipping.
pub fn rouge_n<T: AsRef<str>>(prediction: &[T], reference: &[T], n: usize) -> RougeScore {
    let predicted = ngram_counts(prediction, n);
    let expected = ngram_counts(reference, n);

    let overlap: usize = expected
        .iter()
        .map(|(gram, count)| predicted.get(gram).map_or(0, |p| (*p).min(*count)))
        .sum();

    RougeScore::from_counts(
        overlap,
        predicted.values().sum(),
        expected.values().sum(),
    )
}

fn lcs_len<T: AsRef<str>>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Single rolling row of the classic DP table.
    let mut row = vec![0usize; b.len() + 1];
    for x in a {
        let mut diagonal = 0;
        for (j, y) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x.as_ref() == y.as_ref() {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// ROUGE-L between token sequences, based on the longest common subsequence.
pub fn rouge_l<T: AsRef<str>>(prediction: &[T], reference: &[T]) -> RougeScore {
    if prediction.is_empty() || reference.is_empty() {
        return RougeScore::default();
    }
    RougeScore::from_counts(
        lcs_len(prediction, reference),
        prediction.len(),
        reference.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::rouge_tokens;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rouge1_counts_repeats_with_clipping() {
        let pred = rouge_tokens("the the the cat");
        let reference = rouge_tokens("the cat sat on the mat");
        let score = rouge_n(&pred, &reference, 1);
        // overlap: the x2 (clipped by reference), cat x1
        assert!(close(score.precision, 3.0 / 4.0));
        assert!(close(score.recall, 3.0 / 6.0));
        assert!(close(score.fmeasure, 0.6));
    }

    #[test]
    fn test_rouge2() {
        let pred = rouge_tokens("the cat sat");
        let reference = rouge_tokens("the cat ran");
        let score = rouge_n(&pred, &reference, 2);
        assert!(close(score.precision, 0.5));
        assert!(close(score.recall, 0.5));
        assert!(close(score.fmeasure, 0.5));
    }

    #[test]
    fn test_rouge2_needs_two_tokens() {
        let score = rouge_n(&["one"], &["one"], 2);
        assert_eq!(score, RougeScore::default());
    }

    #[test]
    fn test_rouge_l_uses_subsequence() {
        let pred = rouge_tokens("police killed the gunman");
        let reference = rouge_tokens("police kill the gunman");
        // LCS = police the gunman
        let score = rouge_l(&pred, &reference);
        assert!(close(score.precision, 0.75));
        assert!(close(score.recall, 0.75));
        assert!(close(score.fmeasure, 0.75));
    }

    #[test]
    fn test_identical_sequences_score_one() {
        let tokens = rouge_tokens("清 热 化 痰");
        assert!(close(rouge_n(&tokens, &tokens, 1).fmeasure, 1.0));
        assert!(close(rouge_n(&tokens, &tokens, 2).fmeasure, 1.0));
        assert!(close(rouge_l(&tokens, &tokens).fmeasure, 1.0));
    }

    #[test]
    fn test_empty_side_scores_zero() {
        let empty: Vec<String> = Vec::new();
        let tokens = rouge_tokens("something");
        assert_eq!(rouge_n(&empty, &tokens, 1), RougeScore::default());
        assert_eq!(rouge_l(&tokens, &empty), RougeScore::default());
    }
}
