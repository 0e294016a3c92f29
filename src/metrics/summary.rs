use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sample::EvaluationResult;

use super::overlap::{exact_match, token_f1};
use super::rouge::{rouge_l, rouge_n};
use super::tokenize::rouge_tokens;

/// Mean ROUGE F-measures across a run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RougeScores {
    #[serde(rename = "rouge-1")]
    pub rouge1: f64,
    #[serde(rename = "rouge-2")]
    pub rouge2: f64,
    #[serde(rename = "rouge-l")]
    pub rouge_l: f64,
}

/// Aggregate statistics of one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub exact_match: f64,
    /// Macro average of per-sample token F1.
    pub avg_f1: f64,
    pub rouge_scores: RougeScores,
    /// Mean latency over every sample; failed samples count as zero.
    #[serde(rename = "avg_inference_time")]
    pub avg_inference_time_seconds: f64,
    pub total_samples: usize,
    #[serde(default)]
    pub failed_samples: usize,
    /// Share of results whose answer came from answer tags (CoT runs only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_tag_rate: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        values.sum::<f64>() / count as f64
    }
}

/// Computes every metric over a finished result list.
pub fn calculate_all_metrics(results: &[EvaluationResult]) -> MetricsSummary {
    let total = results.len();

    let exact = exact_match(
        results
            .iter()
            .map(|r| (r.prediction.as_str(), r.reference.as_str())),
    );
    let avg_f1 = mean(
        results
            .iter()
            .map(|r| token_f1(&r.prediction, &r.reference).f1),
        total,
    );

    let mut rouge_sums = RougeScores::default();
    for result in results {
        let prediction = rouge_tokens(&result.prediction);
        let reference = rouge_tokens(&result.reference);
        rouge_sums.rouge1 += rouge_n(&prediction, &reference, 1).fmeasure;
        rouge_sums.rouge2 += rouge_n(&prediction, &reference, 2).fmeasure;
        rouge_sums.rouge_l += rouge_l(&prediction, &reference).fmeasure;
    }
    let rouge_scores = if total == 0 {
        RougeScores::default()
    } else {
        RougeScores {
            rouge1: rouge_sums.rouge1 / total as f64,
            rouge2: rouge_sums.rouge2 / total as f64,
            rouge_l: rouge_sums.rouge_l / total as f64,
        }
    };

    let answer_tag_rate = results
        .iter()
        .any(|r| r.has_answer_tags.is_some())
        .then(|| {
            mean(
                results
                    .iter()
                    .map(|r| f64::from(u8::from(r.has_answer_tags.unwrap_or(false)))),
                total,
            )
        });

    MetricsSummary {
        exact_match: exact,
        avg_f1,
        rouge_scores,
        avg_inference_time_seconds: mean(results.iter().map(|r| r.inference_time_seconds), total),
        total_samples: total,
        failed_samples: results.iter().filter(|r| r.is_failed()).count(),
        answer_tag_rate,
    }
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total samples:      {}", self.total_samples)?;
        if self.failed_samples > 0 {
            writeln!(f, "Failed samples:     {}", self.failed_samples)?;
        }
        writeln!(f, "Exact match:        {:.2}%", self.exact_match * 100.0)?;
        writeln!(f, "Average F1:         {:.4}", self.avg_f1)?;
        writeln!(f, "ROUGE-1:            {:.4}", self.rouge_scores.rouge1)?;
        writeln!(f, "ROUGE-2:            {:.4}", self.rouge_scores.rouge2)?;
        writeln!(f, "ROUGE-L:            {:.4}", self.rouge_scores.rouge_l)?;
        if let Some(rate) = self.answer_tag_rate {
            writeln!(f, "Answer tag usage:   {:.1}%", rate * 100.0)?;
        }
        write!(
            f,
            "Avg inference time: {:.2}s",
            self.avg_inference_time_seconds
        )
    }
}
