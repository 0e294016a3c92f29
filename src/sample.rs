//! Evaluation samples and the per-sample results produced for them.

use serde::{Deserialize, Serialize};

/// A question/reference pair to evaluate.
///
/// Samples are loaded once and never mutated; `id` defines the canonical
/// ordering of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSample {
    pub id: i64,
    pub instruction: String,
    #[serde(default)]
    pub input: String,
    /// Reference answer.
    pub output: String,
    /// Instruction combined with the supplementary input, as sent to the model.
    pub full_question: String,
}

impl EvaluationSample {
    /// Creates a sample, deriving `full_question` from instruction and input.
    pub fn new(
        id: i64,
        instruction: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        let instruction = instruction.into();
        let input = input.into();
        let full_question =
            crate::prompt::format_question(&instruction, &input, crate::prompt::DEFAULT_SUPPLEMENT_LABEL);
        Self {
            id,
            instruction,
            input,
            output: output.into(),
            full_question,
        }
    }
}

/// Outcome of evaluating a single sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: i64,
    pub instruction: String,
    pub input: String,
    pub full_question: String,
    pub reference: String,
    /// Complete model output, kept only when answers are extracted from it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_prediction: Option<String>,
    /// Text that is scored against `reference`.
    pub prediction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_answer_tags: Option<bool>,
    #[serde(rename = "inference_time")]
    pub inference_time_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    /// Result for a sample whose generation succeeded.
    pub fn completed(
        sample: &EvaluationSample,
        prediction: String,
        inference_time_seconds: f64,
    ) -> Self {
        Self {
            prediction,
            inference_time_seconds,
            ..Self::blank(sample)
        }
    }

    /// Result for a sample whose generation failed: empty prediction, zero
    /// latency and the error message.
    pub fn failed(sample: &EvaluationSample, error: impl Into<String>, cot: bool) -> Self {
        Self {
            raw_prediction: cot.then(String::new),
            has_answer_tags: cot.then_some(false),
            error: Some(error.into()),
            ..Self::blank(sample)
        }
    }

    /// Attaches the raw chain-of-thought output the prediction was extracted from.
    pub fn with_extraction(mut self, raw_prediction: String, has_answer_tags: bool) -> Self {
        self.raw_prediction = Some(raw_prediction);
        self.has_answer_tags = Some(has_answer_tags);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    fn blank(sample: &EvaluationSample) -> Self {
        Self {
            id: sample.id,
            instruction: sample.instruction.clone(),
            input: sample.input.clone(),
            full_question: sample.full_question.clone(),
            reference: sample.output.clone(),
            raw_prediction: None,
            prediction: String::new(),
            has_answer_tags: None,
            inference_time_seconds: 0.0,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sample_derives_full_question() {
        let plain = EvaluationSample::new(1, "What is qi?", "", "Vital energy");
        assert_eq!(plain.full_question, "What is qi?");

        let with_input = EvaluationSample::new(2, "Diagnose.", "Cough for 3 months", "Phlegm-heat");
        assert!(with_input.full_question.starts_with("Diagnose."));
        assert!(with_input.full_question.ends_with("Cough for 3 months"));
    }

    #[test]
    fn test_failed_result_shape() {
        let sample = EvaluationSample::new(7, "q", "", "ref");
        let zero_shot = EvaluationResult::failed(&sample, "timeout", false);
        assert_eq!(zero_shot.id, 7);
        assert_eq!(zero_shot.reference, "ref");
        assert_eq!(zero_shot.prediction, "");
        assert_eq!(zero_shot.inference_time_seconds, 0.0);
        assert_eq!(zero_shot.raw_prediction, None);
        assert!(zero_shot.is_failed());

        let cot = EvaluationResult::failed(&sample, "timeout", true);
        assert_eq!(cot.raw_prediction.as_deref(), Some(""));
        assert_eq!(cot.has_answer_tags, Some(false));
    }

    #[test]
    fn test_result_serializes_with_artifact_field_names() {
        let sample = EvaluationSample::new(3, "q", "", "ref");
        let result = EvaluationResult::completed(&sample, "ans".into(), 1.5)
            .with_extraction("<answer>ans</answer>".into(), true);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["inference_time"], 1.5);
        assert_eq!(json["has_answer_tags"], true);
        assert_eq!(json["raw_prediction"], "<answer>ans</answer>");
        assert!(json.get("error").is_none());

        let zero_shot = serde_json::to_value(EvaluationResult::completed(&sample, "a".into(), 0.1)).unwrap();
        assert!(zero_shot.get("raw_prediction").is_none());
        assert!(zero_shot.get("has_answer_tags").is_none());
    }
}
