//! Reading samples and writing evaluation artifacts.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::metrics::MetricsSummary;
use crate::prompt::{format_question, DEFAULT_SUPPLEMENT_LABEL};
use crate::sample::{EvaluationResult, EvaluationSample};

/// On-disk sample record; `full_question` may be absent.
#[derive(Deserialize)]
struct SampleRecord {
    id: i64,
    instruction: String,
    #[serde(default)]
    input: String,
    output: String,
    #[serde(default)]
    full_question: Option<String>,
}

impl SampleRecord {
    fn into_sample(self, supplement_label: &str) -> EvaluationSample {
        let full_question = self
            .full_question
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| format_question(&self.instruction, &self.input, supplement_label));
        EvaluationSample {
            id: self.id,
            instruction: self.instruction,
            input: self.input,
            output: self.output,
            full_question,
        }
    }
}

/// Loads samples from a JSON array or a JSON Lines file.
pub fn load_samples(path: &Path) -> Result<Vec<EvaluationSample>, EvalError> {
    load_samples_with_label(path, DEFAULT_SUPPLEMENT_LABEL)
}

/// Like [`load_samples`], deriving missing `full_question`s with the given
/// supplement label.
pub fn load_samples_with_label(
    path: &Path,
    supplement_label: &str,
) -> Result<Vec<EvaluationSample>, EvalError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        EvalError::InputFormat(format!("cannot read {}: {err}", path.display()))
    })?;

    let records = if is_json_lines(path, &contents) {
        parse_json_lines(&contents)
    } else {
        serde_json::from_str::<Vec<SampleRecord>>(&contents)
            .map_err(|err| EvalError::InputFormat(format!("{}: {err}", path.display())))
    }?;

    if records.is_empty() {
        return Err(EvalError::InputFormat(format!(
            "{} contains no samples",
            path.display()
        )));
    }

    let mut seen = HashSet::with_capacity(records.len());
    let samples = records
        .into_iter()
        .map(|record| {
            if !seen.insert(record.id) {
                return Err(EvalError::InputFormat(format!(
                    "{}: duplicate sample id {}",
                    path.display(),
                    record.id
                )));
            }
            Ok(record.into_sample(supplement_label))
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

fn is_json_lines(path: &Path, contents: &str) -> bool {
    path.extension().is_some_and(|ext| ext == "jsonl")
        || contents.trim_start().starts_with('{')
}

fn parse_json_lines(contents: &str) -> Result<Vec<SampleRecord>, EvalError> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line)
                .map_err(|err| EvalError::InputFormat(format!("line {}: {err}", idx + 1)))
        })
        .collect()
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), EvalError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Writes results as a pretty-printed JSON array, creating parent directories.
pub fn save_results(path: &Path, results: &[EvaluationResult]) -> Result<(), EvalError> {
    write_pretty(path, results)
}

pub fn load_results(path: &Path) -> Result<Vec<EvaluationResult>, EvalError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|err| EvalError::InputFormat(format!("{}: {err}", path.display())))
}

pub fn save_metrics(path: &Path, summary: &MetricsSummary) -> Result<(), EvalError> {
    write_pretty(path, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::calculate_all_metrics;

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "eval.json",
            r#"[
                {"id": 2, "instruction": "What is qi?", "output": "Vital energy"},
                {"id": 1, "instruction": "Diagnose.", "input": "Dry cough", "output": "Lung yin deficiency",
                 "full_question": "Custom question"}
            ]"#,
        );

        let samples = load_samples(&path).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, 2);
        assert_eq!(samples[0].input, "");
        assert_eq!(samples[0].full_question, "What is qi?");
        assert_eq!(samples[1].full_question, "Custom question");
    }

    #[test]
    fn test_load_json_lines_with_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "eval.jsonl",
            "{\"id\": 1, \"instruction\": \"Diagnose.\", \"input\": \"Fever\", \"output\": \"Heat\"}\n\n\
             {\"id\": 2, \"instruction\": \"Treat.\", \"output\": \"Clear heat\"}\n",
        );

        let samples = load_samples_with_label(&path, "补充信息").unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].full_question, "Diagnose.\n\n补充信息:\nFever");
        assert_eq!(samples[1].full_question, "Treat.");
    }

    #[test]
    fn test_rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_samples(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(EvalError::InputFormat(_))));

        let malformed = write(&dir, "bad.json", "[{\"id\": 1,");
        assert!(matches!(load_samples(&malformed), Err(EvalError::InputFormat(_))));

        let no_output = write(&dir, "no_output.json", r#"[{"id": 1, "instruction": "q"}]"#);
        let err = load_samples(&no_output).unwrap_err();
        assert!(err.to_string().contains("output"));

        let duplicate = write(
            &dir,
            "dup.json",
            r#"[{"id": 1, "instruction": "a", "output": "x"},
                {"id": 1, "instruction": "b", "output": "y"}]"#,
        );
        let err = load_samples(&duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate sample id 1"));

        let bad_line = write(&dir, "bad.jsonl", "{\"id\": 1, \"instruction\": \"a\", \"output\": \"x\"}\nnope\n");
        let err = load_samples(&bad_line).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_empty_collections_are_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let array = write(&dir, "empty.json", "[]");
        let err = load_samples(&array).unwrap_err();
        assert!(matches!(err, EvalError::InputFormat(_)));
        assert!(err.to_string().contains("no samples"));

        let lines = write(&dir, "blank.jsonl", "\n  \n\n");
        assert!(matches!(load_samples(&lines), Err(EvalError::InputFormat(_))));
    }

    #[test]
    fn test_results_and_metrics_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sample = EvaluationSample::new(1, "问题", "", "清热化痰");
        let results = vec![
            EvaluationResult::completed(&sample, "清热化痰".into(), 0.25)
                .with_extraction("<answer>清热化痰</answer>".into(), true),
            EvaluationResult::failed(&sample, "timeout", true),
        ];

        let predictions = dir.path().join("cot").join("predictions.json");
        save_results(&predictions, &results).unwrap();
        let text = fs::read_to_string(&predictions).unwrap();
        assert!(text.contains("清热化痰"), "non-ASCII must not be escaped");
        assert!(text.contains("\"inference_time\": 0.25"));
        assert_eq!(load_results(&predictions).unwrap(), results);

        let metrics_path = dir.path().join("cot").join("metrics.json");
        let summary = calculate_all_metrics(&results);
        save_metrics(&metrics_path, &summary).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&metrics_path).unwrap()).unwrap();
        assert_eq!(value["total_samples"], 2);
        assert_eq!(value["exact_match"], 0.5);
        assert!(value["rouge_scores"].get("rouge-2").is_some());
    }
}
