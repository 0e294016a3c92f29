//! Prompt construction for zero-shot and chain-of-thought runs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;

pub const DEFAULT_SUPPLEMENT_LABEL: &str = "Supplementary information";
pub const DEFAULT_ANSWER_TAG: &str = "answer";
pub const DEFAULT_REASONING_TAG: &str = "reasoning";
const DEFAULT_PERSONA: &str = "You are a knowledgeable domain assistant.";

/// Combines an instruction with its optional supplementary input.
///
/// A blank input yields the trimmed instruction alone.
pub fn format_question(instruction: &str, input: &str, supplement_label: &str) -> String {
    let instruction = instruction.trim();
    let input = input.trim();
    if input.is_empty() {
        instruction.to_string()
    } else {
        format!("{instruction}\n\n{supplement_label}:\n{input}")
    }
}

/// The prompting strategy of one evaluation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    ZeroShot,
    Cot,
}

impl PromptMode {
    /// Directory/file stem used for this mode's artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptMode::ZeroShot => "zero_shot",
            PromptMode::Cot => "cot",
        }
    }

    /// Whether answers must be extracted from tagged output.
    pub fn extracts_answer(&self) -> bool {
        matches!(self, PromptMode::Cot)
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptMode {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "zero_shot" | "zeroshot" => Ok(PromptMode::ZeroShot),
            "cot" => Ok(PromptMode::Cot),
            _ => Err(EvalError::Config(format!("Unknown prompt mode: {s}"))),
        }
    }
}

/// Wording shared by the zero-shot and chain-of-thought prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplate {
    pub persona: String,
    pub answer_tag: String,
    pub reasoning_tag: String,
    pub supplement_label: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            answer_tag: DEFAULT_ANSWER_TAG.to_string(),
            reasoning_tag: DEFAULT_REASONING_TAG.to_string(),
            supplement_label: DEFAULT_SUPPLEMENT_LABEL.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn zero_shot(&self, full_question: &str) -> String {
        format!(
            "{persona} Answer the following question accurately and professionally.\n\n\
             {full_question}\n\n\
             Your answer:",
            persona = self.persona,
        )
    }

    /// Asks for a reasoning block followed by a short answer block, each in
    /// its own tag pair.
    pub fn cot(&self, full_question: &str) -> String {
        let reasoning = &self.reasoning_tag;
        let answer = &self.answer_tag;
        format!(
            "{persona} Analyse the following question carefully and answer it in detail.\n\n\
             {full_question}\n\n\
             Reply in exactly this format, including both tag pairs:\n\n\
             <{reasoning}>\n\
             Your analysis:\n\
             1. Identify what the question is really asking\n\
             2. Recall the relevant theory or facts\n\
             3. Derive the answer\n\
             </{reasoning}>\n\n\
             <{answer}>\n\
             A concise, accurate final answer (do not repeat the reasoning)\n\
             </{answer}>\n\n\
             Begin:",
            persona = self.persona,
        )
    }

    /// Prompt for the given mode.
    pub fn build(&self, mode: PromptMode, full_question: &str) -> String {
        match mode {
            PromptMode::ZeroShot => self.zero_shot(full_question),
            PromptMode::Cot => self.cot(full_question),
        }
    }
}
