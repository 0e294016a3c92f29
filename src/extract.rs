//! Recovery of the final answer from chain-of-thought output.

use regex::Regex;

use crate::prompt::DEFAULT_ANSWER_TAG;

/// Answer recovered from raw model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub answer: String,
    /// `false` when no complete tag pair was found and `answer` is the whole
    /// (trimmed) output.
    pub has_tags: bool,
}

/// Extracts the contents of the first `<tag>...</tag>` pair.
///
/// Reasoning blocks in other tags are ignored. Output without a complete
/// pair falls back to the trimmed text.
#[derive(Debug, Clone)]
pub struct AnswerExtractor {
    pattern: Regex,
}

impl AnswerExtractor {
    pub fn new(tag: &str) -> Self {
        let tag = regex::escape(tag);
        let pattern = Regex::new(&format!("(?s)<{tag}>(.*?)</{tag}>"))
            .expect("escaped answer tag is a valid pattern");
        Self { pattern }
    }

    pub fn extract(&self, raw: &str) -> Extraction {
        match self.pattern.captures(raw).and_then(|caps| caps.get(1)) {
            Some(inner) => Extraction {
                answer: inner.as_str().trim().to_string(),
                has_tags: true,
            },
            None => Extraction {
                answer: raw.trim().to_string(),
                has_tags: false,
            },
        }
    }
}

impl Default for AnswerExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ANSWER_TAG)
    }
}

/// Extracts an answer using the default `<answer>` tags.
pub fn extract_answer(raw: &str) -> (String, bool) {
    let Extraction { answer, has_tags } = AnswerExtractor::default().extract(raw);
    (answer, has_tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("<answer>X</answer>", "X", true)]
    #[case("plain text", "plain text", false)]
    #[case("<answer>A</answer><answer>B</answer>", "A", true)]
    #[case("  \n padded \n ", "padded", false)]
    #[case("<answer>\n  multi\n  line\n</answer>", "multi\n  line", true)]
    #[case("<answer>unclosed", "<answer>unclosed", false)]
    #[case("</answer>reversed<answer>", "</answer>reversed<answer>", false)]
    #[case("<answer></answer>", "", true)]
    fn test_extract_answer(#[case] raw: &str, #[case] answer: &str, #[case] has_tags: bool) {
        assert_eq!(extract_answer(raw), (answer.to_string(), has_tags));
    }

    #[test]
    fn test_reasoning_block_is_ignored() {
        let raw = "<reasoning>\nCough and slippery pulse suggest phlegm-heat.\n</reasoning>\n\n\
                   <answer>\nPhlegm-heat obstructing the lung.\n</answer>";
        assert_eq!(
            extract_answer(raw),
            ("Phlegm-heat obstructing the lung.".to_string(), true)
        );
    }

    #[test]
    fn test_custom_tag_is_escaped() {
        let extractor = AnswerExtractor::new("答案");
        let got = extractor.extract("<思考过程>想</思考过程><答案> 痰热壅肺证 </答案>");
        assert_eq!(got.answer, "痰热壅肺证");
        assert!(got.has_tags);

        let dotted = AnswerExtractor::new("a.b");
        assert!(!dotted.extract("<aXb>no</aXb>").has_tags);
        assert!(dotted.extract("<a.b>yes</a.b>").has_tags);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let raw = String::from("<answer> keep </answer>");
        let _ = extract_answer(&raw);
        assert_eq!(raw, "<answer> keep </answer>");
    }

    proptest! {
        #[test]
        fn prop_untagged_text_falls_back_and_is_idempotent(text in "[^<>]{0,64}") {
            let (answer, has_tags) = extract_answer(&text);
            prop_assert!(!has_tags);
            prop_assert_eq!(&answer, text.trim());
            prop_assert_eq!(extract_answer(&answer), (answer.clone(), false));
        }
    }
}
