use unicode_segmentation::UnicodeSegmentation;

/// Splits text into word tokens following Unicode word boundaries (UAX #29).
///
/// Whitespace is dropped, punctuation is kept as its own token. Scripts
/// written without spaces (Han, Hiragana) come out one character per token.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_word_bounds()
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

/// Lowercased alphanumeric runs, as used by ROUGE.
///
/// Words are further split at any non-alphanumeric character, so `don't`
/// gives `don`, `t` and `3.5` gives `3`, `5`. Han text is one token per
/// character.
pub fn rouge_tokens(text: &str) -> Vec<String> {
    text.unicode_words()
        .flat_map(|word| word.split(|c: char| !c.is_alphanumeric()))
        .filter(|piece| !piece.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_latin_keeps_punctuation() {
        assert_eq!(
            tokenize("Clear heat, resolve phlegm."),
            vec!["Clear", "heat", ",", "resolve", "phlegm", "."]
        );
    }

    #[test]
    fn test_tokenize_han_per_character() {
        assert_eq!(tokenize("痰热 壅肺"), vec!["痰", "热", "壅", "肺"]);
    }

    #[test]
    fn test_tokenize_blank() {
        assert!(tokenize(" \n\t ").is_empty());
    }

    #[test]
    fn test_rouge_tokens_lowercase_words_only() {
        assert_eq!(rouge_tokens("The Cat, the hat!"), vec!["the", "cat", "the", "hat"]);
    }

    #[test]
    fn test_rouge_tokens_split_inside_words() {
        assert_eq!(
            rouge_tokens("Don't take 3.5g of Ma-huang"),
            vec!["don", "t", "take", "3", "5g", "of", "ma", "huang"]
        );
        assert_eq!(rouge_tokens("麻黄3.5克"), vec!["麻", "黄", "3", "5", "克"]);
    }
}
