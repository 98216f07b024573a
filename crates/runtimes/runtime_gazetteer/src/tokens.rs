//! Tokenization shared by dictionary phrases and request text

use std::ops::Range;

/// Byte range of one token in the source text.
pub type Token = Range<usize>;

/// Split `text` into tokens: runs of alphanumeric characters, and every other
/// non-whitespace character on its own.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        if ch.is_alphanumeric() {
            word_start.get_or_insert(idx);
            continue;
        }
        if let Some(start) = word_start.take() {
            tokens.push(start..idx);
        }
        if !ch.is_whitespace() {
            tokens.push(idx..idx + ch.len_utf8());
        }
    }
    if let Some(start) = word_start {
        tokens.push(start..text.len());
    }

    tokens
}

/// Token strings, lowercased unless `case_sensitive`.
pub fn normalized(text: &str, tokens: &[Token], case_sensitive: bool) -> Vec<String> {
    tokens
        .iter()
        .map(|t| {
            let word = &text[t.clone()];
            if case_sensitive {
                word.to_string()
            } else {
                word.to_lowercase()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(text: &str) -> Vec<&str> {
        tokenize(text).into_iter().map(|t| &text[t]).collect()
    }

    #[test]
    fn splits_words_and_punctuation() {
        assert_eq!(
            words("Acme Corp. opened in São Paulo, 2024!"),
            vec!["Acme", "Corp", ".", "opened", "in", "São", "Paulo", ",", "2024", "!"]
        );
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(words("  New\t\nYork  "), vec!["New", "York"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn normalizes_case() {
        let text = "New YORK";
        let tokens = tokenize(text);
        assert_eq!(normalized(text, &tokens, false), vec!["new", "york"]);
        assert_eq!(normalized(text, &tokens, true), vec!["New", "YORK"]);
    }
}
