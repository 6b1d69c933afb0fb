//! Token normalization boundary and the bundled code tokenizer.

use async_trait::async_trait;

use crate::AnalysisError;

/// Turns raw source into a normalized token sequence.
///
/// Two submissions that differ only in whitespace, layout, or comments must
/// normalize to identical token sequences; the lexical fingerprint is built
/// on that invariant.
#[async_trait]
pub trait Normalizer: Send + Sync {
    async fn normalize(&self, source: &str, language: &str) -> Result<Vec<String>, AnalysisError>;
}

/// Deterministic local tokenizer.
///
/// Strips line comments (`#` for Python, `//` elsewhere) and `/* */` block
/// comments, keeps string literals intact, and splits the remainder into
/// word tokens (`[A-Za-z0-9_]+` runs) and single-character punctuation
/// tokens. Whitespace never produces a token, so formatting-only edits are
/// invisible to the output.
#[derive(Debug, Default, Clone)]
pub struct CodeNormalizer;

impl CodeNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn tokenize(source: &str, language: &str) -> Vec<String> {
        let hash_comments = matches!(language, "python" | "ruby" | "shell");
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut chars = source.chars().peekable();

        while let Some(ch) = chars.next() {
            // Line comments run to end of line.
            if (ch == '#' && hash_comments)
                || (ch == '/' && !hash_comments && chars.peek() == Some(&'/'))
            {
                Self::flush(&mut word, &mut tokens);
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }
            // Block comments, non-nesting.
            if ch == '/' && !hash_comments && chars.peek() == Some(&'*') {
                Self::flush(&mut word, &mut tokens);
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                continue;
            }
            // String literals are preserved as single tokens, quotes included.
            if ch == '"' || ch == '\'' {
                Self::flush(&mut word, &mut tokens);
                let quote = ch;
                let mut literal = String::new();
                literal.push(quote);
                while let Some(c) = chars.next() {
                    literal.push(c);
                    if c == '\\' {
                        if let Some(escaped) = chars.next() {
                            literal.push(escaped);
                        }
                        continue;
                    }
                    if c == quote {
                        break;
                    }
                }
                tokens.push(literal);
                continue;
            }
            if ch.is_alphanumeric() || ch == '_' {
                word.push(ch);
                continue;
            }
            Self::flush(&mut word, &mut tokens);
            if !ch.is_whitespace() {
                tokens.push(ch.to_string());
            }
        }
        Self::flush(&mut word, &mut tokens);
        tokens
    }

    fn flush(word: &mut String, tokens: &mut Vec<String>) {
        if !word.is_empty() {
            tokens.push(std::mem::take(word));
        }
    }
}

#[async_trait]
impl Normalizer for CodeNormalizer {
    async fn normalize(&self, source: &str, language: &str) -> Result<Vec<String>, AnalysisError> {
        Ok(Self::tokenize(source, language))
    }
}
