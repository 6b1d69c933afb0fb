//! AST histogram boundary and the bundled token-class extractor.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::normalize::CodeNormalizer;
use crate::AnalysisError;

/// Occurrence count per syntax-node type. `BTreeMap` keeps serialization and
/// iteration order deterministic.
pub type AstHistogram = BTreeMap<String, u32>;

/// Produces a structural fingerprint of a submission: how many of each
/// interesting node type its parse tree contains.
#[async_trait]
pub trait AstExtractor: Send + Sync {
    async fn ast_histogram(
        &self,
        source: &str,
        language: &str,
    ) -> Result<AstHistogram, AnalysisError>;
}

/// Deterministic local extractor that approximates an AST histogram from
/// token classes.
///
/// Keywords keep their spelling (`kw:if`, `kw:return`), identifiers and
/// literals collapse into class buckets, and punctuation keeps its glyph
/// (`op:+`). Renaming identifiers or swapping literal values therefore leaves
/// the histogram unchanged, while statement-level edits shift the counts.
#[derive(Debug, Default, Clone)]
pub struct TokenClassExtractor;

const KEYWORDS: &[&str] = &[
    // shared / python
    "def", "return", "if", "elif", "else", "for", "while", "in", "not", "and", "or", "class",
    "import", "from", "pass", "break", "continue", "lambda", "try", "except", "finally", "with",
    "yield", "None", "True", "False",
    // c-family / rust / js
    "fn", "let", "mut", "const", "var", "function", "int", "float", "double", "char", "void",
    "struct", "enum", "match", "loop", "pub", "use", "new", "switch", "case", "default", "do",
    "static", "null", "true", "false",
];

impl TokenClassExtractor {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn classify_token(token: &str) -> String {
        if KEYWORDS.contains(&token) {
            return format!("kw:{token}");
        }
        let mut chars = token.chars();
        match chars.next() {
            Some(c) if c.is_ascii_digit() => "literal:number".to_string(),
            Some('"') | Some('\'') => "literal:string".to_string(),
            Some(c) if c.is_alphanumeric() || c == '_' => "identifier".to_string(),
            _ => format!("op:{token}"),
        }
    }
}

#[async_trait]
impl AstExtractor for TokenClassExtractor {
    async fn ast_histogram(
        &self,
        source: &str,
        language: &str,
    ) -> Result<AstHistogram, AnalysisError> {
        let tokens = CodeNormalizer::tokenize(source, language);
        if tokens.is_empty() {
            return Err(AnalysisError::Unparseable {
                language: language.to_string(),
                reason: "no tokens in source".to_string(),
            });
        }
        let mut histogram = AstHistogram::new();
        for token in &tokens {
            *histogram.entry(Self::classify_token(token)).or_insert(0) += 1;
        }
        Ok(histogram)
    }
}
