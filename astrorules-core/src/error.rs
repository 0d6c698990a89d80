use thiserror::Error;

/// Errors raised by the extraction core.
///
/// Only `InvalidSource` and `Regex` ever reach a batch caller; the other
/// variants are handled per sentence.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid source info: {0}")]
    InvalidSource(String),

    #[error("malformed capture in {pattern}: {detail}")]
    MalformedCapture {
        pattern: &'static str,
        detail: String,
    },

    #[error("rule assembly failed: {0}")]
    Assembly(String),

    #[error("regex compilation failed: {0}")]
    Regex(#[from] regex::Error),
}

impl ExtractionError {
    pub fn malformed(pattern: &'static str, detail: impl Into<String>) -> Self {
        ExtractionError::MalformedCapture {
            pattern,
            detail: detail.into(),
        }
    }
}
