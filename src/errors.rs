use thiserror::Error;

/// Errors raised while building a comparison configuration.
///
/// These are programmer errors in the comparison setup. They surface before any
/// traversal starts and are never mixed with structural mismatches.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Expression {expression} cannot be used to select a member: {reason}")]
    UnsupportedSelector { expression: String, reason: String },

    #[error("an empty expression cannot be used to select a member")]
    EmptySelector,

    #[error("the maximum recursion depth must be at least 1, got {0}")]
    InvalidDepth(usize),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A failed equivalency assertion: the mismatches found and the rendered report.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EquivalencyFailure {
    pub mismatches: Vec<crate::reporter::Mismatch>,
    pub message: String,
}
