use thiserror::Error;

/// Errors from parsing a textual level such as `{alice, bob}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelParseError {
    #[error("unbalanced braces in level '{0}'")]
    UnbalancedBraces(String),

    #[error("empty principal name in level '{0}'")]
    EmptyPrincipal(String),

    #[error("invalid principal name '{0}'")]
    InvalidPrincipal(String),

    #[error("unterminated quoted principal in level '{0}'")]
    UnterminatedQuote(String),
}
