//! Formatting errors.

use std::fmt;

use reltime_i18n::I18nError;

/// Errors surfaced by formatting and instant normalization.
///
/// Both variants are programmer errors: formatting is pure, so retrying
/// with the same inputs fails the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Locale lookup or registration failed.
    Configuration(I18nError),
    /// A raw time value could not be normalized to an instant.
    Argument(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "configuration error: {e}"),
            Self::Argument(msg) => write!(f, "invalid argument: {msg}"),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            Self::Argument(_) => None,
        }
    }
}

impl From<I18nError> for FormatError {
    fn from(e: I18nError) -> Self {
        Self::Configuration(e)
    }
}
