//! Parse errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TypesError {
    #[error("invalid identifier '{0}'")]
    InvalidId(String),

    #[error("invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("timestamp {0} is outside the supported calendar range")]
    OutOfRange(u64),
}
