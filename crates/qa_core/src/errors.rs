//! Minimal error set for core-domain validation & parsing.

use core::fmt;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoreError {
    /// A worker name or item id that is blank after normalization.
    EmptyToken(&'static str),
    /// A capacity value that is not a non-negative integer.
    MalformedCapacity { worker: String, raw: String },
    /// A configuration value outside its domain.
    DomainOutOfRange(&'static str),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::EmptyToken(k) => write!(f, "empty {k}"),
            CoreError::MalformedCapacity { worker, raw } => {
                write!(f, "malformed capacity for {worker}: {raw:?}")
            }
            CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
        }
    }
}

impl std::error::Error for CoreError {}
