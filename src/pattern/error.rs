// Fri Oct 16 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("Pattern too short: {0} bytes")]
    PatternTooShort(usize),
}
