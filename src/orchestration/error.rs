// Sat Oct 17 2026 - Alex

use crate::memory::MemoryError;
use crate::pattern::PatternError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanFailureKind {
    Load,
    NotFound,
    Dereference,
    InvalidPattern,
    Panicked,
}

impl fmt::Display for ScanFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanFailureKind::Load => "load",
            ScanFailureKind::NotFound => "not found",
            ScanFailureKind::Dereference => "dereference",
            ScanFailureKind::InvalidPattern => "invalid pattern",
            ScanFailureKind::Panicked => "panicked",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to load {module}: {source}")]
    Load {
        module: String,
        #[source]
        source: MemoryError,
    },
    #[error("{module}: {entry} not found: {reason}")]
    NotFound {
        module: String,
        entry: String,
        reason: String,
    },
    #[error("{module}: {entry} dereference failed: {source}")]
    Dereference {
        module: String,
        entry: String,
        #[source]
        source: MemoryError,
    },
    #[error("{module}: {entry} has an invalid pattern: {source}")]
    InvalidPattern {
        module: String,
        entry: String,
        #[source]
        source: PatternError,
    },
    #[error("Worker for {module} panicked: {message}")]
    Panicked { module: String, message: String },
}

impl ScanError {
    pub fn kind(&self) -> ScanFailureKind {
        match self {
            ScanError::Load { .. } => ScanFailureKind::Load,
            ScanError::NotFound { .. } => ScanFailureKind::NotFound,
            ScanError::Dereference { .. } => ScanFailureKind::Dereference,
            ScanError::InvalidPattern { .. } => ScanFailureKind::InvalidPattern,
            ScanError::Panicked { .. } => ScanFailureKind::Panicked,
        }
    }

    pub fn module(&self) -> &str {
        match self {
            ScanError::Load { module, .. }
            | ScanError::NotFound { module, .. }
            | ScanError::Dereference { module, .. }
            | ScanError::InvalidPattern { module, .. }
            | ScanError::Panicked { module, .. } => module,
        }
    }

    pub fn entry(&self) -> Option<&str> {
        match self {
            ScanError::Load { .. } | ScanError::Panicked { .. } => None,
            ScanError::NotFound { entry, .. }
            | ScanError::Dereference { entry, .. }
            | ScanError::InvalidPattern { entry, .. } => Some(entry),
        }
    }
}
