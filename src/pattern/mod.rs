// Fri Oct 16 2026 - Alex

pub mod error;
pub mod matcher;
pub mod pattern;

pub use error::PatternError;
pub use matcher::PatternMatcher;
pub use pattern::{Pattern, WILDCARD};
