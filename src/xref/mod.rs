// Sat Oct 17 2026 - Alex

pub mod reference;

pub use reference::{ReferenceResolver, STRING_SECTION};
