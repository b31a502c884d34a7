// Sat Oct 17 2026 - Alex

pub mod convar;
pub mod error;

pub use convar::ConVarFinder;
pub use error::FinderError;
