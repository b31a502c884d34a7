// Sat Oct 17 2026 - Alex

pub mod cli;
pub mod spinner;

pub use cli::{Args, Command, CommandHandler};
pub use spinner::ScanSpinner;
