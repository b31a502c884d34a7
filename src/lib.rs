// Sat Oct 17 2026 - Alex

pub mod config;
pub mod finders;
pub mod memory;
pub mod orchestration;
pub mod output;
pub mod pattern;
pub mod ui;
pub mod utils;
pub mod xref;

pub use config::{ModuleSpec, ScanConfig};
pub use finders::ConVarFinder;
pub use memory::{Address, Image, MemoryReader};
pub use orchestration::{ScanCoordinator, ScanReport};
pub use output::OffsetExporter;
pub use pattern::{Pattern, PatternMatcher};
pub use xref::ReferenceResolver;
