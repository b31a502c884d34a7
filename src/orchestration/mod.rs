// Sat Oct 17 2026 - Alex

pub mod coordinator;
pub mod error;
pub mod loader;
pub mod report;
pub mod worker;

pub use coordinator::ScanCoordinator;
pub use error::{ScanError, ScanFailureKind};
pub use loader::{FileLoader, ModuleLoader};
pub use report::{ModuleOffsets, ModuleOutcome, ScanReport};
pub use worker::{scan_module, Lookup, ModuleWorker};
