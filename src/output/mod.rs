// Sat Oct 17 2026 - Alex

pub mod exporter;

pub use exporter::{module_stem, sanitize_identifier, ExportFormat, OffsetExporter, OutputError, DEFAULT_NAMESPACE};
