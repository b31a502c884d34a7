// Sat Oct 17 2026 - Alex

use crate::memory::{Image, MemoryError};

/// Produces the image for a configured module path. Shared by every worker
/// thread of a scan.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, module: &str) -> Result<Image, MemoryError>;
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for &L {
    fn load(&self, module: &str) -> Result<Image, MemoryError> {
        (**self).load(module)
    }
}

/// Maps modules from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ModuleLoader for FileLoader {
    fn load(&self, module: &str) -> Result<Image, MemoryError> {
        Image::load(module)
    }
}
