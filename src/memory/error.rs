// Fri Oct 16 2026 - Alex

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Binary parse error: {0}")]
    BinaryParseError(String),
    #[error("SizeOfImage is 0, wrong architecture or corrupt image")]
    EmptyImage,
    #[error("Image has no sections")]
    NoSections,
    #[error("Out of bounds: address 0x{0:x} not in image")]
    OutOfBounds(u64),
    #[error("Dereference chain broken at step {step} (address 0x{address:x})")]
    DereferenceChainBroken { step: usize, address: u64 },
}

impl MemoryError {
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            MemoryError::Io(_)
                | MemoryError::BinaryParseError(_)
                | MemoryError::EmptyImage
                | MemoryError::NoSections
        )
    }
}
