// Fri Oct 16 2026 - Alex

pub mod address;
pub mod error;
pub mod image;
pub mod traits;

pub use address::{Address, Direction, FOLLOW_LIMIT};
pub use error::MemoryError;
pub use image::{Image, Section};
pub use traits::MemoryReader;
