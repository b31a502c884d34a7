// Fri Oct 16 2026 - Alex

use crate::memory::{MemoryError, MemoryReader};
use std::fmt;
use std::ops::Add;

/// Upper bound on the number of single-byte steps `followed_until` takes
/// before giving up.
pub const FOLLOW_LIMIT: usize = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    fn step(self) -> i64 {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }
}

/// A bare numeric address. It carries no knowledge of the image it points
/// into; every read goes through a `MemoryReader`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address {
    value: u64,
}

impl Address {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self { value: 0 }
    }

    pub fn as_u64(&self) -> u64 {
        self.value
    }

    pub fn is_null(&self) -> bool {
        self.value == 0
    }

    pub fn is_valid(&self) -> bool {
        self.value > 0 && self.value <= usize::MAX as u64
    }

    pub fn padded(&self, delta: i64) -> Self {
        Self { value: self.value.wrapping_add_signed(delta) }
    }

    /// Distance from `base`, or `None` when this address lies below it.
    pub fn offset_from(&self, base: Address) -> Option<u64> {
        self.value.checked_sub(base.value)
    }

    pub fn dereferenced(&self, count: usize, reader: &dyn MemoryReader) -> Result<Self, MemoryError> {
        let mut current = *self;

        for step in 0..count {
            if !current.is_valid() {
                return Err(MemoryError::DereferenceChainBroken { step, address: current.value });
            }

            current = reader
                .read_ptr(current)
                .map_err(|_| MemoryError::DereferenceChainBroken { step, address: current.value })?;
        }

        Ok(current)
    }

    pub fn byte_at(&self, offset: i64, reader: &dyn MemoryReader) -> Result<u8, MemoryError> {
        reader.read_u8(self.padded(offset))
    }

    /// Steps one byte at a time in `direction` until the byte under the cursor
    /// equals `target`. The starting byte itself is never tested. Returns a
    /// null address when validity is lost, the image boundary is crossed or
    /// `FOLLOW_LIMIT` is reached.
    pub fn followed_until(&self, target: u8, direction: Direction, reader: &dyn MemoryReader) -> Self {
        let mut current = *self;

        for _ in 0..FOLLOW_LIMIT {
            current = current.padded(direction.step());
            if !current.is_valid() {
                return Self::zero();
            }

            match reader.read_u8(current) {
                Ok(byte) if byte == target => return current,
                Ok(_) => {}
                Err(_) => return Self::zero(),
            }
        }

        Self::zero()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.value)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value, f)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.value, f)
    }
}

impl Add<u64> for Address {
    type Output = Self;
    fn add(self, rhs: u64) -> Self::Output {
        Self { value: self.value.wrapping_add(rhs) }
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.value
    }
}
