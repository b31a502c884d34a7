// Fri Oct 16 2026 - Alex

use crate::memory::{Address, MemoryError};

/// Bounds-checked reads over absolute addresses.
pub trait MemoryReader: Send + Sync {
    fn read_bytes(&self, addr: Address, len: usize) -> Result<&[u8], MemoryError>;
    fn pointer_width(&self) -> usize;
    fn base_address(&self) -> Address;

    fn read_u8(&self, addr: Address) -> Result<u8, MemoryError> {
        let bytes = self.read_bytes(addr, 1)?;
        Ok(bytes[0])
    }

    fn read_u32(&self, addr: Address) -> Result<u32, MemoryError> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&self, addr: Address) -> Result<u64, MemoryError> {
        let bytes = self.read_bytes(addr, 8)?;
        Ok(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]))
    }

    fn read_ptr(&self, addr: Address) -> Result<Address, MemoryError> {
        if self.pointer_width() == 8 {
            Ok(Address::new(self.read_u64(addr)?))
        } else {
            Ok(Address::new(self.read_u32(addr)? as u64))
        }
    }
}
