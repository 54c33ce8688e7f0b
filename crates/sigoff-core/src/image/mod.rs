//! Code section haystack
//!
//! The bytes of an executable's code section together with the address the
//! section is mapped at and the base address of the containing module.

mod loader;

pub use loader::*;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct CodeSection {
    bytes: Vec<u8>,
    base_address: u64,
    module_base: u64,
}

impl CodeSection {
    pub fn new(bytes: Vec<u8>, base_address: u64, module_base: u64) -> Self {
        Self {
            bytes,
            base_address,
            module_base,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Address the first byte of the section is mapped at.
    pub fn base_address(&self) -> u64 {
        self.base_address
    }

    pub fn module_base(&self) -> u64 {
        self.module_base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute address of a section-relative offset.
    pub fn address_of(&self, offset: usize) -> u64 {
        self.base_address.wrapping_add(offset as u64)
    }

    /// Read a little-endian `i32` at a section-relative offset.
    pub fn read_i32(&self, offset: usize) -> Result<i32> {
        let bytes = offset
            .checked_add(4)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(Error::DisplacementOutOfBounds {
                offset,
                len: self.bytes.len(),
            })?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_of() {
        let section = CodeSection::new(vec![0; 16], 0x1_4000_1000, 0x1_4000_0000);
        assert_eq!(section.address_of(0), 0x1_4000_1000);
        assert_eq!(section.address_of(0x10), 0x1_4000_1010);
        assert_eq!(section.len(), 16);
        assert!(!section.is_empty());
    }

    #[test]
    fn test_read_i32_little_endian() {
        let section = CodeSection::new(vec![0xE8, 0xFB, 0xFF, 0xFF, 0xFF, 0x10], 0, 0);
        assert_eq!(section.read_i32(1).unwrap(), -5);
        assert_eq!(section.read_i32(2).unwrap(), 0x10FF_FFFF);
    }

    #[test]
    fn test_read_i32_out_of_bounds() {
        let section = CodeSection::new(vec![0xE8, 0x00, 0x00, 0x00], 0, 0);
        let err = section.read_i32(1).unwrap_err();
        assert!(matches!(
            err,
            Error::DisplacementOutOfBounds { offset: 1, len: 4 }
        ));
        assert!(section.read_i32(usize::MAX).is_err());
    }
}
