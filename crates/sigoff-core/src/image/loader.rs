//! Loading a code section from disk

use std::fs;
use std::path::Path;

use object::{Object, ObjectSection};
use tracing::{debug, info};

use super::CodeSection;
use crate::error::{Error, Result};

/// Default code section name for PE and ELF images
pub const DEFAULT_SECTION: &str = ".text";

impl CodeSection {
    /// Load the named section of a PE, ELF or Mach-O file.
    pub fn from_object_file<P: AsRef<Path>>(path: P, section_name: &str) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let section = Self::from_object_bytes(&data, section_name)?;
        info!(
            "Loaded {} from {} ({:#x} bytes at {:#x}, module base {:#x})",
            section_name,
            path.display(),
            section.len(),
            section.base_address(),
            section.module_base()
        );
        Ok(section)
    }

    pub fn from_object_bytes(data: &[u8], section_name: &str) -> Result<Self> {
        let file = object::File::parse(data).map_err(|e| Error::Image(e.to_string()))?;
        let module_base = file.relative_address_base();

        let section = file
            .section_by_name(section_name)
            .ok_or_else(|| Error::Image(format!("Section '{}' not found", section_name)))?;
        let bytes = section
            .data()
            .map_err(|e| Error::Image(format!("Failed to read '{}': {}", section_name, e)))?;

        debug!(
            "Section {}: address={:#x} size={:#x} file_size={:#x}",
            section_name,
            section.address(),
            section.size(),
            bytes.len()
        );

        Ok(Self::new(bytes.to_vec(), section.address(), module_base))
    }

    /// Load a raw dump of a code section mapped at `base_address`.
    pub fn from_raw_file<P: AsRef<Path>>(
        path: P,
        base_address: u64,
        module_base: u64,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        if module_base > base_address {
            return Err(Error::Image(format!(
                "Module base {:#x} lies above section base {:#x}",
                module_base, base_address
            )));
        }
        info!(
            "Loaded raw section from {} ({:#x} bytes at {:#x})",
            path.display(),
            bytes.len(),
            base_address
        );
        Ok(Self::new(bytes, base_address, module_base))
    }
}
