//! Signature resolution
//!
//! Turns signature text into an offset inside the scanned module. The direct
//! resolver reports where the signature itself sits; the indirect resolver
//! follows the `rel32` operand of the instruction the signature starts with.

mod registry;
mod table;

pub use registry::*;
pub use table::*;

use tracing::debug;

use crate::error::{Error, Result};
use crate::image::CodeSection;
use crate::matcher::find_all;
use crate::pattern::Pattern;

/// Length of an opcode followed by a 32-bit relative operand (`call`/`jmp rel32`)
pub const REL32_INSTR_LEN: usize = 5;

/// Offset of the displacement inside that instruction
pub const REL32_DISP_OFFSET: usize = 1;

/// Locate the single occurrence of `signature` in the section.
///
/// Returns the match offset relative to the section base.
pub fn resolve_direct(signature: &str, section: &CodeSection) -> Result<u64> {
    let pattern = Pattern::parse(signature)?;
    let matches = find_all(section.bytes(), &pattern);

    match matches.as_slice() {
        [] => Err(Error::NoMatchFound {
            pattern: pattern.to_string(),
        }),
        [offset] => {
            debug!("  {} -> section+{:#x}", pattern, offset);
            Ok(*offset as u64)
        }
        _ => Err(Error::AmbiguousMatch {
            pattern: pattern.to_string(),
            count: matches.len(),
        }),
    }
}

/// Locate the single occurrence of `signature` and follow the relative
/// displacement of the instruction at the match.
///
/// Returns the branch target relative to the module base.
pub fn resolve_indirect(signature: &str, section: &CodeSection) -> Result<u64> {
    let offset = resolve_direct(signature, section)? as usize;
    let target = rel32_target(section, offset)?;

    target
        .checked_sub(section.module_base())
        .ok_or(Error::TargetBelowModuleBase {
            target,
            module_base: section.module_base(),
        })
}

/// Absolute target of the `rel32` instruction starting at `offset`.
pub fn rel32_target(section: &CodeSection, offset: usize) -> Result<u64> {
    let disp = section.read_i32(offset + REL32_DISP_OFFSET)?;
    let next_ip = section.address_of(offset + REL32_INSTR_LEN);
    let target = next_ip.wrapping_add_signed(disp as i64);

    debug!(
        "  rel32 at {:#x}: disp={:#x} -> {:#x}",
        section.address_of(offset),
        disp,
        target
    );

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT_BASE: u64 = 0x1_4000_1000;
    const MODULE_BASE: u64 = 0x1_4000_0000;

    fn section_with(chunks: &[(usize, &[u8])]) -> CodeSection {
        let mut bytes = vec![0xCCu8; 0x2000];
        for (offset, chunk) in chunks {
            bytes[*offset..*offset + chunk.len()].copy_from_slice(chunk);
        }
        CodeSection::new(bytes, TEXT_BASE, MODULE_BASE)
    }

    #[test]
    fn test_direct_unique_match() {
        let section = section_with(&[(0x1000, &[0x48, 0x8B, 0x01, 0x02, 0x90])]);
        assert_eq!(resolve_direct("48 8B ?? ?? 90", &section).unwrap(), 0x1000);
    }

    #[test]
    fn test_direct_no_match() {
        let section = section_with(&[]);
        let err = resolve_direct("48 8B ?? ?? 90", &section).unwrap_err();
        assert!(matches!(err, Error::NoMatchFound { .. }));
    }

    #[test]
    fn test_direct_ambiguous_match() {
        let sig: &[u8] = &[0x48, 0x8B, 0x05, 0x11, 0x22];
        let section = section_with(&[(0x100, sig), (0x1800, sig)]);
        let err = resolve_direct("48 8B 05 ?? ??", &section).unwrap_err();
        assert!(matches!(err, Error::AmbiguousMatch { count: 2, .. }));
    }

    #[test]
    fn test_direct_propagates_parse_error() {
        let section = section_with(&[]);
        let err = resolve_direct("48 ZZ", &section).unwrap_err();
        assert!(matches!(err, Error::PatternParse(_)));
    }

    #[test]
    fn test_indirect_forward_call() {
        // call +0x200 at section offset 0x40
        let section = section_with(&[(0x40, &[0xE8, 0x00, 0x02, 0x00, 0x00, 0x48, 0x89, 0xC3])]);
        let offset = resolve_indirect("E8 ?? ?? ?? ?? 48 89 C3", &section).unwrap();
        // (TEXT_BASE + 0x40 + 5 + 0x200) - MODULE_BASE
        assert_eq!(offset, 0x1000 + 0x40 + 5 + 0x200);
    }

    #[test]
    fn test_indirect_backward_jump() {
        // jmp -0x30 at section offset 0x400
        let disp = (-0x30i32).to_le_bytes();
        let section = section_with(&[(
            0x400,
            &[0xE9, disp[0], disp[1], disp[2], disp[3], 0x0F, 0x1F],
        )]);
        let offset = resolve_indirect("E9 ?? ?? ?? ?? 0F 1F", &section).unwrap();
        assert_eq!(offset, 0x1000 + 0x400 + 5 - 0x30);
    }

    #[test]
    fn test_indirect_propagates_direct_errors() {
        let section = section_with(&[]);
        let err = resolve_indirect("E8 ?? ?? ?? ?? 48 89 C3", &section).unwrap_err();
        assert!(matches!(err, Error::NoMatchFound { .. }));
    }

    #[test]
    fn test_indirect_displacement_past_end() {
        let mut bytes = vec![0xCCu8; 0x10];
        bytes[0x0E] = 0xE8;
        bytes[0x0F] = 0x01;
        let section = CodeSection::new(bytes, TEXT_BASE, MODULE_BASE);
        let err = resolve_indirect("E8 01", &section).unwrap_err();
        assert!(matches!(err, Error::DisplacementOutOfBounds { offset: 0x0F, .. }));
    }

    #[test]
    fn test_indirect_target_below_module_base() {
        let disp = (-0x2000i32).to_le_bytes();
        let section = section_with(&[(0, &[0xE8, disp[0], disp[1], disp[2], disp[3], 0x5D])]);
        let err = resolve_indirect("E8 ?? ?? ?? ?? 5D", &section).unwrap_err();
        assert!(matches!(err, Error::TargetBelowModuleBase { .. }));
    }
}
