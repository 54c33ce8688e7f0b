//! Hex address parsing utilities.

use anyhow::Result;

/// Parse a hex address string (with or without 0x prefix).
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
/// assert_eq!(parse_hex_address("1000").unwrap(), 0x1000);
/// assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
/// ```
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}
