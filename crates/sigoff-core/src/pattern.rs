//! Signature text compilation
//!
//! A signature is a whitespace-separated list of tokens. Each token is either a
//! two-digit hex byte (`48`, `8b`) or a run of question marks (`?`, `??`) that
//! stands for exactly one wildcard byte.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Compiled signature. `None` positions match any byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    bytes: Vec<Option<u8>>,
}

impl Pattern {
    /// Compile signature text into a pattern.
    pub fn parse(signature: &str) -> Result<Self> {
        let bytes = parse_pattern(signature)?;
        Ok(Self { bytes })
    }

    /// Build a pattern with no wildcard positions.
    pub fn exact(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::PatternParse("Signature pattern is empty".to_string()));
        }
        Ok(Self {
            bytes: bytes.iter().copied().map(Some).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false for a compiled pattern; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[Option<u8>] {
        &self.bytes
    }

    pub fn is_wildcard(&self, index: usize) -> bool {
        self.bytes[index].is_none()
    }

    /// True when the two positions can never disagree on a haystack byte.
    pub(crate) fn compatible(&self, a: usize, b: usize) -> bool {
        match (self.bytes[a], self.bytes[b]) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        }
    }

    pub(crate) fn matches_byte(&self, index: usize, byte: u8) -> bool {
        self.bytes[index].is_none_or(|value| value == byte)
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_pattern(&self.bytes))
    }
}

pub fn parse_pattern(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token.bytes().all(|b| b == b'?') {
            bytes.push(None);
            continue;
        }

        if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::PatternParse(format!(
                "Invalid signature token '{}': expected two hex digits or '?'",
                token
            )));
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::PatternParse(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::PatternParse("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_pattern(bytes: &[Option<u8>]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
