//! Address table resolver
//!
//! Maps stable identifiers to module-relative offsets. Annotations using it
//! carry an identifier instead of a byte signature:
//!
//! ```text
//! // TableSig: 514960
//! PlayerCharacter = 0x02F26EF8; // 1_5_72
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Resolve;
use crate::error::{Error, Result};

/// Tag the table resolver is registered under
pub const TABLE_TAG: &str = "TableSig";

/// Offset value as it appears in the table file: a JSON number or a hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableValue", into = "TableValue")]
pub struct TableOffset(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TableValue {
    Number(u64),
    Text(String),
}

impl TryFrom<TableValue> for TableOffset {
    type Error = String;

    fn try_from(value: TableValue) -> std::result::Result<Self, Self::Error> {
        match value {
            TableValue::Number(n) => Ok(TableOffset(n)),
            TableValue::Text(s) => {
                let hex = s.trim_start_matches("0x").trim_start_matches("0X");
                u64::from_str_radix(hex, 16)
                    .map(TableOffset)
                    .map_err(|e| format!("Invalid hex offset '{}': {}", s, e))
            }
        }
    }
}

impl From<TableOffset> for TableValue {
    fn from(offset: TableOffset) -> Self {
        TableValue::Text(format!("0x{:X}", offset.0))
    }
}

/// Identifier to offset table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressTable {
    entries: BTreeMap<String, TableOffset>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, offset: u64) {
        self.entries.insert(id.into(), TableOffset(offset));
    }

    pub fn get(&self, id: &str) -> Option<u64> {
        self.entries.get(id).map(|offset| offset.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Resolve for AddressTable {
    fn resolve(&self, signature: &str) -> Result<u64> {
        let id = signature.trim();
        let offset = self
            .get(id)
            .ok_or_else(|| Error::UnknownSymbol(id.to_string()))?;
        debug!("  table {} -> {:#x}", id, offset);
        Ok(offset)
    }
}

pub fn load_address_table<P: AsRef<Path>>(path: P) -> Result<AddressTable> {
    let content = fs::read_to_string(&path)?;
    let table: AddressTable = serde_json::from_str(&content)?;
    debug!(
        "Loaded address table from {} ({} entries)",
        path.as_ref().display(),
        table.len()
    );
    Ok(table)
}

pub fn save_address_table<P: AsRef<Path>>(path: P, table: &AddressTable) -> Result<()> {
    let content = serde_json::to_string_pretty(table)?;
    fs::write(path, content)?;
    Ok(())
}
