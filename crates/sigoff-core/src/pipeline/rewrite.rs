//! Offset field rewriting

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Build identifier written into the trailing comment of every rewritten line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
    comment: String,
}

impl VersionTag {
    /// Accepts either the bare tag (`1_5_73`) or the full comment (`// 1_5_73`).
    pub fn new(tag: &str) -> Result<Self> {
        let bare = tag.trim().trim_start_matches("//").trim();
        if bare.is_empty() {
            return Err(Error::Config("Version tag is empty".to_string()));
        }
        if bare.contains(['\n', '\r']) {
            return Err(Error::Config(format!(
                "Version tag must be a single line: {:?}",
                tag
            )));
        }
        Ok(Self {
            comment: format!("// {}", bare),
        })
    }

    /// The tag as written into the file, including the leading `//`.
    pub fn as_comment(&self) -> &str {
        &self.comment
    }
}

impl FromStr for VersionTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.comment)
    }
}

/// Render an offset as written into the offset field.
pub fn format_offset(offset: u64) -> String {
    format!("0x{:08X}", offset)
}

/// Rewrite the `= ...;` field and trailing `// ...` comment of a data line.
///
/// Nothing is changed when `=` or the `;` after it is missing. When only the
/// comment is missing the numeric field stays updated and an error is still
/// returned.
pub fn rewrite_offset_line(line: &mut String, offset: u64, version: &VersionTag) -> Result<()> {
    let eq = line
        .find('=')
        .ok_or_else(|| Error::LineFormat(format!("no '=' in {:?}", line)))?;
    let semi = line[eq..]
        .find(';')
        .map(|pos| eq + pos)
        .ok_or_else(|| Error::LineFormat(format!("no ';' after '=' in {:?}", line)))?;

    let field = format!("= {}", format_offset(offset));
    line.replace_range(eq..semi, &field);

    let semi = eq + field.len();
    let comment = line[semi..]
        .find("//")
        .map(|pos| semi + pos)
        .ok_or_else(|| Error::LineFormat(format!("no '//' after ';' in {:?}", line)))?;
    line.replace_range(comment.., version.as_comment());

    Ok(())
}
