//! Annotation header recognition

/// Annotation found in a comment, e.g. `// IndirectSig: E8 ?? ?? ?? ?? 48 8B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation<'l> {
    pub tag: &'l str,
    pub signature: &'l str,
    /// 1-based line number of the header
    pub line: usize,
}

/// Split a line into the type tag and signature text of its trailing comment.
///
/// The tag starts after `//` and any spaces and runs up to the next `:`. The
/// signature is the rest of the line after that `:` and any spaces. Returns
/// `None` when the line has no comment or the comment has no tag.
pub fn parse_annotation(line: &str) -> Option<(&str, &str)> {
    let comment = &line[line.find("//")? + 2..];
    let comment = comment.trim_start_matches(' ');

    let colon = comment.find(':')?;
    let tag = &comment[..colon];
    if tag.is_empty() {
        return None;
    }

    let signature = comment[colon + 1..].trim_start_matches(' ');
    Some((tag, signature))
}

impl<'l> Annotation<'l> {
    pub fn parse(text: &'l str, line: usize) -> Option<Self> {
        parse_annotation(text).map(|(tag, signature)| Self {
            tag,
            signature,
            line,
        })
    }
}
