//! Annotated offsets file rewriting
//!
//! The input is copied to the output line by line. A line whose trailing
//! comment names a registered resolver (`// DirectSig: 48 8B ?? ?? 90`) is
//! resolved, and on success the line right after it has its `= 0x...;` field
//! and trailing version comment rewritten:
//!
//! ```text
//! // DirectSig: 48 8B ?? ?? 90
//! foo = 0x00001000; // 1_5_73
//! ```
//!
//! Everything else, including lines following a failed resolution, is copied
//! byte for byte.

mod annotation;
mod report;
mod rewrite;

pub use annotation::*;
pub use report::*;
pub use rewrite::*;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::resolver::{Resolve, ResolverRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    /// Set after header `index` in the report resolved to `offset`
    AwaitingDataLine { index: usize, offset: u64 },
}

pub struct AnnotationPipeline<'r> {
    registry: &'r ResolverRegistry<'r>,
    version: &'r VersionTag,
}

impl<'r> AnnotationPipeline<'r> {
    pub fn new(registry: &'r ResolverRegistry<'r>, version: &'r VersionTag) -> Self {
        Self { registry, version }
    }

    /// Rewrite `input` into `output`.
    ///
    /// The input is opened before the output is created, so a missing input
    /// never leaves an empty output behind.
    pub fn run_files(&self, input: &Path, output: &Path) -> Result<ScanReport> {
        let reader = File::open(input).map_err(|source| Error::StreamOpen {
            path: input.to_path_buf(),
            source,
        })?;
        let writer = File::create(output).map_err(|source| Error::StreamOpen {
            path: output.to_path_buf(),
            source,
        })?;

        info!("Scanning {} -> {}", input.display(), output.display());

        let mut writer = BufWriter::new(writer);
        let report = self.run(BufReader::new(reader), &mut writer)?;
        writer.flush()?;
        Ok(report)
    }

    /// Copy `input` to `output`, rewriting data lines after resolved annotations.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut output: W) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        let mut state = State::Scanning;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            report.lines += 1;
            let line_no = report.lines;

            let (content, terminator) = split_terminator(&buf);

            state = match state {
                State::AwaitingDataLine { index, offset } => {
                    let line = self.rewrite_data_line(content, offset, line_no);
                    let outcome = &mut report.annotations[index].outcome;
                    match line {
                        Ok(line) => {
                            output.write_all(line.as_bytes())?;
                            *outcome = Outcome::Rewritten {
                                offset: format_offset(offset),
                            };
                        }
                        Err((line, e)) => {
                            output.write_all(&line)?;
                            *outcome = Outcome::RewriteFailed {
                                offset: format_offset(offset),
                                error: e.to_string(),
                            };
                        }
                    }
                    output.write_all(terminator)?;
                    State::Scanning
                }
                State::Scanning => {
                    output.write_all(&buf)?;
                    match std::str::from_utf8(content) {
                        Ok(text) => self.scan_line(text, line_no, &mut report),
                        Err(_) => {
                            debug!("Line {}: not UTF-8, copied as is", line_no);
                            State::Scanning
                        }
                    }
                }
            };
        }

        if let State::AwaitingDataLine { index, offset } = state {
            let annotation = &mut report.annotations[index];
            warn!(
                "Line {}: {} resolved but no data line follows",
                annotation.line, annotation.tag
            );
            annotation.outcome = Outcome::MissingDataLine {
                offset: format_offset(offset),
            };
        }

        info!(
            "Processed {} lines: {} annotations, {} rewritten, {} failed",
            report.lines,
            report.annotations.len(),
            report.rewritten(),
            report.failed()
        );

        Ok(report)
    }

    /// Inspect a line in the scanning state and decide the next state.
    fn scan_line(&self, text: &str, line_no: usize, report: &mut ScanReport) -> State {
        let Some(annotation) = Annotation::parse(text, line_no) else {
            return State::Scanning;
        };
        let Some(resolver) = self.registry.lookup(annotation.tag) else {
            debug!("Line {}: unregistered tag '{}'", line_no, annotation.tag);
            return State::Scanning;
        };

        let index = report.annotations.len();
        let (state, outcome) = match resolver.resolve(annotation.signature) {
            Ok(offset) => {
                info!(
                    "Line {}: {} {} -> {}",
                    line_no,
                    annotation.tag,
                    annotation.signature.trim_end(),
                    format_offset(offset)
                );
                (
                    State::AwaitingDataLine { index, offset },
                    Outcome::MissingDataLine {
                        offset: format_offset(offset),
                    },
                )
            }
            Err(e) => {
                error!("Line {}: {} failed: {}", line_no, annotation.tag, e);
                (
                    State::Scanning,
                    Outcome::ResolveFailed {
                        error: e.to_string(),
                    },
                )
            }
        };

        report.annotations.push(AnnotationOutcome {
            line: line_no,
            tag: annotation.tag.to_string(),
            signature: annotation.signature.trim_end().to_string(),
            outcome,
        });
        state
    }

    /// Rewritten line on success; on failure the bytes to emit and the error.
    fn rewrite_data_line(
        &self,
        content: &[u8],
        offset: u64,
        line_no: usize,
    ) -> std::result::Result<String, (Vec<u8>, Error)> {
        let text = match std::str::from_utf8(content) {
            Ok(text) => text,
            Err(_) => {
                let e = Error::LineFormat("line is not valid UTF-8".to_string());
                error!("Line {}: {}", line_no, e);
                return Err((content.to_vec(), e));
            }
        };

        let mut line = text.to_string();
        match rewrite_offset_line(&mut line, offset, self.version) {
            Ok(()) => Ok(line),
            Err(e) => {
                error!("Line {}: {}", line_no, e);
                Err((line.into_bytes(), e))
            }
        }
    }
}

/// Split a raw line into its content and its `\n` / `\r\n` terminator.
fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let len = if line.ends_with(b"\r\n") {
        line.len() - 2
    } else if line.ends_with(b"\n") {
        line.len() - 1
    } else {
        line.len()
    };
    line.split_at(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::CodeSection;
    use crate::resolver::AddressTable;

    fn section() -> CodeSection {
        let mut bytes = vec![0u8; 0x2000];
        bytes[0x1000..0x1005].copy_from_slice(&[0x48, 0x8B, 0x01, 0x02, 0x90]);
        // call +0x100 at 0x1800
        bytes[0x1800..0x1806].copy_from_slice(&[0xE8, 0x00, 0x01, 0x00, 0x00, 0xC3]);
        // two copies of 55 48 89 E5
        bytes[0x200..0x204].copy_from_slice(&[0x55, 0x48, 0x89, 0xE5]);
        bytes[0x300..0x304].copy_from_slice(&[0x55, 0x48, 0x89, 0xE5]);
        CodeSection::new(bytes, 0x1_4000_1000, 0x1_4000_0000)
    }

    fn run(input: &str) -> (String, ScanReport) {
        let section = section();
        let registry = ResolverRegistry::new(&section);
        run_with(&registry, input)
    }

    fn run_with(registry: &ResolverRegistry<'_>, input: &str) -> (String, ScanReport) {
        let version = VersionTag::new("1_5_73").unwrap();
        let pipeline = AnnotationPipeline::new(registry, &version);
        let mut output = Vec::new();
        let report = pipeline.run(input.as_bytes(), &mut output).unwrap();
        (String::from_utf8(output).unwrap(), report)
    }

    #[test]
    fn test_direct_end_to_end() {
        let input = "// DirectSig: 48 8B ?? ?? 90\nfoo = 0x00000000; // 1_5_72\n";
        let (output, report) = run(input);
        assert_eq!(
            output,
            "// DirectSig: 48 8B ?? ?? 90\nfoo = 0x00001000; // 1_5_73\n"
        );
        assert_eq!(report.lines, 2);
        assert_eq!(report.rewritten(), 1);
        assert_eq!(report.annotations[0].line, 1);
    }

    #[test]
    fn test_indirect_end_to_end() {
        let input = "// IndirectSig: E8 ?? ?? ?? ?? C3\nbar = 0x0; // old\n";
        let (output, _) = run(input);
        // 0x1000 (section rva) + 0x1800 + 5 + 0x100
        assert_eq!(
            output,
            "// IndirectSig: E8 ?? ?? ?? ?? C3\nbar = 0x00002905; // 1_5_73\n"
        );
    }

    #[test]
    fn test_unknown_tag_is_passthrough() {
        let input = "// UnknownSig: 90 90\nfoo = 0x00000000; // 1_5_72\n";
        let (output, report) = run(input);
        assert_eq!(output, input);
        assert!(report.annotations.is_empty());
    }

    #[test]
    fn test_failed_resolution_leaves_next_line() {
        let input = "// DirectSig: 55 48 89 E5\nfoo = 0x00000000; // 1_5_72\n\
                     // DirectSig: DE AD BE EF\nbar = 0x00000000; // 1_5_72\n\
                     // DirectSig: 4\nbaz = 0x00000000; // 1_5_72\n";
        let (output, report) = run(input);
        assert_eq!(output, input);
        assert_eq!(report.annotations.len(), 3);
        assert_eq!(report.resolve_failures(), 3);
        assert_eq!(
            report.annotations[0].outcome,
            Outcome::ResolveFailed {
                error: "Signature is ambiguous: 55 48 89 E5 (2 matches)".to_string()
            }
        );
    }

    #[test]
    fn test_failed_resolution_next_line_is_scanned() {
        let input = "// DirectSig: DE AD BE EF\n// DirectSig: 48 8B ?? ?? 90\nfoo = 0x0; // x\n";
        let (output, report) = run(input);
        assert_eq!(
            output,
            "// DirectSig: DE AD BE EF\n// DirectSig: 48 8B ?? ?? 90\nfoo = 0x00001000; // 1_5_73\n"
        );
        assert_eq!(report.rewritten(), 1);
    }

    #[test]
    fn test_malformed_data_line_is_unchanged() {
        let input = "// DirectSig: 48 8B ?? ?? 90\nfoo = 0x00000000 // 1_5_72\n";
        let (output, report) = run(input);
        assert_eq!(output, input);
        assert!(matches!(
            report.annotations[0].outcome,
            Outcome::RewriteFailed { .. }
        ));
    }

    #[test]
    fn test_data_line_without_comment_gets_numeric_update() {
        let input = "// DirectSig: 48 8B ?? ?? 90\nfoo = 0x00000000;\n";
        let (output, report) = run(input);
        assert_eq!(output, "// DirectSig: 48 8B ?? ?? 90\nfoo = 0x00001000;\n");
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_data_line_is_not_scanned_as_header() {
        // the data line is consumed even when it looks like a header itself
        let input = "// DirectSig: 48 8B ?? ?? 90\n// DirectSig: 48 8B ?? ?? 90\nfoo = 0x0; // x\n";
        let (output, report) = run(input);
        assert_eq!(output, input);
        assert_eq!(report.annotations.len(), 1);
    }

    #[test]
    fn test_header_on_last_line() {
        let input = "foo\n// DirectSig: 48 8B ?? ?? 90";
        let (output, report) = run(input);
        assert_eq!(output, input);
        assert!(matches!(
            report.annotations[0].outcome,
            Outcome::MissingDataLine { .. }
        ));
    }

    #[test]
    fn test_line_endings_preserved() {
        let input = "// DirectSig: 48 8B ?? ?? 90\r\nfoo = 0x00000000; // 1_5_72\r\nlast";
        let (output, _) = run(input);
        assert_eq!(
            output,
            "// DirectSig: 48 8B ?? ?? 90\r\nfoo = 0x00001000; // 1_5_73\r\nlast"
        );
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let input = "namespace Offsets {\n\
                     \t// DirectSig: 48 8B ?? ?? 90\n\
                     \tconstexpr std::uintptr_t Foo = 0x00000000; // 1_5_72\n\
                     \t// IndirectSig: E8 ?? ?? ?? ?? C3\n\
                     \tconstexpr std::uintptr_t Bar = 0x00000000; // 1_5_72\n\
                     }\n";
        let (first, _) = run(input);
        let (second, _) = run(&first);
        assert_ne!(first, input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_external_resolver() {
        let section = section();
        let mut table = AddressTable::new();
        table.insert("514960", 0x2F26EF8);
        let registry = ResolverRegistry::new(&section)
            .with("TableSig", table)
            .unwrap();

        let input = "// TableSig: 514960\nPlayer = 0x0; // 1_5_72\n// TableSig: 1\nNope = 0x0; // 1_5_72\n";
        let (output, report) = run_with(&registry, input);
        assert_eq!(
            output,
            "// TableSig: 514960\nPlayer = 0x02F26EF8; // 1_5_73\n// TableSig: 1\nNope = 0x0; // 1_5_72\n"
        );
        assert_eq!(report.rewritten(), 1);
        assert_eq!(report.resolve_failures(), 1);
    }

    #[test]
    fn test_non_utf8_lines_copied() {
        let section = section();
        let registry = ResolverRegistry::new(&section);
        let version = VersionTag::new("1_5_73").unwrap();
        let pipeline = AnnotationPipeline::new(&registry, &version);

        let mut input = b"\xFF\xFE junk\n// DirectSig: 48 8B ?? ?? 90\n\xFF = 0x0; // x\n".to_vec();
        input.extend_from_slice(b"tail\n");
        let mut output = Vec::new();
        let report = pipeline.run(input.as_slice(), &mut output).unwrap();
        assert_eq!(output, input);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_split_terminator() {
        assert_eq!(split_terminator(b"a\r\n"), (&b"a"[..], &b"\r\n"[..]));
        assert_eq!(split_terminator(b"a\n"), (&b"a"[..], &b"\n"[..]));
        assert_eq!(split_terminator(b"a"), (&b"a"[..], &b""[..]));
        assert_eq!(split_terminator(b"\n"), (&b""[..], &b"\n"[..]));
    }
}
