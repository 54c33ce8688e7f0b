//! # sigoff-core
//!
//! Core library for the sigoff offset updater.
//!
//! This crate provides:
//! - Signature compilation and wildcard-tolerant byte search
//! - Direct and rel32-indirect offset resolution over a code section
//! - A resolver registry open to externally supplied resolvers
//! - The annotated offsets file rewriter

pub mod config;
pub mod error;
pub mod image;
pub mod matcher;
pub mod pattern;
pub mod pipeline;
pub mod resolver;

pub use config::{CONFIG_FILE, Config, ConfigBuilder};
pub use error::{Error, Result};
pub use image::{CodeSection, DEFAULT_SECTION};
pub use matcher::{FallbackTable, MaskedMatcher, find_all};
pub use pattern::{Pattern, format_pattern, parse_pattern};
pub use pipeline::{
    Annotation, AnnotationOutcome, AnnotationPipeline, Outcome, ScanReport, VersionTag,
    format_offset, parse_annotation, rewrite_offset_line,
};
pub use resolver::{
    AddressTable, REL32_INSTR_LEN, Resolve, Resolver, ResolverRegistry, SignatureKind, TABLE_TAG,
    load_address_table, rel32_target, resolve_direct, resolve_indirect, save_address_table,
};
