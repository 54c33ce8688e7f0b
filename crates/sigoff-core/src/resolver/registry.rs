//! Type tag to resolver mapping
//!
//! The two signature kinds this crate understands are a closed enum. Anything
//! else (address tables, symbol lookups owned by other code) plugs in through
//! [`Resolve`] under its own tag.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use super::{resolve_direct, resolve_indirect};
use crate::error::{Error, Result};
use crate::image::CodeSection;

/// Built-in signature kinds, named by the tag used in annotation comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum SignatureKind {
    /// Offset of the match itself, relative to the code section
    #[strum(serialize = "DirectSig")]
    Direct,
    /// Target of the rel32 instruction at the match, relative to the module
    #[strum(serialize = "IndirectSig")]
    Indirect,
}

impl SignatureKind {
    pub fn resolve(self, signature: &str, section: &CodeSection) -> Result<u64> {
        match self {
            SignatureKind::Direct => resolve_direct(signature, section),
            SignatureKind::Indirect => resolve_indirect(signature, section),
        }
    }
}

/// A resolver supplied from outside the crate.
pub trait Resolve {
    fn resolve(&self, signature: &str) -> Result<u64>;
}

impl<F> Resolve for F
where
    F: Fn(&str) -> Result<u64>,
{
    fn resolve(&self, signature: &str) -> Result<u64> {
        self(signature)
    }
}

/// Resolver found for a tag.
pub enum Resolver<'r> {
    Builtin(SignatureKind, &'r CodeSection),
    External(&'r dyn Resolve),
}

impl Resolve for Resolver<'_> {
    fn resolve(&self, signature: &str) -> Result<u64> {
        match self {
            Resolver::Builtin(kind, section) => kind.resolve(signature, section),
            Resolver::External(resolver) => resolver.resolve(signature),
        }
    }
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolver::Builtin(kind, _) => f.debug_tuple("Builtin").field(kind).finish(),
            Resolver::External(_) => f.write_str("External"),
        }
    }
}

/// Registry of resolvers for one run over one code section.
pub struct ResolverRegistry<'a> {
    section: &'a CodeSection,
    external: HashMap<String, Box<dyn Resolve + 'a>>,
}

impl<'a> ResolverRegistry<'a> {
    /// Registry with only the built-in kinds.
    pub fn new(section: &'a CodeSection) -> Self {
        Self {
            section,
            external: HashMap::new(),
        }
    }

    /// Add an external resolver under `tag`.
    ///
    /// Built-in tags and tags already registered are rejected.
    pub fn register<R>(&mut self, tag: impl Into<String>, resolver: R) -> Result<()>
    where
        R: Resolve + 'a,
    {
        let tag = tag.into();
        if tag.is_empty() || tag.contains(':') || tag.contains(char::is_whitespace) {
            return Err(Error::Config(format!("Invalid resolver tag '{}'", tag)));
        }
        if SignatureKind::from_str(&tag).is_ok() || self.external.contains_key(&tag) {
            return Err(Error::Config(format!(
                "Resolver tag '{}' is already registered",
                tag
            )));
        }

        debug!("Registered external resolver '{}'", tag);
        self.external.insert(tag, Box::new(resolver));
        Ok(())
    }

    pub fn with<R>(mut self, tag: impl Into<String>, resolver: R) -> Result<Self>
    where
        R: Resolve + 'a,
    {
        self.register(tag, resolver)?;
        Ok(self)
    }

    pub fn lookup(&self, tag: &str) -> Option<Resolver<'_>> {
        if let Ok(kind) = SignatureKind::from_str(tag) {
            return Some(Resolver::Builtin(kind, self.section));
        }
        self.external
            .get(tag)
            .map(|resolver| Resolver::External(resolver.as_ref()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }

    /// All registered tags, built-ins first, the rest sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut external: Vec<String> = self.external.keys().cloned().collect();
        external.sort();
        SignatureKind::iter()
            .map(|kind| kind.to_string())
            .chain(external)
            .collect()
    }

    pub fn section(&self) -> &CodeSection {
        self.section
    }
}

impl fmt::Debug for ResolverRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
