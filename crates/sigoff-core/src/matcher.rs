//! Wildcard-tolerant substring search
//!
//! Knuth-Morris-Pratt over a [`Pattern`] whose wildcard positions match any
//! byte. Every occurrence is reported, including overlapping ones: after a full
//! match the scan resumes from the fallback entry at the pattern's end instead
//! of restarting from zero.

use crate::pattern::Pattern;

/// Fallback table with `len + 1` entries. `None` is the "no fallback"
/// sentinel stored at index 0; the last entry governs resuming after a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackTable {
    entries: Vec<Option<usize>>,
}

impl FallbackTable {
    pub fn build(pattern: &Pattern) -> Self {
        let len = pattern.len();
        let mut entries = vec![None; len + 1];

        let mut pos = 1;
        let mut candidate = 0;

        while pos < len {
            if pattern.compatible(pos, candidate) {
                entries[pos] = entries[candidate];
                candidate += 1;
            } else {
                entries[pos] = Some(candidate);
                let mut next = entries[candidate];
                while let Some(c) = next {
                    if pattern.compatible(pos, c) {
                        break;
                    }
                    next = entries[c];
                }
                // the sentinel wraps to 0 on increment
                candidate = next.map_or(0, |c| c + 1);
            }
            pos += 1;
        }

        entries[len] = Some(candidate);
        Self { entries }
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.entries[index]
    }

    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.entries
    }
}

/// A compiled pattern paired with its fallback table, reusable across haystacks.
#[derive(Debug, Clone)]
pub struct MaskedMatcher<'p> {
    pattern: &'p Pattern,
    table: FallbackTable,
}

impl<'p> MaskedMatcher<'p> {
    pub fn new(pattern: &'p Pattern) -> Self {
        Self {
            pattern,
            table: FallbackTable::build(pattern),
        }
    }

    pub fn table(&self) -> &FallbackTable {
        &self.table
    }

    /// Offsets of every match in `haystack`, in ascending order.
    pub fn find_all(&self, haystack: &[u8]) -> Vec<usize> {
        let len = self.pattern.len();
        let mut matches = Vec::new();
        let mut j = 0;
        let mut k = 0;

        while j < haystack.len() {
            if self.pattern.matches_byte(k, haystack[j]) {
                j += 1;
                k += 1;
                if k == len {
                    matches.push(j - k);
                    k = self.table.get(len).unwrap_or(0);
                }
            } else {
                match self.table.get(k) {
                    Some(fallback) => k = fallback,
                    None => {
                        j += 1;
                        k = 0;
                    }
                }
            }
        }

        matches
    }

    pub fn find_first(&self, haystack: &[u8]) -> Option<usize> {
        self.find_all(haystack).into_iter().next()
    }
}

/// Find every occurrence of `pattern` in `haystack`.
pub fn find_all(haystack: &[u8], pattern: &Pattern) -> Vec<usize> {
    MaskedMatcher::new(pattern).find_all(haystack)
}
