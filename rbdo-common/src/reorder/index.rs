//! Two-tier title lookup over the ranked reference list

use super::normalize::normalize;
use super::types::ReferenceEntry;
use crate::{Error, Result};
use std::collections::HashMap;

/// Exact-title and normalized-title lookups, built once per run
///
/// Both maps keep the *first* entry seen for a key, so a lower-priority
/// duplicate title (higher rank number) never shadows an earlier one.
/// Entries are borrowed from the caller's list; the index is immutable
/// after [`ReferenceIndex::build`].
#[derive(Debug)]
pub struct ReferenceIndex<'a> {
    exact: HashMap<&'a str, &'a ReferenceEntry>,
    normalized: HashMap<String, &'a ReferenceEntry>,
}

impl<'a> ReferenceIndex<'a> {
    /// Build both lookups from the ranked list, in list order
    ///
    /// Entries whose title normalizes to the empty string are reachable
    /// only through the exact map.
    ///
    /// # Errors
    /// `Error::Precondition` if `entries` is empty.
    pub fn build(entries: &'a [ReferenceEntry]) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::Precondition(
                "reference list is empty; nothing to index".to_string(),
            ));
        }

        let mut exact = HashMap::with_capacity(entries.len());
        let mut normalized = HashMap::with_capacity(entries.len());

        for entry in entries {
            exact.entry(entry.title.as_str()).or_insert(entry);

            let key = normalize(&entry.title);
            if !key.is_empty() {
                normalized.entry(key).or_insert(entry);
            }
        }

        Ok(Self { exact, normalized })
    }

    /// Look up a literal title
    pub fn get_exact(&self, title: &str) -> Option<&'a ReferenceEntry> {
        self.exact.get(title).copied()
    }

    /// Look up an already-normalized key
    pub fn get_normalized(&self, key: &str) -> Option<&'a ReferenceEntry> {
        if key.is_empty() {
            return None;
        }
        self.normalized.get(key).copied()
    }
}
