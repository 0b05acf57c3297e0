use std::collections::HashMap;

use crate::assets::decode::PreparedImage;
use crate::layers::model::SourceRef;

/// Decoded pixels keyed by source.
///
/// Pixels for a given source never change once decoded. Entries only leave through
/// [`ImageCache::retain`].
#[derive(Clone, Debug, Default)]
pub struct ImageCache {
    by_source: HashMap<SourceRef, PreparedImage>,
    decode_counts: HashMap<SourceRef, u32>,
}

impl ImageCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded image for `source`, if cached.
    pub fn get(&self, source: &SourceRef) -> Option<&PreparedImage> {
        self.by_source.get(source)
    }

    /// Return `true` when `source` is cached.
    pub fn contains(&self, source: &SourceRef) -> bool {
        self.by_source.contains_key(source)
    }

    /// Store a freshly decoded image. Re-inserting a cached source keeps the first entry.
    pub fn insert(&mut self, source: SourceRef, image: PreparedImage) {
        if self.by_source.contains_key(&source) {
            return;
        }
        *self.decode_counts.entry(source.clone()).or_default() += 1;
        self.by_source.insert(source, image);
    }

    /// How many times `source` has been decoded into this cache.
    pub fn decode_count(&self, source: &SourceRef) -> u32 {
        self.decode_counts.get(source).copied().unwrap_or(0)
    }

    /// Drop every source for which `keep` returns `false`. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&SourceRef) -> bool) -> usize {
        let before = self.by_source.len();
        self.by_source.retain(|source, _| keep(source));
        let by_source = &self.by_source;
        self.decode_counts.retain(|source, _| by_source.contains_key(source));
        before - self.by_source.len()
    }

    /// Number of cached sources.
    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
