//! Content-addressed descriptor cache using moka
//!
//! Descriptors are keyed by the blake3 hash of the source text, so a file
//! read by several checks (or identical files at different paths) is parsed
//! once.

use crate::descriptor::ArtifactDescriptor;
use moka::future::Cache;
use std::fmt;
use std::sync::Arc;

/// A 32-byte blake3 hash of artifact source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute hash of source text
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// First 8 bytes as hex
    #[must_use]
    pub fn short(&self) -> String {
        self.0[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Parsed descriptors by content hash
#[derive(Debug, Clone)]
pub struct DescriptorCache {
    inner: Cache<ContentHash, Arc<ArtifactDescriptor>>,
}

impl DescriptorCache {
    /// Create new cache with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Descriptor for `source`, parsing it on first sight
    pub async fn get_or_parse(&self, source: &str) -> Arc<ArtifactDescriptor> {
        let hash = ContentHash::compute(source.as_bytes());
        if let Some(cached) = self.inner.get(&hash).await {
            tracing::trace!(hash = %hash.short(), "descriptor cache hit");
            return cached;
        }

        let descriptor = Arc::new(ArtifactDescriptor::parse(source));
        self.inner.insert(hash, Arc::clone(&descriptor)).await;
        descriptor
    }

    /// Check if source text is already cached
    #[inline]
    pub async fn contains(&self, source: &str) -> bool {
        let hash = ContentHash::compute(source.as_bytes());
        self.inner.get(&hash).await.is_some()
    }

    /// Invalidate all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Get cache statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
        }
    }
}

impl Default for DescriptorCache {
    /// Create cache with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}
