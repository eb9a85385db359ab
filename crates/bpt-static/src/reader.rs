//! Artifact reader - the only component touching the application tree
//!
//! Reads artifact files as text and hands them to the descriptor cache.
//! A file that does not exist yields `None`.

use crate::cache::DescriptorCache;
use crate::descriptor::ArtifactDescriptor;
use crate::error::{StaticError, StaticResult};
use crate::locations::{ArtifactKind, ArtifactLocations};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Descriptor together with the file it came from
#[derive(Debug, Clone)]
pub struct LocatedDescriptor {
    pub path: PathBuf,
    pub descriptor: Arc<ArtifactDescriptor>,
}

/// Reads and parses application source artifacts
#[derive(Debug, Clone)]
pub struct ArtifactReader {
    locations: ArtifactLocations,
    cache: DescriptorCache,
    max_file_size: usize,
}

impl ArtifactReader {
    /// Create reader over `locations` with default cache
    #[inline]
    #[must_use]
    pub fn new(locations: ArtifactLocations) -> Self {
        Self::with_cache(locations, DescriptorCache::default())
    }

    /// Create reader sharing an existing cache
    #[must_use]
    pub fn with_cache(locations: ArtifactLocations, cache: DescriptorCache) -> Self {
        Self {
            locations,
            cache,
            max_file_size: 1024 * 1024,
        }
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[inline]
    #[must_use]
    pub fn locations(&self) -> &ArtifactLocations {
        &self.locations
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &DescriptorCache {
        &self.cache
    }

    /// Read the artifact class `name` of `kind`
    ///
    /// # Errors
    /// - `StaticError::Io` if the file exists but cannot be read
    /// - `StaticError::TooLarge` if the file exceeds the size limit
    pub async fn read(
        &self,
        kind: ArtifactKind,
        name: &str,
    ) -> StaticResult<Option<LocatedDescriptor>> {
        self.read_path(self.locations.path_for(kind, name)).await
    }

    /// Read the roles file
    ///
    /// # Errors
    /// Same as [`ArtifactReader::read`]
    pub async fn read_roles(&self) -> StaticResult<Option<LocatedDescriptor>> {
        self.read_path(self.locations.roles_path()).await
    }

    /// Read every source file in the directory of `kind`, sorted by path.
    ///
    /// A missing directory is an empty list.
    ///
    /// # Errors
    /// Same as [`ArtifactReader::read`]
    pub async fn read_all(&self, kind: ArtifactKind) -> StaticResult<Vec<LocatedDescriptor>> {
        let dir = self.locations.dir(kind);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StaticError::io_error(dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StaticError::io_error(&dir, e))?
        {
            let path = entry.path();
            if self.locations.is_source(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut descriptors = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(located) = self.read_path(path).await? {
                descriptors.push(located);
            }
        }
        Ok(descriptors)
    }

    async fn read_path(&self, path: PathBuf) -> StaticResult<Option<LocatedDescriptor>> {
        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "artifact not found");
                return Ok(None);
            }
            Err(e) => return Err(StaticError::io_error(path, e)),
        };

        if source.len() > self.max_file_size {
            return Err(StaticError::TooLarge {
                size: source.len(),
                max: self.max_file_size,
                path,
            });
        }

        let descriptor = self.cache.get_or_parse(&source).await;
        Ok(Some(LocatedDescriptor { path, descriptor }))
    }

    /// Path relative to the application root, for issue messages
    #[must_use]
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.locations.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpt_test_utils::{bar_app, write_source, BarAppFile};

    #[tokio::test]
    async fn reads_existing_artifact() {
        let app = bar_app();
        let reader = ArtifactReader::new(ArtifactLocations::rooted(app.path()));

        let located = reader
            .read(ArtifactKind::Command, "OrderCocktail")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            reader.display_path(&located.path),
            BarAppFile::OrderCocktail.path()
        );
        assert!(located.descriptor.field("drink").is_some());
    }

    #[tokio::test]
    async fn missing_artifact_is_none() {
        let app = bar_app();
        let reader = ArtifactReader::new(ArtifactLocations::rooted(app.path()));
        assert!(reader
            .read(ArtifactKind::Entity, "Tab")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn read_all_filters_by_extension() {
        let app = bar_app();
        write_source(app.path(), "src/event-handlers/notes.md", "# notes");
        let reader = ArtifactReader::new(ArtifactLocations::rooted(app.path()));

        let handlers = reader.read_all(ArtifactKind::EventHandler).await.unwrap();
        assert_eq!(handlers.len(), 1);
        assert!(reader
            .read_all(ArtifactKind::ScheduledCommand)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn oversized_artifact_is_an_error() {
        let app = bar_app();
        let reader =
            ArtifactReader::new(ArtifactLocations::rooted(app.path())).with_max_file_size(10);
        let err = reader.read_roles().await.unwrap_err();
        assert!(matches!(err, StaticError::TooLarge { .. }));
    }
}
