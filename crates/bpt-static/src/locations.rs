//! Where each kind of artifact lives in the application tree
//!
//! Artifact files are named after their class in kebab case
//! (`OrderCocktail` → `order-cocktail.ts`).

use bpt_model::case::to_kebab;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of source artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Command,
    ScheduledCommand,
    EventHandler,
    Event,
    Entity,
    ReadModel,
}

impl ArtifactKind {
    /// Human-readable label used in issues
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::ScheduledCommand => "scheduled command",
            Self::EventHandler => "event handler",
            Self::Event => "event",
            Self::Entity => "entity",
            Self::ReadModel => "read model",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Directory per artifact kind plus the roles file.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArtifactLocations {
    pub root: PathBuf,
    pub commands: PathBuf,
    pub scheduled_commands: PathBuf,
    pub event_handlers: PathBuf,
    pub events: PathBuf,
    pub entities: PathBuf,
    pub read_models: PathBuf,
    pub roles_file: PathBuf,
    /// Source file extension, without the dot
    pub extension: String,
}

impl Default for ArtifactLocations {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            commands: PathBuf::from("src/commands"),
            scheduled_commands: PathBuf::from("src/scheduled-commands"),
            event_handlers: PathBuf::from("src/event-handlers"),
            events: PathBuf::from("src/events"),
            entities: PathBuf::from("src/entities"),
            read_models: PathBuf::from("src/read-models"),
            roles_file: PathBuf::from("src/roles.ts"),
            extension: "ts".to_string(),
        }
    }
}

impl ArtifactLocations {
    /// Conventional layout below `root`
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self::default().with_root(root)
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Directory holding artifacts of `kind`
    #[must_use]
    pub fn dir(&self, kind: ArtifactKind) -> PathBuf {
        let relative = match kind {
            ArtifactKind::Command => &self.commands,
            ArtifactKind::ScheduledCommand => &self.scheduled_commands,
            ArtifactKind::EventHandler => &self.event_handlers,
            ArtifactKind::Event => &self.events,
            ArtifactKind::Entity => &self.entities,
            ArtifactKind::ReadModel => &self.read_models,
        };
        self.resolve(relative)
    }

    /// File expected to hold the artifact class `name`
    #[must_use]
    pub fn path_for(&self, kind: ArtifactKind, name: &str) -> PathBuf {
        self.dir(kind)
            .join(format!("{}.{}", to_kebab(name), self.extension))
    }

    /// Resolved roles file
    #[must_use]
    pub fn roles_path(&self) -> PathBuf {
        self.resolve(&self.roles_file)
    }

    /// True if `path` carries the configured source extension
    #[must_use]
    pub fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension)
    }

    /// `relative` below `root`; absolute paths are kept
    #[must_use]
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }
}
