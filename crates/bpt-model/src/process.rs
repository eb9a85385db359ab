//! Process description types
//!
//! A [`Process`] is authored once (JSON or YAML) and consumed read-only by
//! every later stage. Optional fields stay optional here so that structural
//! defects surface as validator issues rather than deserialization failures.

use crate::error::ModelError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

/// Role keyword meaning "any caller, authenticated or not"
pub const ALL_ROLES: &str = "all";

/// Key used to look up read-model items when `idKey` is not given
pub const DEFAULT_ID_KEY: &str = "id";

/// Named command inputs, in authored order
pub type Inputs = IndexMap<String, Value>;

/// Expected field values of an entity or read model
pub type ValueMap = serde_json::Map<String, Value>;

/// Authorization specification: `"all"`, a single role, or a set of roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleSpec {
    /// Single string, either `"all"` or one role name
    One(String),
    /// Explicit role set
    Many(Vec<String>),
}

impl RoleSpec {
    /// Spec granting access to everyone
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::One(ALL_ROLES.to_string())
    }

    /// Spec for an explicit role set
    #[must_use]
    pub fn roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Many(roles.into_iter().map(Into::into).collect())
    }

    /// True if any entry is the `"all"` keyword
    #[must_use]
    pub fn is_all(&self) -> bool {
        self.raw().any(|r| r.trim() == ALL_ROLES)
    }

    /// True if no non-blank role is present
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw().all(|r| r.trim().is_empty())
    }

    /// True for a single role string other than `"all"`
    #[must_use]
    pub fn is_single_named_role(&self) -> bool {
        matches!(self, Self::One(role) if role.trim() != ALL_ROLES)
    }

    /// Normalized role set.
    ///
    /// `"all"` absorbs every other entry, independent of position.
    #[must_use]
    pub fn to_set(&self) -> BTreeSet<String> {
        if self.is_all() {
            return BTreeSet::from([ALL_ROLES.to_string()]);
        }
        self.raw()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn raw(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::One(role) => Box::new(std::iter::once(role.as_str())),
            Self::Many(roles) => Box::new(roles.iter().map(String::as_str)),
        }
    }
}

impl Default for RoleSpec {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

/// Operation under test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Trigger {
    /// Command invoked by a caller holding one of `authorized`
    #[serde(rename_all = "camelCase")]
    ActorCommand {
        #[serde(default)]
        command_name: String,
        #[serde(default)]
        authorized: RoleSpec,
    },
    /// Command invoked by the platform scheduler
    #[serde(rename_all = "camelCase")]
    ScheduledCommand {
        #[serde(default)]
        command_name: String,
        #[serde(default)]
        schedule: String,
    },
}

impl Trigger {
    /// Command name regardless of trigger kind
    #[inline]
    #[must_use]
    pub fn command_name(&self) -> &str {
        match self {
            Self::ActorCommand { command_name, .. } | Self::ScheduledCommand { command_name, .. } => {
                command_name
            }
        }
    }

    /// Authorization of an actor command; `None` for scheduled commands
    #[inline]
    #[must_use]
    pub fn authorized(&self) -> Option<&RoleSpec> {
        match self {
            Self::ActorCommand { authorized, .. } => Some(authorized),
            Self::ScheduledCommand { .. } => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_actor_command(&self) -> bool {
        matches!(self, Self::ActorCommand { .. })
    }
}

/// Setup mutation executed before a scenario's trigger
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecedingAction {
    #[serde(default)]
    pub command_name: String,
    #[serde(default)]
    pub inputs: Inputs,
    #[serde(default)]
    pub authorized: RoleSpec,
}

/// Expected persisted state of one entity instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    #[serde(default)]
    pub entity_name: String,
    /// Explicit instance id; the scenario correlation id is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_values: Option<ValueMap>,
}

/// Expected visibility of a read-model item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleUpdate {
    #[serde(default)]
    pub read_model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_values: Option<ValueMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized: Option<RoleSpec>,
}

impl VisibleUpdate {
    /// Lookup key, defaulting to `"id"`
    #[inline]
    #[must_use]
    pub fn id_key(&self) -> &str {
        self.id_key.as_deref().unwrap_or(DEFAULT_ID_KEY)
    }
}

/// One exercised path through a process
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Inputs,
    #[serde(default)]
    pub preceding_actions: Vec<PrecedingAction>,
    #[serde(default)]
    pub should_be_rejected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_state_updates: Option<Vec<StateUpdate>>,
    #[serde(default)]
    pub expected_visible_updates: Vec<VisibleUpdate>,
}

impl Scenario {
    /// State updates, empty when none were declared
    #[inline]
    #[must_use]
    pub fn state_updates(&self) -> &[StateUpdate] {
        self.expected_state_updates.as_deref().unwrap_or_default()
    }
}

/// Declarative description of one triggerable business operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(default)]
    pub name: String,
    pub trigger: Trigger,
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

/// Serialization format of a process file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessFormat {
    Json,
    Yaml,
}

impl ProcessFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, ModelError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(ModelError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl Process {
    /// Parse a process description in the given format
    pub fn parse(source: &str, format: ProcessFormat) -> Result<Self, ModelError> {
        match format {
            ProcessFormat::Json => Ok(serde_json::from_str(source)?),
            ProcessFormat::Yaml => Ok(serde_yaml::from_str(source)?),
        }
    }

    /// Parse a JSON process description
    pub fn from_json_str(source: &str) -> Result<Self, ModelError> {
        Self::parse(source, ProcessFormat::Json)
    }

    /// Parse a YAML process description
    pub fn from_yaml_str(source: &str) -> Result<Self, ModelError> {
        Self::parse(source, ProcessFormat::Yaml)
    }

    /// Read a process file, choosing the format by extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let format = ProcessFormat::from_path(path)?;
        let source = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, format)
    }

    /// Scenario names in declared order
    pub fn scenario_names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.iter().map(|s| s.name.as_str())
    }
}
