//! `bpt.toml` configuration
//!
//! ```toml
//! [endpoint]
//! url = "http://localhost:3000/graphql"
//! timeout_ms = 10000
//!
//! [roles.Guest]
//! token_env = "BPT_GUEST_TOKEN"
//!
//! [artifacts]
//! root = "../bar-app"
//!
//! [dynamic]
//! result_wait_ms = 5000
//!
//! [static]
//! max_handler_hops = 1
//!
//! [store]
//! events_file = ".booster/events.json"
//! ```
//!
//! Every section is optional. A relative `artifacts.root` is taken from the
//! directory holding the file; a relative `store.events_file` from the
//! artifacts root.

use bpt_dynamic::{
    ClientRegistry, DynamicConfig, DynamicConfirmation, HttpGraphQlClient, LocalEventStore,
    TransportError,
};
use bpt_model::ALL_ROLES;
use bpt_static::{ArtifactLocations, ArtifactReader, StaticConfig, StaticConfirmation};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("role '{role}' needs either `token` or `token_env`")]
    MissingToken { role: String },

    #[error("role '{role}': environment variable {var} is not set")]
    MissingEnv { role: String, var: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// GraphQL endpoint of the application under test
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/graphql".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Bearer token of one role, inline or from the environment
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    pub token: Option<String>,
    pub token_env: Option<String>,
}

impl RoleConfig {
    fn token<F>(&self, role: &str, env: &F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let Some(var) = &self.token_env else {
            return Err(ConfigError::MissingToken {
                role: role.to_string(),
            });
        };
        env(var).ok_or_else(|| ConfigError::MissingEnv {
            role: role.to_string(),
            var: var.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub events_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            events_file: PathBuf::from(".booster/events.json"),
        }
    }
}

/// Complete runner configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BptConfig {
    pub endpoint: EndpointConfig,
    pub roles: BTreeMap<String, RoleConfig>,
    pub artifacts: ArtifactLocations,
    pub dynamic: DynamicConfig,
    #[serde(rename = "static")]
    pub static_checks: StaticConfig,
    pub store: StoreConfig,
}

impl BptConfig {
    /// File looked up in the working directory when none is given
    pub const DEFAULT_FILE: &'static str = "bpt.toml";

    /// Parse TOML without resolving relative paths
    ///
    /// # Errors
    /// `toml::de::Error` for malformed TOML or unknown role keys
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load `path`, resolving `artifacts.root` against its directory
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Parse` if it is not a valid configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(config.relative_to(base))
    }

    /// Load `path` if given, else `bpt.toml` if present, else defaults
    ///
    /// # Errors
    /// See [`BptConfig::load`]
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(Self::DEFAULT_FILE).is_file() => Self::load(Self::DEFAULT_FILE),
            None => {
                tracing::debug!("no configuration file, using defaults");
                Ok(Self::default())
            }
        }
    }

    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.artifacts.root.is_relative() {
            self.artifacts.root = base.join(&self.artifacts.root);
        }
        self
    }

    #[must_use]
    pub fn events_file(&self) -> PathBuf {
        self.artifacts.resolve(&self.store.events_file)
    }

    #[must_use]
    pub fn static_confirmation(&self) -> StaticConfirmation {
        StaticConfirmation::new(self.artifacts.clone()).with_config(self.static_checks.clone())
    }

    /// Clients for every configured role, tokens read from the process
    /// environment
    ///
    /// # Errors
    /// See [`BptConfig::registry_with_env`]
    pub fn registry(&self) -> Result<ClientRegistry, ConfigError> {
        self.registry_with_env(|var| std::env::var(var).ok())
    }

    /// Clients for every configured role, tokens looked up through `env`
    ///
    /// # Errors
    /// - `ConfigError::MissingToken` / `ConfigError::MissingEnv` for a role
    ///   without a usable token
    /// - `ConfigError::Transport` if an HTTP client cannot be built
    pub fn registry_with_env<F>(&self, env: F) -> Result<ClientRegistry, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout = Duration::from_millis(self.endpoint.timeout_ms);
        let anonymous = HttpGraphQlClient::new(&self.endpoint.url, timeout)?;

        let mut registry = ClientRegistry::new(Arc::new(anonymous.clone()));
        for (role, role_config) in &self.roles {
            if role == ALL_ROLES {
                tracing::warn!("role 'all' is always anonymous, ignoring its token");
                continue;
            }
            let token = role_config.token(role, &env)?;
            registry = registry.with_role(role, Arc::new(anonymous.clone().with_token(token)));
        }
        Ok(registry)
    }

    /// Live runner over the configured endpoint and event file
    ///
    /// # Errors
    /// See [`BptConfig::registry`]
    pub fn dynamic_confirmation(&self) -> Result<DynamicConfirmation, ConfigError> {
        let registry = self.registry()?;
        Ok(DynamicConfirmation::new(
            Arc::new(registry),
            Arc::new(LocalEventStore::new(self.events_file())),
        )
        .with_reader(ArtifactReader::new(self.artifacts.clone()))
        .with_config(self.dynamic.clone()))
    }
}
