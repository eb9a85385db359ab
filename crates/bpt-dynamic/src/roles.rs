//! Role to client resolution
//!
//! The registry is built once and shared read-only by every scenario.
//! `"all"` always resolves to the anonymous client.

use crate::error::ResolveError;
use crate::transport::GraphQlClient;
use bpt_model::{RoleSpec, ALL_ROLES};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Authenticated client per role plus one anonymous client
#[derive(Debug, Clone)]
pub struct ClientRegistry {
    anonymous: Arc<dyn GraphQlClient>,
    by_role: BTreeMap<String, Arc<dyn GraphQlClient>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new(anonymous: Arc<dyn GraphQlClient>) -> Self {
        Self {
            anonymous,
            by_role: BTreeMap::new(),
        }
    }

    /// Register the client acting as `role`
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>, client: Arc<dyn GraphQlClient>) -> Self {
        self.by_role.insert(role.into(), client);
        self
    }

    #[inline]
    #[must_use]
    pub fn anonymous(&self) -> Arc<dyn GraphQlClient> {
        Arc::clone(&self.anonymous)
    }

    /// Client for a single role name
    #[must_use]
    pub fn client(&self, role: &str) -> Option<Arc<dyn GraphQlClient>> {
        if role == ALL_ROLES {
            return Some(self.anonymous());
        }
        self.by_role.get(role).cloned()
    }

    /// Roles with a configured client
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.by_role.keys().map(String::as_str)
    }

    /// Client for a normalized role set: anonymous for `"all"`, otherwise
    /// the first role in order that has a client.
    ///
    /// # Errors
    /// - `ResolveError::NoRoles` for an empty set
    /// - `ResolveError::NoClient` if none of the roles has a client
    pub fn resolve(&self, roles: &BTreeSet<String>) -> Result<Arc<dyn GraphQlClient>, ResolveError> {
        if roles.is_empty() {
            return Err(ResolveError::NoRoles);
        }
        if roles.contains(ALL_ROLES) {
            return Ok(self.anonymous());
        }
        roles
            .iter()
            .find_map(|role| self.by_role.get(role).cloned())
            .ok_or_else(|| ResolveError::NoClient {
                roles: roles.iter().cloned().collect(),
            })
    }

    /// Same as [`ClientRegistry::resolve`] for an authored spec
    ///
    /// # Errors
    /// See [`ClientRegistry::resolve`]
    pub fn resolve_spec(&self, spec: &RoleSpec) -> Result<Arc<dyn GraphQlClient>, ResolveError> {
        self.resolve(&spec.to_set())
    }
}
