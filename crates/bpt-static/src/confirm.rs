//! Static File Confirmation
//!
//! Checks that the application's source artifacts structurally satisfy the
//! gathered assertions. Each check returns its own issues; nothing is shared
//! between checks except the read-only reader and its cache.

use crate::descriptor::{ArtifactDescriptor, Authorization};
use crate::graph::EventGraph;
use crate::locations::{ArtifactKind, ArtifactLocations};
use crate::reader::{ArtifactReader, LocatedDescriptor};
use bpt_assertions::{Assertions, FieldTable, InputAssertion};
use bpt_model::{Issue, Outcome, Trigger, ALL_ROLES, TID_FIELD};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Static confirmation settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Intermediate event handlers traced between trigger and entity
    pub max_handler_hops: usize,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            max_handler_hops: 1,
        }
    }
}

impl StaticConfig {
    #[must_use]
    pub fn with_max_handler_hops(mut self, hops: usize) -> Self {
        self.max_handler_hops = hops;
        self
    }
}

/// What a command check should enforce
struct CommandExpectation<'a> {
    kind: ArtifactKind,
    name: &'a str,
    /// `None` skips the authorization check
    roles: Option<&'a BTreeSet<String>>,
    inputs: &'a BTreeMap<String, InputAssertion>,
    check_required: bool,
    check_correlation: bool,
}

fn describe_roles(roles: &BTreeSet<String>) -> String {
    if roles.contains(ALL_ROLES) {
        Authorization::All.to_string()
    } else {
        Authorization::Roles(roles.clone()).to_string()
    }
}

/// Static conformance checker over one application tree
#[derive(Debug, Clone)]
pub struct StaticConfirmation {
    reader: ArtifactReader,
    config: StaticConfig,
}

impl StaticConfirmation {
    /// Create checker for the application at `locations`
    #[must_use]
    pub fn new(locations: ArtifactLocations) -> Self {
        Self::with_reader(ArtifactReader::new(locations))
    }

    #[must_use]
    pub fn with_reader(reader: ArtifactReader) -> Self {
        Self {
            reader,
            config: StaticConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StaticConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn reader(&self) -> &ArtifactReader {
        &self.reader
    }

    /// Run every check against the gathered assertions
    ///
    /// # Returns
    /// - `Outcome::Valid` if every artifact conforms
    /// - `Outcome::Invalid` with the sorted, de-duplicated issues otherwise
    pub async fn confirm(&self, assertions: &Assertions) -> Outcome {
        tracing::info!(process = %assertions.process_name, "static confirmation started");

        let mut issues = self.check_roles(assertions).await;

        let (trigger_issues, trigger) = self.check_trigger(assertions).await;
        issues.extend(trigger_issues);
        issues.extend(self.check_preceding_actions(assertions).await);
        issues.extend(self.check_entities(assertions, trigger.as_deref()).await);
        issues.extend(self.check_read_models(assertions).await);

        let outcome = Outcome::from_sorted_issues(issues);
        tracing::info!(
            process = %assertions.process_name,
            issues = outcome.issues().len(),
            "static confirmation finished"
        );
        outcome
    }

    /// Read one artifact, turning IO failures into an issue
    async fn load(&self, kind: ArtifactKind, name: &str) -> Result<LocatedDescriptor, Issue> {
        match self.reader.read(kind, name).await {
            Ok(Some(located)) => Ok(located),
            Ok(None) => {
                let path = self.reader.locations().path_for(kind, name);
                Err(Issue::message(format!(
                    "{kind} '{name}' not found at {}",
                    self.reader.display_path(&path)
                )))
            }
            Err(e) => {
                tracing::warn!(%kind, name, error = %e, "could not read artifact");
                Err(Issue::message(format!("could not read {kind} '{name}': {e}")))
            }
        }
    }

    async fn check_roles(&self, assertions: &Assertions) -> Vec<Issue> {
        let required: Vec<&str> = assertions.roles.named().collect();
        if required.is_empty() {
            return Vec::new();
        }

        let path = self.reader.display_path(&self.reader.locations().roles_path());
        match self.reader.read_roles().await {
            Ok(Some(roles)) => required
                .into_iter()
                .filter(|role| !roles.descriptor.classes.contains(*role))
                .map(|role| Issue::message(format!("role '{role}' is not defined in {path}")))
                .collect(),
            Ok(None) => vec![Issue::message(format!("roles file {path} not found"))],
            Err(e) => vec![Issue::message(format!("could not read roles file: {e}"))],
        }
    }

    async fn check_trigger(
        &self,
        assertions: &Assertions,
    ) -> (Vec<Issue>, Option<Arc<ArtifactDescriptor>>) {
        let expectation = match &assertions.trigger {
            Trigger::ActorCommand { command_name, .. } => CommandExpectation {
                kind: ArtifactKind::Command,
                name: command_name,
                roles: Some(&assertions.roles.trigger_write),
                inputs: &assertions.all_scenario_inputs,
                check_required: true,
                check_correlation: true,
            },
            Trigger::ScheduledCommand { command_name, .. } => CommandExpectation {
                kind: ArtifactKind::ScheduledCommand,
                name: command_name,
                roles: None,
                inputs: &assertions.all_scenario_inputs,
                check_required: false,
                check_correlation: false,
            },
        };
        self.check_command(&expectation).await
    }

    async fn check_preceding_actions(&self, assertions: &Assertions) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (name, command) in &assertions.preceding_actions {
            let expectation = CommandExpectation {
                kind: ArtifactKind::Command,
                name,
                roles: Some(&command.authorized),
                inputs: &command.inputs,
                check_required: false,
                check_correlation: false,
            };
            issues.extend(self.check_command(&expectation).await.0);
        }
        issues
    }

    async fn check_command(
        &self,
        expected: &CommandExpectation<'_>,
    ) -> (Vec<Issue>, Option<Arc<ArtifactDescriptor>>) {
        let CommandExpectation { kind, name, .. } = *expected;
        let located = match self.load(kind, name).await {
            Ok(located) => located,
            Err(issue) => return (vec![issue], None),
        };
        let command = &located.descriptor;
        let mut issues = Vec::new();

        if let Some(roles) = expected.roles {
            issues.extend(check_authorization(kind, name, command, roles));
        }

        for (input, assertion) in expected.inputs {
            let Some(field) = command.field(input) else {
                issues.push(Issue::message(format!(
                    "{kind} '{name}' does not declare input '{input}'"
                )));
                continue;
            };
            for used in &assertion.types {
                if !field.accepts(*used) {
                    issues.push(Issue::message(format!(
                        "{kind} '{name}' input '{input}' is declared as {} but scenarios use {used}",
                        field.describe_types()
                    )));
                }
            }
            if expected.check_required && input != TID_FIELD && field.required != assertion.required
            {
                let wanted = if assertion.required { "required" } else { "optional" };
                issues.push(Issue::message(format!(
                    "{kind} '{name}' input '{input}' should be {wanted}"
                )));
            }
        }

        if expected.check_correlation && command.field(TID_FIELD).is_none() {
            issues.push(Issue::message(format!(
                "{kind} '{name}' does not declare the '{TID_FIELD}' correlation field"
            )));
        }

        issues.extend(self.check_registered_events(kind, name, command).await);
        (issues, Some(Arc::clone(&located.descriptor)))
    }

    async fn check_registered_events(
        &self,
        kind: ArtifactKind,
        name: &str,
        command: &ArtifactDescriptor,
    ) -> Vec<Issue> {
        if command.registered_events.is_empty() {
            return vec![Issue::message(format!(
                "{kind} '{name}' does not register any event"
            ))];
        }

        let mut issues = Vec::new();
        for event in &command.registered_events {
            if let Err(issue) = self.load(ArtifactKind::Event, event).await {
                issues.push(Issue::group(
                    format!("{kind} '{name}' registers '{event}'"),
                    vec![issue],
                ));
            }
        }
        issues
    }

    async fn event_graph(&self) -> Result<EventGraph, Issue> {
        let handlers = self
            .reader
            .read_all(ArtifactKind::EventHandler)
            .await
            .map_err(|e| Issue::message(format!("could not read event handlers: {e}")))?;
        Ok(EventGraph::from_handlers(
            handlers.iter().map(|h| h.descriptor.as_ref()),
        ))
    }

    async fn check_entities(
        &self,
        assertions: &Assertions,
        trigger: Option<&ArtifactDescriptor>,
    ) -> Vec<Issue> {
        if assertions.all_entities.is_empty() {
            return Vec::new();
        }

        let mut issues = Vec::new();
        let graph = match self.event_graph().await {
            Ok(graph) => Some(graph),
            Err(issue) => {
                issues.push(issue);
                None
            }
        };
        let hops = self.config.max_handler_hops;
        let trigger_name = assertions.trigger.command_name();

        for (name, fields) in &assertions.all_entities {
            let located = match self.load(ArtifactKind::Entity, name).await {
                Ok(located) => located,
                Err(issue) => {
                    issues.push(issue);
                    continue;
                }
            };
            let entity = &located.descriptor;
            issues.extend(check_fields(ArtifactKind::Entity, name, entity, fields));

            if entity.reduced_events.is_empty() {
                issues.push(Issue::message(format!(
                    "entity '{name}' does not reduce any event"
                )));
                continue;
            }

            if let (Some(trigger), Some(graph)) = (trigger, &graph) {
                if !graph.reaches(&trigger.registered_events, &entity.reduced_events, hops) {
                    issues.push(Issue::message(format!(
                        "no event path from trigger '{trigger_name}' to entity '{name}' within {hops} handler hop(s)"
                    )));
                }
            }
        }
        issues
    }

    async fn check_read_models(&self, assertions: &Assertions) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (name, read_model) in &assertions.all_read_models {
            let located = match self.load(ArtifactKind::ReadModel, name).await {
                Ok(located) => located,
                Err(issue) => {
                    issues.push(issue);
                    continue;
                }
            };
            let descriptor = &located.descriptor;
            issues.extend(check_fields(
                ArtifactKind::ReadModel,
                name,
                descriptor,
                &read_model.fields,
            ));

            if descriptor.projected_entities.is_empty() {
                issues.push(Issue::message(format!(
                    "read model '{name}' does not project any entity"
                )));
            }
            for entity in &descriptor.projected_entities {
                if !assertions.all_entities.contains_key(entity) {
                    issues.push(Issue::message(format!(
                        "read model '{name}' projects '{entity}' which no scenario expects to change"
                    )));
                }
            }

            issues.extend(check_authorization(
                ArtifactKind::ReadModel,
                name,
                descriptor,
                &read_model.authorized,
            ));
        }
        issues
    }
}

fn check_authorization(
    kind: ArtifactKind,
    name: &str,
    descriptor: &ArtifactDescriptor,
    expected: &BTreeSet<String>,
) -> Option<Issue> {
    match &descriptor.authorization {
        None => Some(Issue::message(format!(
            "{kind} '{name}' does not declare an authorization"
        ))),
        Some(declared) if !declared.satisfies(expected) => Some(Issue::message(format!(
            "{kind} '{name}' authorizes {declared} but {} is expected",
            describe_roles(expected)
        ))),
        Some(_) => None,
    }
}

/// Declared fields must cover every asserted field and type.
///
/// Field failures for one artifact are grouped under a single heading.
fn check_fields(
    kind: ArtifactKind,
    name: &str,
    descriptor: &ArtifactDescriptor,
    fields: &FieldTable,
) -> Option<Issue> {
    let mut items = Vec::new();
    for (field, types) in fields {
        let Some(declared) = descriptor.field(field) else {
            items.push(Issue::message(format!("field '{field}' is not declared")));
            continue;
        };
        for expected in types {
            if !declared.accepts(*expected) {
                items.push(Issue::message(format!(
                    "field '{field}' is declared as {} but {expected} is expected",
                    declared.describe_types()
                )));
            }
        }
    }

    if items.is_empty() {
        None
    } else {
        items.sort();
        Some(Issue::group(format!("{kind} '{name}'"), items))
    }
}
