//! Dynamic Assertion Confirmation
//!
//! Drives a running application through every scenario and observes the
//! result. Stages run strictly in order:
//!
//! 1. negative-input probe and role-gating probe, once per trigger
//! 2. per scenario: preceding actions, then the trigger
//! 3. state confirmation by polling the snapshot store
//! 4. read-model visibility, only when every state update confirmed
//!
//! Failures never abort the run; they become issues grouped per scenario.

use crate::compare::{check_not_values, check_values};
use crate::config::DynamicConfig;
use crate::error::TransportError;
use crate::mutation::MutationBuilder;
use crate::poll::poll_until;
use crate::query::{not_values_filter, values_filter, ReadModelQuery};
use crate::roles::ClientRegistry;
use crate::store::{SnapshotEnvelope, SnapshotKey, SnapshotStore};
use crate::transport::{GraphQlClient, GraphQlRequest};
use bpt_assertions::Assertions;
use bpt_model::{
    CorrelationId, Issue, Outcome, RoleSpec, Scenario, StateUpdate, VisibleUpdate,
    ALL_ROLES, TID_FIELD,
};
use bpt_static::{ArtifactDescriptor, ArtifactKind, ArtifactReader};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Correlation of one scenario run
struct ScenarioRun<'a> {
    scenario: &'a Scenario,
    /// Injected into every command that lacks a `tid`
    tid: Value,
    /// Item id used when an update names none
    default_item_id: Option<String>,
}

impl<'a> ScenarioRun<'a> {
    fn new(scenario: &'a Scenario, scheduled: bool) -> Self {
        let tid = scenario
            .inputs
            .get(TID_FIELD)
            .cloned()
            .unwrap_or_else(|| CorrelationId::new().to_value());
        let default_item_id = (!scheduled).then(|| match &tid {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        });
        Self {
            scenario,
            tid,
            default_item_id,
        }
    }

    fn item_id(&self, explicit: Option<&String>) -> Option<String> {
        explicit.cloned().or_else(|| self.default_item_id.clone())
    }
}

/// Live scenario runner
#[derive(Debug, Clone)]
pub struct DynamicConfirmation {
    registry: Arc<ClientRegistry>,
    store: Arc<dyn SnapshotStore>,
    reader: Option<ArtifactReader>,
    config: DynamicConfig,
}

impl DynamicConfirmation {
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            registry,
            store,
            reader: None,
            config: DynamicConfig::default(),
        }
    }

    /// Read command sources to learn which preceding-action inputs are required
    #[must_use]
    pub fn with_reader(mut self, reader: ArtifactReader) -> Self {
        self.reader = Some(reader);
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: DynamicConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DynamicConfig {
        &self.config
    }

    /// Run every scenario against the live application
    ///
    /// # Returns
    /// - `Outcome::Valid` if every expectation held
    /// - `Outcome::Invalid` with probe issues first, then one group per
    ///   failing scenario, in declared order
    pub async fn confirm(&self, assertions: &Assertions) -> Outcome {
        tracing::info!(
            process = %assertions.process_name,
            scenarios = assertions.scenarios.len(),
            "dynamic confirmation started"
        );

        let mut issues = Vec::new();
        if assertions.trigger.is_actor_command() {
            issues.extend(self.probe_empty_inputs(assertions).await);
            issues.extend(self.probe_roles(assertions).await);
        }

        let commands = self.declared_commands(assertions).await;
        for scenario in &assertions.scenarios {
            let scenario_issues = self.run_scenario(assertions, scenario, &commands).await;
            if !scenario_issues.is_empty() {
                issues.push(Issue::group(
                    format!("Scenario '{}'", scenario.name),
                    scenario_issues,
                ));
            }
        }

        let outcome = Outcome::from_issues(issues);
        tracing::info!(
            process = %assertions.process_name,
            issues = outcome.issues().len(),
            "dynamic confirmation finished"
        );
        outcome
    }

    /// The trigger must refuse a call with every input blanked out
    async fn probe_empty_inputs(&self, assertions: &Assertions) -> Vec<Issue> {
        let command = assertions.trigger.command_name();
        if assertions.all_scenario_inputs.is_empty() {
            return Vec::new();
        }
        let client = match self.registry.resolve(&assertions.roles.trigger_write) {
            Ok(client) => client,
            Err(e) => {
                return vec![Issue::message(format!(
                    "trigger '{command}' could not be probed: {e}"
                ))]
            }
        };

        let request = MutationBuilder::empty(command, &assertions.all_scenario_inputs).build();
        match client.execute(&request).await {
            Ok(_) => vec![Issue::message(format!(
                "trigger '{command}' allows empty inputs"
            ))],
            Err(e) if e.is_rejection() => {
                tracing::debug!(command, error = %e, "empty inputs rejected");
                Vec::new()
            }
            Err(e) => vec![Issue::message(format!(
                "trigger '{command}' could not be probed: {e}"
            ))],
        }
    }

    /// Every trigger role other than the one the empty-input probe ran as
    /// must be allowed to run it
    async fn probe_roles(&self, assertions: &Assertions) -> Vec<Issue> {
        let roles = &assertions.roles.trigger_write;
        if roles.contains(ALL_ROLES) || roles.len() <= self.config.role_probe_threshold {
            return Vec::new();
        }
        let Some(sample) = assertions.scenarios.iter().find(|s| !s.should_be_rejected) else {
            return Vec::new();
        };

        let command = assertions.trigger.command_name();
        let covered = roles.iter().find(|role| self.registry.client(role).is_some());
        let mut issues = Vec::new();
        for role in roles.iter().filter(|role| Some(*role) != covered) {
            let Some(client) = self.registry.client(role) else {
                issues.push(Issue::message(format!(
                    "trigger '{command}' could not be probed as role '{role}': no client configured"
                )));
                continue;
            };
            let request = MutationBuilder::new(command)
                .with_inputs(&sample.inputs)
                .with_correlation(&CorrelationId::new().to_value())
                .build();
            match client.execute(&request).await {
                Ok(_) => tracing::debug!(command, role = %role, "role allowed"),
                Err(e) if e.is_rejection() => issues.push(Issue::message(format!(
                    "trigger '{command}' rejected role '{role}': {e}"
                ))),
                Err(e) => issues.push(Issue::message(format!(
                    "trigger '{command}' could not be probed as role '{role}': {e}"
                ))),
            }
        }
        issues
    }

    /// Descriptor of every command used as a preceding action, read once
    async fn declared_commands(
        &self,
        assertions: &Assertions,
    ) -> BTreeMap<String, Arc<ArtifactDescriptor>> {
        let Some(reader) = &self.reader else {
            return BTreeMap::new();
        };
        let mut commands = BTreeMap::new();
        for name in assertions.preceding_actions.keys() {
            match reader.read(ArtifactKind::Command, name).await {
                Ok(Some(located)) => {
                    commands.insert(name.clone(), located.descriptor);
                }
                Ok(None) => tracing::debug!(command = %name, "preceding action source not found"),
                Err(e) => tracing::warn!(command = %name, error = %e, "could not read command"),
            }
        }
        commands
    }

    async fn run_scenario(
        &self,
        assertions: &Assertions,
        scenario: &Scenario,
        commands: &BTreeMap<String, Arc<ArtifactDescriptor>>,
    ) -> Vec<Issue> {
        tracing::info!(scenario = %scenario.name, "running scenario");
        let run = ScenarioRun::new(scenario, !assertions.trigger.is_actor_command());

        let mut issues = self.run_preceding_actions(&run, commands).await;
        match self.run_trigger(assertions, &run).await {
            Ok(trigger_issues) => issues.extend(trigger_issues),
            Err(issue) => {
                issues.push(issue);
                return issues;
            }
        }

        if scenario.should_be_rejected {
            return issues;
        }

        let mut state_confirmed = true;
        for update in scenario.state_updates() {
            let Some(item_id) = run.item_id(update.item_id.as_ref()) else {
                issues.push(Issue::message(format!(
                    "entity '{}' needs an itemId because the trigger is scheduled",
                    update.entity_name
                )));
                state_confirmed = false;
                continue;
            };
            if let Some(issue) = self.confirm_state(update, &item_id).await {
                issues.push(issue);
                state_confirmed = false;
            }
        }

        if !state_confirmed {
            tracing::debug!(scenario = %scenario.name, "state not confirmed, skipping visibility");
            return issues;
        }

        for update in &scenario.expected_visible_updates {
            let Some(item_id) = run.item_id(update.item_id.as_ref()) else {
                issues.push(Issue::message(format!(
                    "read model '{}' needs an itemId because the trigger is scheduled",
                    update.read_model_name
                )));
                continue;
            };
            issues.extend(self.confirm_visibility(update, &item_id).await);
        }
        issues
    }

    async fn run_preceding_actions(
        &self,
        run: &ScenarioRun<'_>,
        commands: &BTreeMap<String, Arc<ArtifactDescriptor>>,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();
        for (index, action) in run.scenario.preceding_actions.iter().enumerate() {
            let label = format!("preceding action #{} '{}'", index + 1, action.command_name);

            if let Some(descriptor) = commands.get(&action.command_name) {
                for (name, field) in &descriptor.fields {
                    if field.required && name != TID_FIELD && !action.inputs.contains_key(name) {
                        issues.push(Issue::message(format!(
                            "{label} is missing required input '{name}'"
                        )));
                    }
                }
            }

            let client = match self.registry.resolve_spec(&action.authorized) {
                Ok(client) => client,
                Err(e) => {
                    issues.push(Issue::message(format!("{label} could not run: {e}")));
                    continue;
                }
            };
            let request = MutationBuilder::new(&action.command_name)
                .with_inputs(&action.inputs)
                .with_correlation(&run.tid)
                .build();
            if let Err(e) = client.execute(&request).await {
                issues.push(Issue::message(format!("{label} failed: {e}")));
            }
        }
        issues
    }

    /// Invoke an actor trigger and judge the result against the scenario.
    ///
    /// `Err` means the trigger could not be attempted and the scenario stops.
    async fn run_trigger(
        &self,
        assertions: &Assertions,
        run: &ScenarioRun<'_>,
    ) -> Result<Vec<Issue>, Issue> {
        let command = assertions.trigger.command_name();
        if !assertions.trigger.is_actor_command() {
            tracing::debug!(command, "scheduled trigger is left to the scheduler");
            return Ok(Vec::new());
        }

        let client = self
            .registry
            .resolve(&assertions.roles.trigger_write)
            .map_err(|e| Issue::message(format!("trigger '{command}' could not run: {e}")))?;
        let request = MutationBuilder::new(command)
            .with_inputs(&run.scenario.inputs)
            .with_correlation(&run.tid)
            .build();
        let result = client.execute(&request).await;

        let issue = match (run.scenario.should_be_rejected, result) {
            (true, Ok(_)) => Some(format!(
                "trigger '{command}' was expected to be rejected but was not"
            )),
            (true, Err(e)) if !e.is_rejection() => {
                Some(format!("trigger '{command}' could not be reached: {e}"))
            }
            (false, Err(e)) => Some(format!("trigger '{command}' failed: {e}")),
            _ => None,
        };
        Ok(issue.map(Issue::message).into_iter().collect())
    }

    async fn confirm_state(&self, update: &StateUpdate, item_id: &str) -> Option<Issue> {
        let key = SnapshotKey::new(&update.entity_name, item_id);
        let found = poll_until(self.config.poll_interval(), self.config.result_wait(), || {
            self.latest_snapshot(&key)
        })
        .await;

        let latest = match found {
            Ok(latest) => latest,
            Err(timeout) => {
                tracing::debug!(%key, attempts = timeout.attempts, "snapshot did not appear");
                return Some(Issue::message(format!(
                    "'{key}' not found within {} ms",
                    self.config.result_wait_ms
                )));
            }
        };

        let mut failures = Vec::new();
        if let Some(values) = &update.values {
            failures.extend(check_values(values, &latest.value));
        }
        if let Some(not_values) = &update.not_values {
            failures.extend(check_not_values(not_values, &latest.value));
        }
        if failures.is_empty() {
            return None;
        }

        let mut items: Vec<Issue> = failures
            .iter()
            .map(|failure| Issue::message(failure.to_string()))
            .collect();
        items.sort();
        Some(Issue::group(
            format!("entity '{}' ({key})", update.entity_name),
            items,
        ))
    }

    async fn latest_snapshot(&self, key: &SnapshotKey) -> Option<SnapshotEnvelope> {
        match self.store.snapshots(key).await {
            Ok(snapshots) => SnapshotEnvelope::latest(&snapshots).cloned(),
            Err(e) => {
                tracing::warn!(%key, error = %e, "snapshot lookup failed");
                None
            }
        }
    }

    async fn confirm_visibility(&self, update: &VisibleUpdate, item_id: &str) -> Vec<Issue> {
        let read_model = &update.read_model_name;
        let roles = update
            .authorized
            .as_ref()
            .map(RoleSpec::to_set)
            .filter(|roles| !roles.is_empty())
            .unwrap_or_else(|| BTreeSet::from([ALL_ROLES.to_string()]));

        let mut issues = Vec::new();
        for role in &roles {
            let Some(client) = self.registry.client(role) else {
                issues.push(Issue::message(format!(
                    "read model '{read_model}' could not be queried as role '{role}': no client configured"
                )));
                continue;
            };

            if let Some(values) = update.values.as_ref().filter(|m| !m.is_empty()) {
                let query = ReadModelQuery::new(read_model)
                    .with_filter(values_filter(update.id_key(), item_id, values))
                    .select(update.id_key());
                match list(client.as_ref(), &query).await {
                    Ok(items) if items.is_empty() => issues.push(Issue::message(format!(
                        "read model '{read_model}' item '{item_id}' not found for role '{role}'"
                    ))),
                    Ok(_) => {}
                    Err(e) => issues.push(Issue::message(format!(
                        "read model '{read_model}' query for role '{role}' failed: {e}"
                    ))),
                }
            }

            let Some(not_values) = update.not_values.as_ref().filter(|m| !m.is_empty()) else {
                continue;
            };
            let query = ReadModelQuery::new(read_model)
                .with_filter(not_values_filter(update.id_key(), item_id, not_values))
                .select(update.id_key());
            match list(client.as_ref(), &query).await {
                Ok(items) if items.is_empty() => {}
                Ok(_) => issues.push(Issue::message(format!(
                    "read model '{read_model}' item '{item_id}' found for role '{role}' that should not exist"
                ))),
                Err(e) => issues.push(Issue::message(format!(
                    "could not confirm absence in read model '{read_model}' for role '{role}': {e}"
                ))),
            }
        }
        issues
    }
}

async fn list(
    client: &dyn GraphQlClient,
    query: &ReadModelQuery,
) -> Result<Vec<Value>, TransportError> {
    let request: GraphQlRequest = query.build();
    let data = client.execute(&request).await?;
    query.items(&data)
}
