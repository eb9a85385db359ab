//! Assertion gathering
//!
//! Pure, deterministic `Process → Assertions`. All collections are ordered
//! sets and maps, so gathering the same process twice yields equal values.

use bpt_model::case::to_camel;
use bpt_model::{Inputs, Process, RoleSpec, Scenario, Trigger, ValueMap, ValueType, ALL_ROLES};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Field name → union of inferred types
pub type FieldTable = BTreeMap<String, BTreeSet<ValueType>>;

/// Merged knowledge about one command input
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InputAssertion {
    /// Union of inferred types across every occurrence
    pub types: BTreeSet<ValueType>,
    /// True iff the input occurs in every scenario (or every action call)
    pub required: bool,
}

/// Merged expectations for one read model
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReadModelAssertion {
    pub fields: FieldTable,
    pub authorized: BTreeSet<String>,
}

/// Merged expectations for one preceding-action command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CommandAssertion {
    pub inputs: BTreeMap<String, InputAssertion>,
    pub authorized: BTreeSet<String>,
}

/// Disjoint role partitions, each sorted and de-duplicated
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RolePartitions {
    /// Roles allowed to invoke the trigger
    pub trigger_write: BTreeSet<String>,
    /// Roles used by preceding actions
    pub pa_write: BTreeSet<String>,
    /// Roles expected to see read-model updates
    pub read: BTreeSet<String>,
    /// Union of the three partitions
    pub all: BTreeSet<String>,
}

impl RolePartitions {
    /// Roles other than the `"all"` keyword
    pub fn named(&self) -> impl Iterator<Item = &str> {
        self.all.iter().map(String::as_str).filter(|r| *r != ALL_ROLES)
    }
}

/// Normalized view of a process used by both confirmation stages
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assertions {
    pub process_name: String,
    pub trigger: Trigger,
    pub scenarios: Vec<Scenario>,
    pub roles: RolePartitions,
    pub all_scenario_inputs: BTreeMap<String, InputAssertion>,
    pub all_entities: BTreeMap<String, FieldTable>,
    pub all_read_models: BTreeMap<String, ReadModelAssertion>,
    pub preceding_actions: BTreeMap<String, CommandAssertion>,
}

impl Assertions {
    /// Trigger write roles as a list, in sorted order
    #[must_use]
    pub fn trigger_write_roles(&self) -> Vec<String> {
        self.roles.trigger_write.iter().cloned().collect()
    }
}

/// Merge `spec` into an accumulated partition.
///
/// `"all"` absorbs: once present it is the sole member, whichever side brought it.
fn merge_roles(acc: &mut BTreeSet<String>, spec: &RoleSpec) {
    let incoming = spec.to_set();
    if acc.contains(ALL_ROLES) {
        return;
    }
    if incoming.contains(ALL_ROLES) {
        acc.clear();
        acc.insert(ALL_ROLES.to_string());
        return;
    }
    acc.extend(incoming);
}

fn merge_fields(table: &mut FieldTable, values: &ValueMap) {
    for (key, value) in values {
        table
            .entry(to_camel(key))
            .or_default()
            .insert(ValueType::infer(value));
    }
}

/// Merge several input maps; an input is required iff every map has it.
fn merge_inputs<'a, I>(calls: I) -> BTreeMap<String, InputAssertion>
where
    I: IntoIterator<Item = &'a Inputs>,
{
    let mut merged: BTreeMap<String, InputAssertion> = BTreeMap::new();
    let mut common: Option<BTreeSet<&str>> = None;

    for inputs in calls {
        for (name, value) in inputs {
            merged
                .entry(name.clone())
                .or_default()
                .types
                .insert(ValueType::infer(value));
        }
        let keys: BTreeSet<&str> = inputs.keys().map(String::as_str).collect();
        common = Some(match common {
            None => keys,
            Some(acc) => acc.intersection(&keys).copied().collect(),
        });
    }

    let common = common.unwrap_or_default();
    for (name, input) in &mut merged {
        input.required = common.contains(name.as_str());
    }
    merged
}

fn partition_roles(process: &Process) -> RolePartitions {
    let mut roles = RolePartitions::default();

    if let Some(authorized) = process.trigger.authorized() {
        merge_roles(&mut roles.trigger_write, authorized);
    }
    for scenario in &process.scenarios {
        for action in &scenario.preceding_actions {
            merge_roles(&mut roles.pa_write, &action.authorized);
        }
        for update in &scenario.expected_visible_updates {
            if let Some(authorized) = &update.authorized {
                merge_roles(&mut roles.read, authorized);
            }
        }
    }

    roles.all = roles
        .trigger_write
        .iter()
        .chain(&roles.pa_write)
        .chain(&roles.read)
        .cloned()
        .collect();
    roles
}

fn gather_entities(process: &Process) -> BTreeMap<String, FieldTable> {
    let mut entities: BTreeMap<String, FieldTable> = BTreeMap::new();
    for update in process.scenarios.iter().flat_map(Scenario::state_updates) {
        let table = entities.entry(update.entity_name.clone()).or_default();
        if let Some(values) = &update.values {
            merge_fields(table, values);
        }
    }
    entities
}

fn gather_read_models(process: &Process) -> BTreeMap<String, ReadModelAssertion> {
    let mut read_models: BTreeMap<String, ReadModelAssertion> = BTreeMap::new();
    for update in process
        .scenarios
        .iter()
        .flat_map(|s| &s.expected_visible_updates)
    {
        let entry = read_models.entry(update.read_model_name.clone()).or_default();
        if let Some(values) = &update.values {
            merge_fields(&mut entry.fields, values);
        }
        if let Some(authorized) = &update.authorized {
            merge_roles(&mut entry.authorized, authorized);
        }
    }
    read_models
}

fn gather_preceding_actions(process: &Process) -> BTreeMap<String, CommandAssertion> {
    let mut by_command: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for action in process.scenarios.iter().flat_map(|s| &s.preceding_actions) {
        by_command
            .entry(action.command_name.as_str())
            .or_default()
            .push(action);
    }

    by_command
        .into_iter()
        .map(|(name, actions)| {
            let mut authorized = BTreeSet::new();
            for action in &actions {
                merge_roles(&mut authorized, &action.authorized);
            }
            let inputs = merge_inputs(actions.iter().map(|a| &a.inputs));
            (name.to_string(), CommandAssertion { inputs, authorized })
        })
        .collect()
}

/// Build the normalized assertion set for a process
#[must_use]
pub fn gather(process: &Process) -> Assertions {
    let all_scenario_inputs = if process.trigger.is_actor_command() {
        merge_inputs(process.scenarios.iter().map(|s| &s.inputs))
    } else {
        BTreeMap::new()
    };

    let assertions = Assertions {
        process_name: process.name.clone(),
        trigger: process.trigger.clone(),
        scenarios: process.scenarios.clone(),
        roles: partition_roles(process),
        all_scenario_inputs,
        all_entities: gather_entities(process),
        all_read_models: gather_read_models(process),
        preceding_actions: gather_preceding_actions(process),
    };

    tracing::debug!(
        process = %assertions.process_name,
        inputs = assertions.all_scenario_inputs.len(),
        entities = assertions.all_entities.len(),
        read_models = assertions.all_read_models.len(),
        "gathered assertions"
    );
    assertions
}
