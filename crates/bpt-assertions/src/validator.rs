//! Structural validation of a process description
//!
//! Every rule is evaluated independently so that all defects are reported in
//! one pass. Process-level defects are flat issues; scenario-level defects are
//! grouped under a heading per scenario.

use bpt_model::{
    find_duplicates, is_blank, Issue, Outcome, PrecedingAction, Process, RoleSpec, Scenario,
    StateUpdate, Trigger, ValueMap, VisibleUpdate,
};
use serde_json::Value;

/// Pre-flight validator gating gathering and confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessValidator;

impl ProcessValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate the whole process
    ///
    /// # Returns
    /// - `Outcome::Valid` if no rule is violated
    /// - `Outcome::Invalid` with every violation otherwise
    #[must_use]
    pub fn validate(&self, process: &Process) -> Outcome {
        let mut issues = Self::validate_header(process);

        for (index, scenario) in process.scenarios.iter().enumerate() {
            let items = Self::validate_scenario(&process.trigger, scenario);
            if !items.is_empty() {
                issues.push(Issue::group(Self::scenario_heading(index, scenario), items));
            }
        }

        if !issues.is_empty() {
            tracing::info!(
                process = %process.name,
                issues = issues.len(),
                "process description failed validation"
            );
        }
        Outcome::from_issues(issues)
    }

    fn scenario_heading(index: usize, scenario: &Scenario) -> String {
        if scenario.name.trim().is_empty() {
            format!("Scenario #{}", index + 1)
        } else {
            format!("Scenario '{}'", scenario.name)
        }
    }

    fn validate_header(process: &Process) -> Vec<Issue> {
        let mut issues = Vec::new();

        if process.name.trim().is_empty() {
            issues.push(Issue::message("process name must not be blank"));
        }
        if process.trigger.command_name().trim().is_empty() {
            issues.push(Issue::message("trigger command name must not be blank"));
        }
        match &process.trigger {
            Trigger::ActorCommand { authorized, .. } if authorized.is_blank() => {
                issues.push(Issue::message("trigger authorization must not be blank"));
            }
            Trigger::ScheduledCommand { schedule, .. } if schedule.trim().is_empty() => {
                issues.push(Issue::message("trigger schedule must not be blank"));
            }
            _ => {}
        }

        if process.scenarios.is_empty() {
            issues.push(Issue::message("process must declare at least one scenario"));
        }

        let blank_names = process
            .scenarios
            .iter()
            .filter(|s| s.name.trim().is_empty())
            .count();
        if blank_names > 0 {
            issues.push(Issue::message(format!(
                "scenario names must not be blank ({blank_names} blank)"
            )));
        }

        let duplicates = find_duplicates(
            process
                .scenario_names()
                .filter(|name| !name.trim().is_empty()),
        );
        if !duplicates.is_empty() {
            issues.push(Issue::message(format!(
                "scenario names must be unique (duplicated: {})",
                duplicates.join(", ")
            )));
        }

        issues
    }

    fn validate_scenario(trigger: &Trigger, scenario: &Scenario) -> Vec<Issue> {
        let mut issues = Vec::new();

        if trigger.is_actor_command() {
            if scenario.inputs.is_empty() {
                issues.push(Issue::message("inputs must not be empty"));
            } else if !scenario.should_be_rejected {
                // Rejection scenarios legitimately send blank values.
                let blank: Vec<&str> = scenario
                    .inputs
                    .iter()
                    .filter(|(_, v)| is_blank(v))
                    .map(|(k, _)| k.as_str())
                    .collect();
                if !blank.is_empty() {
                    issues.push(Issue::message(format!(
                        "input values must not be blank: {}",
                        blank.join(", ")
                    )));
                }
            }
        }

        for (index, action) in scenario.preceding_actions.iter().enumerate() {
            issues.extend(Self::validate_preceding_action(index, action));
        }

        match &scenario.expected_state_updates {
            None if !scenario.should_be_rejected => {
                issues.push(Issue::message(
                    "expectedStateUpdates are required unless the scenario should be rejected",
                ));
            }
            Some(updates) if updates.is_empty() && !scenario.should_be_rejected => {
                issues.push(Issue::message(
                    "expectedStateUpdates must not be empty unless the scenario should be rejected",
                ));
            }
            _ => {}
        }

        for (index, update) in scenario.state_updates().iter().enumerate() {
            issues.extend(Self::validate_state_update(index, update));
        }
        for (index, update) in scenario.expected_visible_updates.iter().enumerate() {
            issues.extend(Self::validate_visible_update(index, update));
        }

        issues
    }

    fn validate_preceding_action(index: usize, action: &PrecedingAction) -> Vec<Issue> {
        let label = format!("preceding action #{}", index + 1);
        let mut issues = Vec::new();

        if action.command_name.trim().is_empty() {
            issues.push(Issue::message(format!("{label}: command name must not be blank")));
        }
        if action.inputs.is_empty() {
            issues.push(Issue::message(format!("{label}: inputs must not be empty")));
        } else if action.inputs.values().any(is_blank) {
            issues.push(Issue::message(format!("{label}: input values must not be blank")));
        }
        if action.authorized.is_blank() {
            issues.push(Issue::message(format!("{label}: authorization must not be blank")));
        }
        issues
    }

    fn validate_value_blocks(
        label: &str,
        values: Option<&ValueMap>,
        not_values: Option<&ValueMap>,
    ) -> Vec<Issue> {
        let mut issues = Vec::new();

        if values.is_none() && not_values.is_none() {
            issues.push(Issue::message(format!(
                "{label}: must declare values or notValues"
            )));
        }
        for (block, name) in [(values, "values"), (not_values, "notValues")] {
            let Some(block) = block else { continue };
            if block.is_empty() {
                issues.push(Issue::message(format!("{label}: {name} must not be empty")));
            } else if block.values().any(has_blank_leaf) {
                issues.push(Issue::message(format!(
                    "{label}: {name} must not contain blank values"
                )));
            }
        }
        issues
    }

    fn validate_state_update(index: usize, update: &StateUpdate) -> Vec<Issue> {
        let label = format!("state update #{}", index + 1);
        let mut issues = Vec::new();

        if update.entity_name.trim().is_empty() {
            issues.push(Issue::message(format!("{label}: entity name must not be blank")));
        }
        issues.extend(Self::validate_value_blocks(
            &label,
            update.values.as_ref(),
            update.not_values.as_ref(),
        ));
        issues
    }

    fn validate_visible_update(index: usize, update: &VisibleUpdate) -> Vec<Issue> {
        let label = format!("visible update #{}", index + 1);
        let mut issues = Vec::new();

        if update.read_model_name.trim().is_empty() {
            issues.push(Issue::message(format!(
                "{label}: read model name must not be blank"
            )));
        }
        issues.extend(Self::validate_value_blocks(
            &label,
            update.values.as_ref(),
            update.not_values.as_ref(),
        ));

        match &update.authorized {
            None => issues.push(Issue::message(format!(
                "{label}: authorization must be declared"
            ))),
            Some(spec) if spec.is_blank() => issues.push(Issue::message(format!(
                "{label}: authorization must not be blank"
            ))),
            Some(spec @ RoleSpec::One(role)) if spec.is_single_named_role() => {
                issues.push(Issue::message(format!(
                    "{label}: authorization '{role}' must be given as a list of roles"
                )));
            }
            Some(_) => {}
        }
        issues
    }
}

fn has_blank_leaf(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().any(has_blank_leaf),
        Value::Object(map) => map.values().any(has_blank_leaf),
        leaf => is_blank(leaf),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_process() -> Process {
        serde_json::from_value(json!({
            "name": "Order a cocktail",
            "trigger": { "type": "ActorCommand", "commandName": "OrderCocktail", "authorized": "all" },
            "scenarios": [{
                "name": "gimlet",
                "inputs": { "drink": "gimlet" },
                "expectedStateUpdates": [{ "entityName": "Drink", "values": { "drink": "Gimlet" } }],
                "expectedVisibleUpdates": [{
                    "readModelName": "DrinkReadModel",
                    "values": { "drink": "Gimlet" },
                    "authorized": ["Guest"]
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn valid_process_passes() {
        assert!(ProcessValidator::new().validate(&valid_process()).is_valid());
    }

    #[test]
    fn blank_scenario_name_is_one_issue() {
        let mut process = valid_process();
        process.scenarios[0].name = "  ".to_string();
        let outcome = ProcessValidator::new().validate(&process);
        assert_eq!(outcome.issues().len(), 1);
        assert!(outcome.messages()[0].contains("scenario names must not be blank"));
    }

    #[test]
    fn duplicate_scenarios_are_reported() {
        let mut process = valid_process();
        process.scenarios.push(process.scenarios[0].clone());
        let outcome = ProcessValidator::new().validate(&process);
        assert_eq!(outcome.messages(), vec!["scenario names must be unique (duplicated: gimlet)"]);
    }

    #[test]
    fn all_defects_reported_at_once() {
        let mut process = valid_process();
        process.name = String::new();
        process.scenarios[0].expected_state_updates = None;
        process.scenarios[0].expected_visible_updates[0].authorized =
            Some(RoleSpec::One("Guest".to_string()));

        let messages = ProcessValidator::new().validate(&process).messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("process name"));
        assert!(messages[1].contains("expectedStateUpdates are required"));
        assert!(messages[2].contains("must be given as a list of roles"));
    }

    #[test]
    fn rejection_scenario_may_omit_state_and_blank_inputs() {
        let mut process = valid_process();
        let scenario = &mut process.scenarios[0];
        scenario.should_be_rejected = true;
        scenario.inputs.insert("drink".to_string(), json!(""));
        scenario.expected_state_updates = None;
        scenario.expected_visible_updates.clear();
        assert!(ProcessValidator::new().validate(&process).is_valid());
    }

    #[test]
    fn blank_nested_leaf_is_flagged() {
        let mut process = valid_process();
        process.scenarios[0].expected_state_updates = Some(vec![StateUpdate {
            entity_name: "Drink".to_string(),
            values: serde_json::from_value(json!({ "garnish": { "kind": " " } })).unwrap(),
            ..StateUpdate::default()
        }]);
        let messages = ProcessValidator::new().validate(&process).messages();
        assert_eq!(
            messages,
            vec!["Scenario 'gimlet': state update #1: values must not contain blank values"]
        );
    }

    #[test]
    fn update_without_any_block_is_flagged() {
        let mut process = valid_process();
        process.scenarios[0].expected_visible_updates[0].values = None;
        let messages = ProcessValidator::new().validate(&process).messages();
        assert_eq!(
            messages,
            vec!["Scenario 'gimlet': visible update #1: must declare values or notValues"]
        );
    }

    #[test]
    fn preceding_action_rules() {
        let mut process = valid_process();
        process.scenarios[0].preceding_actions.push(PrecedingAction::default());
        let messages = ProcessValidator::new().validate(&process).messages();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.contains("preceding action #1")));
    }

    #[test]
    fn scheduled_trigger_needs_schedule_not_inputs() {
        let mut process = valid_process();
        process.trigger = Trigger::ScheduledCommand {
            command_name: "CloseBar".to_string(),
            schedule: String::new(),
        };
        process.scenarios[0].inputs.clear();
        let messages = ProcessValidator::new().validate(&process).messages();
        assert_eq!(messages, vec!["trigger schedule must not be blank"]);
    }
}
