//! Command mutation builder
//!
//! Commands are exposed as `Command(input: CommandInput!)` mutations.

use crate::transport::GraphQlRequest;
use bpt_assertions::InputAssertion;
use bpt_model::{Inputs, ValueType, TID_FIELD};
use serde_json::{Map, Value};

/// Builds the mutation invoking one command
#[derive(Debug, Clone, PartialEq)]
pub struct MutationBuilder {
    command: String,
    input: Map<String, Value>,
}

impl MutationBuilder {
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            input: Map::new(),
        }
    }

    /// Mutation with every asserted input set to an empty placeholder:
    /// `""` for string-like inputs, `null` for everything else.
    #[must_use]
    pub fn empty<'a, I>(command: impl Into<String>, inputs: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a InputAssertion)>,
    {
        let input = inputs
            .into_iter()
            .map(|(name, assertion)| (name.clone(), placeholder(assertion)))
            .collect();
        Self {
            command: command.into(),
            input,
        }
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: &Inputs) -> Self {
        for (name, value) in inputs {
            self.input.insert(name.clone(), value.clone());
        }
        self
    }

    /// Inject `tid` unless the inputs already carry one
    #[must_use]
    pub fn with_correlation(mut self, tid: &Value) -> Self {
        self.input
            .entry(TID_FIELD.to_string())
            .or_insert_with(|| tid.clone());
        self
    }

    #[inline]
    #[must_use]
    pub fn input(&self) -> &Map<String, Value> {
        &self.input
    }

    #[must_use]
    pub fn build(self) -> GraphQlRequest {
        let query = format!(
            "mutation {name}($input: {name}Input!) {{ {name}(input: $input) }}",
            name = self.command
        );
        GraphQlRequest::new(self.command, query).with_variable("input", Value::Object(self.input))
    }
}

fn placeholder(assertion: &InputAssertion) -> Value {
    let string_like = assertion.types.is_empty()
        || assertion.types.iter().any(|t| {
            matches!(
                t,
                ValueType::String | ValueType::Identifier | ValueType::Unknown
            )
        });
    if string_like {
        Value::String(String::new())
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bpt_model::CorrelationId;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn builds_input_mutation() {
        let inputs: Inputs = [("drink".to_string(), json!("gimlet"))].into_iter().collect();
        let request = MutationBuilder::new("OrderCocktail").with_inputs(&inputs).build();
        assert_eq!(request.operation, "OrderCocktail");
        assert_eq!(
            request.query,
            "mutation OrderCocktail($input: OrderCocktailInput!) { OrderCocktail(input: $input) }"
        );
        assert_eq!(request.variables["input"], json!({"drink": "gimlet"}));
    }

    #[test]
    fn correlation_is_injected_once() {
        let tid = CorrelationId::new().to_value();
        let request = MutationBuilder::new("OrderCocktail")
            .with_correlation(&tid)
            .build();
        assert_eq!(request.variables["input"]["tid"], tid);

        let explicit: Inputs = [("tid".to_string(), json!("fixed"))].into_iter().collect();
        let request = MutationBuilder::new("OrderCocktail")
            .with_inputs(&explicit)
            .with_correlation(&tid)
            .build();
        assert_eq!(request.variables["input"]["tid"], "fixed");
    }

    #[test]
    fn empty_variant_uses_placeholders() {
        let inputs: BTreeMap<String, InputAssertion> = [
            (
                "drink".to_string(),
                InputAssertion {
                    types: BTreeSet::from([ValueType::String]),
                    required: true,
                },
            ),
            (
                "quantity".to_string(),
                InputAssertion {
                    types: BTreeSet::from([ValueType::Number]),
                    required: false,
                },
            ),
        ]
        .into_iter()
        .collect();

        let builder = MutationBuilder::empty("OrderCocktail", &inputs);
        assert_eq!(
            Value::Object(builder.input().clone()),
            json!({"drink": "", "quantity": null})
        );
    }
}
