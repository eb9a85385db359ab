use bpt_model::Process;
use serde_json::{json, Value};

pub fn process_from_json(value: Value) -> Process {
    serde_json::from_value(value).unwrap()
}

/// Single-scenario cocktail order, open to everyone
pub fn cocktail_process() -> Process {
    process_from_json(json!({
        "name": "Order a cocktail",
        "trigger": { "type": "ActorCommand", "commandName": "OrderCocktail", "authorized": "all" },
        "scenarios": [{
            "name": "gimlet",
            "inputs": { "drink": "gimlet" },
            "expectedStateUpdates": [{ "entityName": "Drink", "values": { "drink": "Gimlet" } }]
        }]
    }))
}

/// Cocktail order with an empty drink that must be refused
pub fn rejected_cocktail_process() -> Process {
    process_from_json(json!({
        "name": "Order nothing",
        "trigger": { "type": "ActorCommand", "commandName": "OrderCocktail", "authorized": "all" },
        "scenarios": [{
            "name": "empty drink",
            "inputs": { "drink": "" },
            "shouldBeRejected": true
        }]
    }))
}

/// Two-scenario process with roles, a preceding action, anti-state and a
/// read model, matching the sources written by [`crate::write_bar_app`].
pub fn bar_process() -> Process {
    process_from_json(json!({
        "name": "Order at the bar",
        "trigger": { "type": "ActorCommand", "commandName": "OrderCocktail", "authorized": ["Guest"] },
        "scenarios": [
            {
                "name": "gimlet",
                "inputs": { "drink": "gimlet" },
                "precedingActions": [{
                    "commandName": "OpenBar",
                    "inputs": { "bar": "Rusty Nail" },
                    "authorized": ["Bartender"]
                }],
                "expectedStateUpdates": [{
                    "entityName": "Drink",
                    "values": { "drink": "Gimlet", "orderedAt": "string" },
                    "notValues": { "served": true }
                }],
                "expectedVisibleUpdates": [{
                    "readModelName": "DrinkReadModel",
                    "values": { "drink": "Gimlet" },
                    "authorized": ["Guest"]
                }]
            },
            {
                "name": "empty drink",
                "inputs": { "drink": "" },
                "shouldBeRejected": true
            }
        ]
    }))
}

/// Scenarios `{a, b}` and `{a, c}`: only `a` is required
pub fn unique_input_process() -> Process {
    process_from_json(json!({
        "name": "Inputs",
        "trigger": { "type": "ActorCommand", "commandName": "Mix", "authorized": "all" },
        "scenarios": [
            {
                "name": "one",
                "inputs": { "a": "x", "b": 1 },
                "expectedStateUpdates": [{ "entityName": "Mix", "values": { "a": "x" } }]
            },
            {
                "name": "two",
                "inputs": { "a": "y", "c": true },
                "expectedStateUpdates": [{ "entityName": "Mix", "values": { "a": "y" } }]
            }
        ]
    }))
}
