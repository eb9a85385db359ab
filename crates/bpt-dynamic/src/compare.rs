//! Field-by-field comparison of expected and persisted values
//!
//! Persisted fields holding JSON text are decoded before comparing. A
//! type-keyword sentinel only asks for a present, truthy value (`"boolean"`
//! accepts `false` too). Objects match by structural containment anywhere in
//! the actual value; arrays match when every expected element is found.

use bpt_model::{is_truthy, loose_json, numeric_eq, ValueMap, ValueType};
use serde_json::Value;
use std::fmt;

/// One field that did not match
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFailure {
    Missing {
        field: String,
    },
    Mismatch {
        field: String,
        expected: String,
        actual: Value,
    },
    NotArray {
        field: String,
        actual: Value,
    },
    MissingElement {
        field: String,
        element: Value,
    },
    Forbidden {
        field: String,
        value: Value,
    },
    ForbiddenPresent {
        field: String,
    },
}

impl FieldFailure {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field }
            | Self::Mismatch { field, .. }
            | Self::NotArray { field, .. }
            | Self::MissingElement { field, .. }
            | Self::Forbidden { field, .. }
            | Self::ForbiddenPresent { field } => field,
        }
    }
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "field '{field}' is missing"),
            Self::Mismatch {
                field,
                expected,
                actual,
            } => write!(f, "field '{field}' is {actual} but {expected} is expected"),
            Self::NotArray { field, actual } => {
                write!(f, "field '{field}' is not an array: {actual}")
            }
            Self::MissingElement { field, element } => {
                write!(f, "field '{field}' has no element matching {element}")
            }
            Self::Forbidden { field, value } => write!(f, "field '{field}' must not be {value}"),
            Self::ForbiddenPresent { field } => write!(f, "field '{field}' must be absent"),
        }
    }
}

/// Every field of `expected` that `actual` fails to satisfy
#[must_use]
pub fn check_values(expected: &ValueMap, actual: &ValueMap) -> Vec<FieldFailure> {
    expected
        .iter()
        .filter_map(|(field, expected)| check_field(field, expected, actual.get(field)))
        .collect()
}

/// Every field of `forbidden` that `actual` does satisfy
#[must_use]
pub fn check_not_values(forbidden: &ValueMap, actual: &ValueMap) -> Vec<FieldFailure> {
    forbidden
        .iter()
        .filter_map(|(field, value)| {
            actual.get(field)?;
            if ValueType::sentinel(value).is_some() {
                return Some(FieldFailure::ForbiddenPresent {
                    field: field.clone(),
                });
            }
            check_field(field, value, actual.get(field))
                .is_none()
                .then(|| FieldFailure::Forbidden {
                    field: field.clone(),
                    value: value.clone(),
                })
        })
        .collect()
}

fn check_field(field: &str, expected: &Value, actual: Option<&Value>) -> Option<FieldFailure> {
    let Some(actual) = actual else {
        return Some(FieldFailure::Missing {
            field: field.to_string(),
        });
    };
    let actual = loose_json::decode_embedded(actual);
    let expected = loose_json::decode_embedded(expected);
    let mismatch = |expected: String, actual: &Value| FieldFailure::Mismatch {
        field: field.to_string(),
        expected,
        actual: actual.clone(),
    };

    if let Some(keyword) = ValueType::sentinel(&expected) {
        return (!satisfies_sentinel(keyword, &actual))
            .then(|| mismatch(format!("any {keyword}"), &actual));
    }

    match &expected {
        Value::Array(elements) => {
            let Value::Array(items) = &actual else {
                return Some(FieldFailure::NotArray {
                    field: field.to_string(),
                    actual,
                });
            };
            elements
                .iter()
                .find(|element| !items.iter().any(|item| subset(element, item)))
                .map(|element| FieldFailure::MissingElement {
                    field: field.to_string(),
                    element: element.clone(),
                })
        }
        Value::Object(_) => {
            (!contains_anywhere(&expected, &actual)).then(|| mismatch(expected.to_string(), &actual))
        }
        _ => (!numeric_eq(&expected, &actual)).then(|| mismatch(expected.to_string(), &actual)),
    }
}

fn satisfies_sentinel(keyword: ValueType, actual: &Value) -> bool {
    match keyword {
        ValueType::Boolean => actual.is_boolean(),
        _ => is_truthy(actual),
    }
}

/// `actual` holds every key/value of `expected`, recursively
fn subset(expected: &Value, actual: &Value) -> bool {
    if let Some(keyword) = ValueType::sentinel(expected) {
        return satisfies_sentinel(keyword, actual);
    }
    match (expected, actual) {
        (Value::Object(want), Value::Object(have)) => want
            .iter()
            .all(|(key, value)| have.get(key).is_some_and(|h| subset(value, h))),
        (Value::Object(_), _) => false,
        (Value::Array(want), Value::Array(have)) => want
            .iter()
            .all(|value| have.iter().any(|h| subset(value, h))),
        (Value::Array(_), _) => false,
        _ => numeric_eq(expected, actual),
    }
}

fn contains_anywhere(expected: &Value, actual: &Value) -> bool {
    subset(expected, actual)
        || match actual {
            Value::Object(map) => map.values().any(|v| contains_anywhere(expected, v)),
            Value::Array(items) => items.iter().any(|v| contains_anywhere(expected, v)),
            _ => false,
        }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> ValueMap {
        value.as_object().unwrap().clone()
    }

    fn messages(failures: &[FieldFailure]) -> Vec<String> {
        failures.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn sentinel_needs_present_truthy_value() {
        let expected = map(json!({"drink": "string"}));
        assert!(check_values(&expected, &map(json!({"drink": "anything"}))).is_empty());
        assert_eq!(
            messages(&check_values(&expected, &map(json!({})))),
            vec!["field 'drink' is missing"]
        );
        assert_eq!(
            messages(&check_values(&expected, &map(json!({"drink": ""})))),
            vec![r#"field 'drink' is "" but any string is expected"#]
        );
    }

    #[test]
    fn boolean_sentinel_accepts_false() {
        let expected = map(json!({"served": "boolean"}));
        assert!(check_values(&expected, &map(json!({"served": false}))).is_empty());
        assert_eq!(check_values(&expected, &map(json!({"served": "no"}))).len(), 1);
    }

    #[test]
    fn literal_needs_exact_match() {
        let expected = map(json!({"drink": "gimlet", "price": 9}));
        assert!(check_values(&expected, &map(json!({"drink": "gimlet", "price": 9.0}))).is_empty());
        assert_eq!(
            messages(&check_values(&expected, &map(json!({"drink": "Gimlet", "price": 9})))),
            vec![r#"field 'drink' is "Gimlet" but "gimlet" is expected"#]
        );
    }

    #[test]
    fn objects_match_by_containment() {
        let actual = map(json!({"order": {"glass": {"kind": "coupe", "size": 2}, "table": 4}}));
        assert!(check_values(&map(json!({"order": {"kind": "coupe"}})), &actual).is_empty());
        assert!(check_values(&map(json!({"order": {"table": 4}})), &actual).is_empty());
        assert_eq!(
            check_values(&map(json!({"order": {"kind": "flute"}})), &actual).len(),
            1
        );
    }

    #[test]
    fn json_text_is_decoded() {
        let actual = map(json!({"glass": "{\"kind\": \"coupe\"}"}));
        assert!(check_values(&map(json!({"glass": {"kind": "coupe"}})), &actual).is_empty());
    }

    #[test]
    fn arrays_need_every_element() {
        let actual = map(json!({
            "garnish": ["lime", "mint"],
            "rounds": [{"drink": "Gimlet", "count": 2}, {"drink": "Negroni", "count": 1}],
            "drink": "Gimlet"
        }));
        assert!(check_values(&map(json!({"garnish": ["mint"]})), &actual).is_empty());
        assert!(check_values(&map(json!({"rounds": [{"drink": "Negroni"}]})), &actual).is_empty());
        assert_eq!(
            messages(&check_values(&map(json!({"garnish": ["olive"]})), &actual)),
            vec![r#"field 'garnish' has no element matching "olive""#]
        );
        assert_eq!(
            messages(&check_values(&map(json!({"drink": ["Gimlet"]})), &actual)),
            vec![r#"field 'drink' is not an array: "Gimlet""#]
        );
    }

    #[test]
    fn not_values_invert_literals() {
        let actual = map(json!({"drink": "water"}));
        assert!(check_not_values(&map(json!({"drink": "gimlet"})), &actual).is_empty());
        assert_eq!(
            messages(&check_not_values(&map(json!({"drink": "water"})), &actual)),
            vec![r#"field 'drink' must not be "water""#]
        );
    }

    #[test]
    fn not_values_sentinel_requires_absence() {
        let actual = map(json!({"drink": "water"}));
        assert!(check_not_values(&map(json!({"servedAt": "string"})), &actual).is_empty());
        assert_eq!(
            messages(&check_not_values(&map(json!({"drink": "string"})), &actual)),
            vec!["field 'drink' must be absent"]
        );
    }
}
