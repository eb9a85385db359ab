//! Read-model query and filter builder
//!
//! Read models are listed through `List<ReadModel>s(filter: ...)`, which
//! answers `{ items: [...] }`. Filters are rendered as GraphQL input-object
//! literals with one operator per expected value shape:
//!
//! | expected value      | operator                       |
//! |---------------------|--------------------------------|
//! | type keyword        | `isDefined: true`              |
//! | string              | `contains`                     |
//! | number, boolean, id | `eq`                           |
//! | object              | `eq` per key, nested           |
//! | array               | `and` of `includes` per element|

use crate::error::TransportError;
use crate::transport::GraphQlRequest;
use bpt_model::{loose_json, ValueMap, ValueType};
use serde_json::Value;
use std::fmt::{self, Write as _};

/// Filter operator applied to one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Contains,
    Includes,
    IsDefined,
}

impl FilterOp {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Contains => "contains",
            Self::Includes => "includes",
            Self::IsDefined => "isDefined",
        }
    }
}

/// Boolean filter expression over read-model fields
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `path` walks into nested objects, outermost field first
    Field {
        path: Vec<String>,
        op: FilterOp,
        value: Value,
    },
    And(Vec<FilterExpr>),
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    #[must_use]
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::Field {
            path: vec![field.into()],
            op: FilterOp::Eq,
            value,
        }
    }

    /// Condition satisfied by a field holding `expected`
    #[must_use]
    pub fn for_value(field: &str, expected: &Value) -> Self {
        Self::at_path(vec![field.to_string()], &loose_json::decode_embedded(expected))
    }

    /// One condition per expected field, in key order
    #[must_use]
    pub fn for_values(values: &ValueMap) -> Vec<Self> {
        values
            .iter()
            .map(|(field, expected)| Self::for_value(field, expected))
            .collect()
    }

    fn at_path(path: Vec<String>, expected: &Value) -> Self {
        if ValueType::sentinel(expected).is_some() {
            return Self::Field {
                path,
                op: FilterOp::IsDefined,
                value: Value::Bool(true),
            };
        }
        match expected {
            Value::String(_) if ValueType::infer(expected) == ValueType::String => Self::Field {
                path,
                op: FilterOp::Contains,
                value: expected.clone(),
            },
            Value::Object(map) => Self::And(
                map.iter()
                    .map(|(key, value)| {
                        let mut nested = path.clone();
                        nested.push(key.clone());
                        Self::at_path(nested, value)
                    })
                    .collect(),
            ),
            Value::Array(items) => Self::And(
                items
                    .iter()
                    .map(|item| Self::Field {
                        path: path.clone(),
                        op: FilterOp::Includes,
                        value: item.clone(),
                    })
                    .collect(),
            ),
            _ => Self::Field {
                path,
                op: FilterOp::Eq,
                value: expected.clone(),
            },
        }
    }

    /// Render as a GraphQL input-object literal
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out);
        out
    }

    fn render_into(&self, out: &mut String) {
        match self {
            Self::Field { path, op, value } => {
                for segment in path {
                    let _ = write!(out, "{{ {segment}: ");
                }
                let _ = write!(out, "{{ {}: {} }}", op.as_str(), GraphQlLiteral(value));
                for _ in path {
                    out.push_str(" }");
                }
            }
            Self::And(items) => render_list(out, "and", items),
            Self::Or(items) => render_list(out, "or", items),
        }
    }
}

fn render_list(out: &mut String, keyword: &str, items: &[FilterExpr]) {
    let _ = write!(out, "{{ {keyword}: [");
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.render_into(out);
    }
    out.push_str("] }");
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// GraphQL literal syntax for a JSON value: object keys are bare names
struct GraphQlLiteral<'a>(&'a Value);

impl fmt::Display for GraphQlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Object(map) => {
                f.write_str("{ ")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {}", GraphQlLiteral(value))?;
                }
                f.write_str(" }")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", GraphQlLiteral(item))?;
                }
                f.write_str("]")
            }
            scalar => write!(f, "{scalar}"),
        }
    }
}

/// Existence filter: item `id_key == item_id` holding every expected value
#[must_use]
pub fn values_filter(id_key: &str, item_id: &str, values: &ValueMap) -> FilterExpr {
    let mut all = vec![FilterExpr::eq(id_key, Value::String(item_id.to_string()))];
    all.extend(FilterExpr::for_values(values));
    FilterExpr::And(all)
}

/// Absence filter: item `id_key == item_id` holding any forbidden value
#[must_use]
pub fn not_values_filter(id_key: &str, item_id: &str, not_values: &ValueMap) -> FilterExpr {
    FilterExpr::And(vec![
        FilterExpr::eq(id_key, Value::String(item_id.to_string())),
        FilterExpr::Or(FilterExpr::for_values(not_values)),
    ])
}

/// Query listing the items of one read model
#[derive(Debug, Clone, PartialEq)]
pub struct ReadModelQuery {
    read_model: String,
    filter: Option<FilterExpr>,
    selection: Vec<String>,
}

impl ReadModelQuery {
    #[must_use]
    pub fn new(read_model: impl Into<String>) -> Self {
        Self {
            read_model: read_model.into(),
            filter: None,
            selection: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn select(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.selection.contains(&field) {
            self.selection.push(field);
        }
        self
    }

    /// Name of the list operation, e.g. `ListDrinkReadModels`
    #[must_use]
    pub fn operation(&self) -> String {
        format!("List{}s", self.read_model)
    }

    #[must_use]
    pub fn build(&self) -> GraphQlRequest {
        let operation = self.operation();
        let arguments = self
            .filter
            .as_ref()
            .map(|filter| format!("(filter: {})", filter.render()))
            .unwrap_or_default();
        let selection = if self.selection.is_empty() {
            "id".to_string()
        } else {
            self.selection.join(" ")
        };
        let query = format!("query {{ {operation}{arguments} {{ items {{ {selection} }} }} }}");
        GraphQlRequest::new(operation, query)
    }

    /// Extract the listed items from a response payload
    ///
    /// # Errors
    /// `TransportError::Decode` if the payload lacks `items`
    pub fn items(&self, data: &Value) -> Result<Vec<Value>, TransportError> {
        let operation = self.operation();
        data.get(&operation)
            .and_then(|list| list.get("items"))
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| TransportError::Decode(format!("{operation} returned no items")))
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

    #[test]
    fn operator_per_value_shape() {
        assert_eq!(
            FilterExpr::for_value("drink", &json!("Gimlet")).render(),
            r#"{ drink: { contains: "Gimlet" } }"#
        );
        assert_eq!(
            FilterExpr::for_value("served", &json!(true)).render(),
            "{ served: { eq: true } }"
        );
        assert_eq!(
            FilterExpr::for_value("id", &json!("5f0c7a1e-8a5b-4c1e-9d1a-0a4b3c2d1e0f")).render(),
            r#"{ id: { eq: "5f0c7a1e-8a5b-4c1e-9d1a-0a4b3c2d1e0f" } }"#
        );
        assert_eq!(
            FilterExpr::for_value("orderedAt", &json!("string")).render(),
            "{ orderedAt: { isDefined: true } }"
        );
    }

    #[test]
    fn objects_compare_per_key() {
        assert_eq!(
            FilterExpr::for_value("glass", &json!({"size": 2, "kind": "coupe"})).render(),
            r#"{ and: [{ glass: { kind: { contains: "coupe" } } }, { glass: { size: { eq: 2 } } }] }"#
        );
    }

    #[test]
    fn arrays_include_every_element() {
        assert_eq!(
            FilterExpr::for_value("garnish", &json!(["lime", "mint"])).render(),
            r#"{ and: [{ garnish: { includes: "lime" } }, { garnish: { includes: "mint" } }] }"#
        );
    }

    #[test]
    fn absence_filter_ors_forbidden_values() {
        let filter = not_values_filter("id", "t-1", &map(json!({"drink": "water", "served": false})));
        assert_eq!(
            filter.render(),
            r#"{ and: [{ id: { eq: "t-1" } }, { or: [{ drink: { contains: "water" } }, { served: { eq: false } }] }] }"#
        );
    }

    #[test]
    fn list_query_shape() {
        let query = ReadModelQuery::new("DrinkReadModel")
            .with_filter(values_filter("id", "t-1", &map(json!({"drink": "Gimlet"}))))
            .select("id");
        let request = query.build();
        assert_eq!(request.operation, "ListDrinkReadModels");
        assert_eq!(
            request.query,
            r#"query { ListDrinkReadModels(filter: { and: [{ id: { eq: "t-1" } }, { drink: { contains: "Gimlet" } }] }) { items { id } } }"#
        );
    }

    #[test]
    fn items_are_extracted() {
        let query = ReadModelQuery::new("DrinkReadModel");
        let data = json!({"ListDrinkReadModels": {"items": [{"id": "t-1"}]}});
        assert_eq!(query.items(&data).unwrap(), vec![json!({"id": "t-1"})]);
        assert!(matches!(
            query.items(&json!({})),
            Err(TransportError::Decode(_))
        ));
    }
}
