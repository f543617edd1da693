//! `depends_on` style boolean expressions over document values.
//!
//! Two spellings are accepted, matching schema files:
//! - a bare fieldname, true when the field holds a truthy value;
//! - `eval:<expr>` where `<expr>` is a small JavaScript-like expression over
//!   `doc.<field>` paths, literals, comparisons, `!`, `&&`, `||`, parentheses
//!   and `in_list([..], value)`.

mod parser;

use crate::shared::serde_ext::parse_via_string;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub use parser::{CompareOp, Expr};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character `{ch}` at offset {offset} in `{expression}`")]
    UnexpectedChar {
        expression: String,
        ch: char,
        offset: usize,
    },
    #[error("unterminated string literal in `{expression}`")]
    UnterminatedString { expression: String },
    #[error("unexpected token {found} in `{expression}`")]
    UnexpectedToken { expression: String, found: String },
    #[error("unknown function `{name}` in `{expression}`")]
    UnknownFunction { expression: String, name: String },
}

/// Parsed condition. Keeps the original text so custom evaluators and
/// serialization see exactly what the author wrote.
#[derive(Debug, Clone)]
pub struct Condition {
    raw: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(raw: &str) -> Result<Self, ExpressionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExpressionError::Empty);
        }
        let expr = match trimmed.strip_prefix("eval:") {
            Some(body) => parser::parse(body)?,
            None => Expr::FieldTruthy(trimmed.to_string()),
        };
        Ok(Self {
            raw: trimmed.to_string(),
            expr,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Condition {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        parse_via_string(deserializer, "condition", |raw| {
            Condition::parse(raw).map_err(|err| err.to_string())
        })
    }
}

/// Decides whether a condition holds for the current values.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, condition: &Condition, values: &Map<String, Value>) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DependsOnEvaluator;

impl ExpressionEvaluator for DependsOnEvaluator {
    fn evaluate(&self, condition: &Condition, values: &Map<String, Value>) -> bool {
        truthy(&eval_expr(condition.expr(), values))
    }
}

fn eval_expr(expr: &Expr, values: &Map<String, Value>) -> Value {
    match expr {
        Expr::FieldTruthy(fieldname) => Value::Bool(field_truthy(values.get(fieldname))),
        Expr::Literal(value) => value.clone(),
        Expr::Field(fieldname) => values.get(fieldname).cloned().unwrap_or(Value::Null),
        Expr::List(items) => Value::Array(items.iter().map(|item| eval_expr(item, values)).collect()),
        Expr::Not(inner) => Value::Bool(!truthy(&eval_expr(inner, values))),
        Expr::And(left, right) => {
            let left = eval_expr(left, values);
            if truthy(&left) {
                eval_expr(right, values)
            } else {
                left
            }
        }
        Expr::Or(left, right) => {
            let left = eval_expr(left, values);
            if truthy(&left) {
                left
            } else {
                eval_expr(right, values)
            }
        }
        Expr::Compare(op, left, right) => {
            let left = eval_expr(left, values);
            let right = eval_expr(right, values);
            Value::Bool(compare(*op, &left, &right))
        }
        Expr::InList(list, needle) => {
            let list = eval_expr(list, values);
            let needle = eval_expr(needle, values);
            let found = match &list {
                Value::Array(items) => items.iter().any(|item| loose_eq(item, &needle)),
                _ => false,
            };
            Value::Bool(found)
        }
    }
}

fn field_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(other) => truthy(other),
        None => false,
    }
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0 && !n.is_nan()).unwrap_or(false),
        Value::String(raw) => !raw.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(raw) if !raw.trim().is_empty() => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Number(_), _) | (_, Value::Number(_)) | (Value::Bool(_), _) | (_, Value::Bool(_)) => {
            match (as_number(left), as_number(right)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => left == right,
    }
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => loose_eq(left, right),
        CompareOp::Ne => !loose_eq(left, right),
        CompareOp::StrictEq => left == right,
        CompareOp::StrictNe => left != right,
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => match (as_number(left), as_number(right)) {
                    (Some(a), Some(b)) => a.partial_cmp(&b),
                    _ => None,
                },
            };
            let Some(ordering) = ordering else {
                return false;
            };
            match op {
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Le => ordering.is_le(),
                CompareOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(raw: Value) -> Map<String, Value> {
        raw.as_object().cloned().expect("object")
    }

    fn holds(expression: &str, doc: Value) -> bool {
        let condition = Condition::parse(expression).expect("parse");
        DependsOnEvaluator.evaluate(&condition, &values(doc))
    }

    #[test]
    fn bare_fieldname_checks_truthiness() {
        assert!(holds("x", json!({"x": "foo"})));
        assert!(!holds("x", json!({"x": ""})));
        assert!(!holds("x", json!({"x": 0})));
        assert!(!holds("items", json!({"items": []})));
        assert!(holds("items", json!({"items": [{"a": 1}]})));
        assert!(!holds("missing", json!({})));
    }

    #[test]
    fn eval_comparisons_use_loose_equality() {
        assert!(holds("eval:doc.x=='foo'", json!({"x": "foo"})));
        assert!(!holds("eval:doc.x == 'foo'", json!({"x": "bar"})));
        assert!(holds("eval:doc.qty == '3'", json!({"qty": 3})));
        assert!(!holds("eval:doc.qty === '3'", json!({"qty": 3})));
        assert!(holds("eval:doc.qty >= 2 && doc.qty < 10", json!({"qty": 3})));
        assert!(holds("eval:!doc.closed", json!({"closed": 0})));
        assert!(holds("eval:doc.a || doc.b", json!({"a": "", "b": 1})));
        assert!(holds("eval:(doc.a == 1) && !(doc.b == 2)", json!({"a": 1, "b": 3})));
    }

    #[test]
    fn in_list_matches_any_member() {
        assert!(holds(
            "eval:in_list(['Pro', 'Enterprise'], doc.plan)",
            json!({"plan": "Pro"})
        ));
        assert!(!holds(
            "eval:in_list([\"Pro\"], doc.plan)",
            json!({"plan": "Basic"})
        ));
    }

    #[test]
    fn malformed_expressions_fail_to_parse() {
        assert_eq!(Condition::parse("  "), Err(ExpressionError::Empty));
        assert!(Condition::parse("eval:doc.x ==").is_err());
        assert!(Condition::parse("eval:doc.x == 'open").is_err());
        assert!(Condition::parse("eval:frappe.call()").is_err());
    }

    #[test]
    fn conditions_round_trip_through_yaml_as_text() {
        let condition: Condition = serde_yaml::from_str("\"eval:doc.x=='foo'\"").expect("yaml");
        assert_eq!(condition.as_str(), "eval:doc.x=='foo'");
        assert!(serde_yaml::from_str::<Condition>("\"eval:doc.x ==\"").is_err());
    }
}
