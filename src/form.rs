//! Field-rendering collaborator.
//!
//! `Slide` only talks to a `SubForm`; `FieldGroup` is the headless
//! implementation used unless the host installs its own factory.

use crate::document::is_empty_value;
use crate::expression::{Condition, ExpressionEvaluator};
use crate::schema::{DocField, FieldType};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("field `{fieldname}` is not part of this form")]
    UnknownField { fieldname: String },
    #[error("field `{fieldname}` is read only")]
    ReadOnly { fieldname: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub fieldname: String,
    pub reason: String,
}

/// Contract of the sub-form a slide renders its fields into.
pub trait SubForm: Send {
    fn make(&mut self);
    fn is_made(&self) -> bool;
    fn fields(&self) -> &[DocField];
    fn get_value(&self, fieldname: &str) -> Option<&Value>;
    fn set_value(&mut self, fieldname: &str, value: Value) -> Result<(), FormError>;
    /// `None` when the form holds invalid values and `ignore_errors` is false.
    fn get_values(&self, ignore_errors: bool) -> Option<Map<String, Value>>;
    /// Loads the entries of `values` that belong to this form.
    fn set_values(&mut self, values: &Map<String, Value>);
    /// Re-evaluates field visibility against the given document values.
    fn refresh(&mut self, values: &Map<String, Value>);
    fn focus_on_first_input(&mut self) -> Option<String>;
    fn invalid_fields(&self) -> Vec<FieldIssue>;
    fn missing_required(&self) -> Vec<String>;

    /// Hidden by its own flag or a failing `depends_on`.
    fn is_field_hidden(&self, _fieldname: &str) -> bool {
        false
    }

    fn owns_field(&self, fieldname: &str) -> bool {
        self.fields()
            .iter()
            .any(|field| field.fieldname.as_str() == fieldname && !field.fieldtype.is_layout())
    }
}

pub type FormFactory = Arc<dyn Fn(Vec<DocField>) -> Box<dyn SubForm> + Send + Sync>;

pub fn field_group_factory(evaluator: Arc<dyn ExpressionEvaluator>) -> FormFactory {
    Arc::new(move |fields: Vec<DocField>| {
        Box::new(FieldGroup::new(fields, evaluator.clone())) as Box<dyn SubForm>
    })
}

pub struct FieldGroup {
    fields: Vec<DocField>,
    conditions: Vec<Option<Condition>>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    values: Map<String, Value>,
    hidden: BTreeSet<String>,
    focused: Option<String>,
    made: bool,
}

impl FieldGroup {
    pub fn new(fields: Vec<DocField>, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        // A depends_on that does not parse keeps the field visible.
        let conditions = fields
            .iter()
            .map(|field| {
                field
                    .depends_on
                    .as_deref()
                    .and_then(|raw| Condition::parse(raw).ok())
            })
            .collect();
        Self {
            fields,
            conditions,
            evaluator,
            values: Map::new(),
            hidden: BTreeSet::new(),
            focused: None,
            made: false,
        }
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn is_hidden(&self, fieldname: &str) -> bool {
        self.hidden.contains(fieldname)
    }

    fn value_fields(&self) -> impl Iterator<Item = &DocField> {
        self.fields.iter().filter(|field| !field.fieldtype.is_layout())
    }

    fn field(&self, fieldname: &str) -> Option<&DocField> {
        self.value_fields()
            .find(|field| field.fieldname.as_str() == fieldname)
    }
}

impl SubForm for FieldGroup {
    fn make(&mut self) {
        if self.made {
            return;
        }
        for field in self.fields.iter().filter(|field| !field.fieldtype.is_layout()) {
            if let Some(default) = field.default.as_ref() {
                self.values
                    .entry(field.fieldname.to_string())
                    .or_insert_with(|| default.clone());
            }
        }
        self.made = true;
    }

    fn is_made(&self) -> bool {
        self.made
    }

    fn fields(&self) -> &[DocField] {
        &self.fields
    }

    fn get_value(&self, fieldname: &str) -> Option<&Value> {
        self.values.get(fieldname)
    }

    fn set_value(&mut self, fieldname: &str, value: Value) -> Result<(), FormError> {
        let field = self.field(fieldname).ok_or_else(|| FormError::UnknownField {
            fieldname: fieldname.to_string(),
        })?;
        if field.read_only {
            return Err(FormError::ReadOnly {
                fieldname: fieldname.to_string(),
            });
        }
        self.values.insert(fieldname.to_string(), value);
        Ok(())
    }

    fn get_values(&self, ignore_errors: bool) -> Option<Map<String, Value>> {
        if !ignore_errors && (!self.invalid_fields().is_empty() || !self.missing_required().is_empty())
        {
            return None;
        }
        Some(
            self.value_fields()
                .filter_map(|field| {
                    self.values
                        .get(field.fieldname.as_str())
                        .map(|value| (field.fieldname.to_string(), value.clone()))
                })
                .collect(),
        )
    }

    fn set_values(&mut self, values: &Map<String, Value>) {
        let owned: Vec<String> = self
            .value_fields()
            .map(|field| field.fieldname.to_string())
            .collect();
        for fieldname in owned {
            if let Some(value) = values.get(&fieldname) {
                self.values.insert(fieldname, value.clone());
            }
        }
    }

    fn refresh(&mut self, values: &Map<String, Value>) {
        let mut context = values.clone();
        for (key, value) in &self.values {
            context.insert(key.clone(), value.clone());
        }
        self.hidden = self
            .fields
            .iter()
            .zip(&self.conditions)
            .filter(|(field, condition)| {
                field.hidden
                    || condition
                        .as_ref()
                        .map(|condition| !self.evaluator.evaluate(condition, &context))
                        .unwrap_or(false)
            })
            .map(|(field, _)| field.fieldname.to_string())
            .collect();
    }

    fn is_field_hidden(&self, fieldname: &str) -> bool {
        self.is_hidden(fieldname)
    }

    fn focus_on_first_input(&mut self) -> Option<String> {
        let focused = self
            .value_fields()
            .find(|field| !field.read_only && !self.hidden.contains(field.fieldname.as_str()))
            .map(|field| field.fieldname.to_string());
        self.focused = focused.clone();
        focused
    }

    fn invalid_fields(&self) -> Vec<FieldIssue> {
        self.value_fields()
            .filter_map(|field| {
                let value = self.values.get(field.fieldname.as_str())?;
                if is_empty_value(Some(value)) {
                    return None;
                }
                field_value_issue(field, value).map(|reason| FieldIssue {
                    fieldname: field.fieldname.to_string(),
                    reason,
                })
            })
            .collect()
    }

    fn missing_required(&self) -> Vec<String> {
        self.value_fields()
            .filter(|field| field.reqd && !self.hidden.contains(field.fieldname.as_str()))
            .filter(|field| is_empty_value(self.values.get(field.fieldname.as_str())))
            .map(|field| field.fieldname.to_string())
            .collect()
    }
}

fn field_value_issue(field: &DocField, value: &Value) -> Option<String> {
    match field.fieldtype {
        FieldType::Int => match value {
            Value::Number(number) if number.is_i64() || number.is_u64() => None,
            Value::String(raw) if raw.trim().parse::<i64>().is_ok() => None,
            _ => Some("must be a whole number".to_string()),
        },
        FieldType::Float | FieldType::Currency | FieldType::Percent => match value {
            Value::Number(_) => None,
            Value::String(raw) if raw.trim().parse::<f64>().is_ok() => None,
            _ => Some("must be a number".to_string()),
        },
        FieldType::Check => match value {
            Value::Bool(_) => None,
            Value::Number(number) if matches!(number.as_i64(), Some(0) | Some(1)) => None,
            _ => Some("must be checked or unchecked".to_string()),
        },
        FieldType::Select => {
            let options = field.select_options();
            match value {
                Value::String(raw) if options.is_empty() || options.contains(&raw.as_str()) => None,
                _ => Some(format!("must be one of: {}", options.join(", "))),
            }
        }
        _ => None,
    }
}
