use crate::schema::Schema;
use crate::shared::SchemaName;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_NEW_NAME_PREFIX: &str = "new-";
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const NEW_NAME_SUFFIX_WIDTH: usize = 6;

/// In-memory record being created or edited. Sessions borrow it for their
/// lifetime and hand it back on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doctype: SchemaName,
    pub name: String,
    #[serde(default)]
    pub is_local: bool,
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl Document {
    pub fn existing(doctype: SchemaName, name: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            doctype,
            name: name.into(),
            is_local: false,
            values,
        }
    }

    /// Unsaved record seeded with the schema defaults.
    pub fn new_local(schema: &Schema, name: impl Into<String>) -> Self {
        Self {
            doctype: schema.name.clone(),
            name: name.into(),
            is_local: true,
            values: schema.defaults(),
        }
    }

    pub fn get(&self, fieldname: &str) -> Option<&Value> {
        self.values.get(fieldname)
    }

    pub fn set(&mut self, fieldname: &str, value: Value) -> Option<Value> {
        self.values.insert(fieldname.to_string(), value)
    }

    /// Route of the record's full edit form.
    pub fn form_route(&self) -> String {
        format!(
            "app/{}/{}",
            self.doctype.slug(),
            urlencoding::encode(&self.name)
        )
    }
}

/// Values shared by every slide of one session: either a live document or a
/// plain map that only exists for the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueBag {
    Document(Document),
    Transient(Map<String, Value>),
}

impl ValueBag {
    pub fn transient() -> Self {
        ValueBag::Transient(Map::new())
    }

    pub fn is_doc(&self) -> bool {
        matches!(self, ValueBag::Document(_))
    }

    pub fn values(&self) -> &Map<String, Value> {
        match self {
            ValueBag::Document(doc) => &doc.values,
            ValueBag::Transient(values) => values,
        }
    }

    pub fn values_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            ValueBag::Document(doc) => &mut doc.values,
            ValueBag::Transient(values) => values,
        }
    }

    pub fn get(&self, fieldname: &str) -> Option<&Value> {
        self.values().get(fieldname)
    }

    pub fn set(&mut self, fieldname: &str, value: Value) {
        self.values_mut().insert(fieldname.to_string(), value);
    }

    pub fn merge(&mut self, values: Map<String, Value>) {
        let target = self.values_mut();
        for (key, value) in values {
            target.insert(key, value);
        }
    }

    pub fn document(&self) -> Option<&Document> {
        match self {
            ValueBag::Document(doc) => Some(doc),
            ValueBag::Transient(_) => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self {
            ValueBag::Document(doc) => Some(doc),
            ValueBag::Transient(_) => None,
        }
    }
}

/// Matches the synthetic names handed to records that were never saved.
pub fn is_new_name(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map(|rest| !rest.is_empty())
        .unwrap_or(false)
}

pub fn generate_new_name(schema: &SchemaName, prefix: &str) -> Result<String, String> {
    let mut bytes = [0_u8; 4];
    getrandom::getrandom(&mut bytes)
        .map_err(|err| format!("failed to generate new record name randomness: {err}"))?;
    let sample = u32::from_le_bytes(bytes);
    Ok(format!(
        "{prefix}{}-{}",
        schema.slug(),
        base36_encode_fixed_u32(sample, NEW_NAME_SUFFIX_WIDTH)
    ))
}

fn base36_encode_fixed_u32(mut value: u32, width: usize) -> String {
    let mut chars = vec!['0'; width];
    for idx in (0..width).rev() {
        chars[idx] = BASE36_ALPHABET[(value % 36) as usize] as char;
        value /= 36;
    }
    chars.into_iter().collect()
}

/// Null, blank strings and empty lists count as "not filled in".
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(raw)) => raw.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_names_carry_prefix_and_schema_slug() {
        let schema = SchemaName::parse("Sales Invoice").expect("schema");
        let name = generate_new_name(&schema, DEFAULT_NEW_NAME_PREFIX).expect("name");
        assert!(name.starts_with("new-sales-invoice-"));
        assert_eq!(name.len(), "new-sales-invoice-".len() + NEW_NAME_SUFFIX_WIDTH);
        assert!(is_new_name(&name, DEFAULT_NEW_NAME_PREFIX));
        assert!(!is_new_name("new-", DEFAULT_NEW_NAME_PREFIX));
        assert!(!is_new_name("SINV-0001", DEFAULT_NEW_NAME_PREFIX));
    }

    #[test]
    fn empty_values_follow_form_rules() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&json!(null))));
        assert!(is_empty_value(Some(&json!("   "))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!(false))));
    }

    #[test]
    fn form_route_escapes_name() {
        let doc = Document::existing(
            SchemaName::parse("ToDo").expect("schema"),
            "a b",
            Map::new(),
        );
        assert_eq!(doc.form_route(), "app/todo/a%20b");
    }
}
