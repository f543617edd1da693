use crate::config::ConfigError;
use crate::shared::serde_ext::bool_from_int_or_bool;
use crate::shared::{Fieldname, SchemaName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const NEW_NAME_FIELD: &str = "__newname";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum FieldType {
    Data,
    Int,
    Float,
    Currency,
    Percent,
    Check,
    Select,
    Link,
    Date,
    Datetime,
    Time,
    #[serde(rename = "Small Text")]
    SmallText,
    Text,
    #[serde(rename = "Long Text")]
    LongText,
    #[serde(rename = "Text Editor")]
    TextEditor,
    Table,
    Attach,
    #[serde(rename = "Section Break")]
    SectionBreak,
    #[serde(rename = "Column Break")]
    ColumnBreak,
    #[serde(rename = "Tab Break")]
    TabBreak,
    Fold,
    Heading,
    #[serde(rename = "HTML")]
    Html,
    Button,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Data => "Data",
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::Currency => "Currency",
            FieldType::Percent => "Percent",
            FieldType::Check => "Check",
            FieldType::Select => "Select",
            FieldType::Link => "Link",
            FieldType::Date => "Date",
            FieldType::Datetime => "Datetime",
            FieldType::Time => "Time",
            FieldType::SmallText => "Small Text",
            FieldType::Text => "Text",
            FieldType::LongText => "Long Text",
            FieldType::TextEditor => "Text Editor",
            FieldType::Table => "Table",
            FieldType::Attach => "Attach",
            FieldType::SectionBreak => "Section Break",
            FieldType::ColumnBreak => "Column Break",
            FieldType::TabBreak => "Tab Break",
            FieldType::Fold => "Fold",
            FieldType::Heading => "Heading",
            FieldType::Html => "HTML",
            FieldType::Button => "Button",
        }
    }

    /// Types that only shape layout and never carry a value.
    pub fn is_layout(self) -> bool {
        matches!(
            self,
            FieldType::SectionBreak
                | FieldType::ColumnBreak
                | FieldType::TabBreak
                | FieldType::Fold
                | FieldType::Heading
                | FieldType::Html
                | FieldType::Button
        )
    }

    /// Layout types dropped when a schema is cut into slides.
    pub fn is_dropped_from_slides(self) -> bool {
        matches!(self, FieldType::TabBreak | FieldType::Fold)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FieldType::Int | FieldType::Float | FieldType::Currency | FieldType::Percent
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DocField {
    pub fieldname: Fieldname,
    pub fieldtype: FieldType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "bool_from_int_or_bool")]
    pub reqd: bool,
    #[serde(default)]
    pub depends_on: Option<String>,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "bool_from_int_or_bool")]
    pub hidden: bool,
    #[serde(default, deserialize_with = "bool_from_int_or_bool")]
    pub read_only: bool,
    #[serde(default)]
    pub description: Option<String>,
}

impl DocField {
    pub fn new(fieldname: Fieldname, fieldtype: FieldType) -> Self {
        Self {
            fieldname,
            fieldtype,
            label: None,
            reqd: false,
            depends_on: None,
            options: None,
            default: None,
            hidden: false,
            read_only: false,
            description: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.reqd = true;
        self
    }

    pub fn with_depends_on(mut self, expression: impl Into<String>) -> Self {
        self.depends_on = Some(expression.into());
        self
    }

    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(self.fieldname.as_str())
    }

    /// Newline-separated choices of a Select field, blank entries removed.
    pub fn select_options(&self) -> Vec<&str> {
        self.options
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|option| !option.is_empty())
            .collect()
    }

    /// The name-entry field offered for schemas whose records are named by the user.
    pub fn new_name_field() -> Self {
        Self::new(
            Fieldname::from_trusted(NEW_NAME_FIELD),
            FieldType::Data,
        )
        .with_label("Name")
        .required()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Schema {
    pub name: SchemaName,
    #[serde(default, deserialize_with = "bool_from_int_or_bool")]
    pub issingle: bool,
    #[serde(default)]
    pub autoname: Option<String>,
    #[serde(default)]
    pub fields: Vec<DocField>,
}

impl Schema {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let schema: Schema = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeMap::new();
        for (index, field) in self.fields.iter().enumerate() {
            if let Some(previous) = seen.insert(field.fieldname.as_str(), index) {
                return Err(ConfigError::Schema(format!(
                    "schema `{}` declares fieldname `{}` twice (positions {previous} and {index})",
                    self.name, field.fieldname
                )));
            }
        }
        Ok(())
    }

    pub fn is_single(&self) -> bool {
        self.issingle
    }

    /// True when new records must be named by the user before saving.
    pub fn requires_user_name(&self) -> bool {
        self.autoname
            .as_deref()
            .map(|policy| policy.trim().eq_ignore_ascii_case("prompt"))
            .unwrap_or(false)
    }

    pub fn field(&self, fieldname: &str) -> Option<&DocField> {
        self.fields
            .iter()
            .find(|field| field.fieldname.as_str() == fieldname)
    }

    pub fn field_map(&self) -> BTreeMap<&str, &DocField> {
        self.fields
            .iter()
            .map(|field| (field.fieldname.as_str(), field))
            .collect()
    }

    /// Fields of the Section Break whose fieldname or label equals `name`, up
    /// to the next Section Break. The break itself is not included.
    pub fn section_fields(&self, name: &str) -> Option<(&DocField, Vec<&DocField>)> {
        let start = self.fields.iter().position(|field| {
            field.fieldtype == FieldType::SectionBreak
                && (field.fieldname.as_str() == name || field.label.as_deref() == Some(name))
        })?;
        let section = &self.fields[start];
        let members = self.fields[start + 1..]
            .iter()
            .take_while(|field| field.fieldtype != FieldType::SectionBreak)
            .collect();
        Some((section, members))
    }

    /// Default values declared on value-carrying fields.
    pub fn defaults(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .filter(|field| !field.fieldtype.is_layout())
            .filter_map(|field| {
                field
                    .default
                    .clone()
                    .map(|value| (field.fieldname.to_string(), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        serde_yaml::from_str(
            r#"
name: Customer Onboarding
autoname: Prompt
fields:
  - fieldname: customer_name
    fieldtype: Data
    reqd: 1
  - fieldname: contact_section
    fieldtype: Section Break
    label: Contact
  - fieldname: email
    fieldtype: Data
    default: someone@example.com
  - fieldname: phone
    fieldtype: Data
  - fieldname: billing_section
    fieldtype: Section Break
  - fieldname: plan
    fieldtype: Select
    options: "\nBasic\nPro\n"
"#,
        )
        .expect("parse schema")
    }

    #[test]
    fn reqd_accepts_integer_flags() {
        let schema = sample_schema();
        assert!(schema.field("customer_name").expect("field").reqd);
        assert!(!schema.field("email").expect("field").reqd);
    }

    #[test]
    fn section_lookup_matches_fieldname_or_label() {
        let schema = sample_schema();
        let (section, members) = schema.section_fields("Contact").expect("by label");
        assert_eq!(section.fieldname.as_str(), "contact_section");
        let names: Vec<&str> = members.iter().map(|f| f.fieldname.as_str()).collect();
        assert_eq!(names, vec!["email", "phone"]);

        let (_, members) = schema.section_fields("billing_section").expect("by name");
        assert_eq!(members.len(), 1);
        assert!(schema.section_fields("missing").is_none());
    }

    #[test]
    fn prompt_autoname_requires_user_name() {
        let mut schema = sample_schema();
        assert!(schema.requires_user_name());
        schema.autoname = Some("hash".to_string());
        assert!(!schema.requires_user_name());
    }

    #[test]
    fn select_options_skip_blank_lines() {
        let schema = sample_schema();
        assert_eq!(
            schema.field("plan").expect("field").select_options(),
            vec!["Basic", "Pro"]
        );
    }

    #[test]
    fn duplicate_fieldnames_fail_validation() {
        let mut schema = sample_schema();
        schema.fields.push(schema.fields[0].clone());
        assert!(schema.validate().is_err());
        assert_eq!(schema.defaults().len(), 1);
    }
}
