use super::ConfigError;
use crate::generation::{GenerationError, GroupToSlide};
use crate::schema::DocField;
use crate::shared::{atomic_write_file, DefinitionKey, SchemaName};
use crate::slides::SlideDescriptor;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub const REST_GROUP_TOKEN: &str = "*";
pub const SECTION_GROUP_PREFIX: &str = "section:";

fn default_true() -> bool {
    true
}

/// Configuration of one wizard: its navigation policy, the schema it edits
/// and, optionally, an explicit list of slide groups.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlideViewDefinition {
    pub title: String,
    #[serde(default)]
    pub route: Option<DefinitionKey>,
    #[serde(default)]
    pub reference_doctype: Option<SchemaName>,
    #[serde(default = "default_true")]
    pub allow_back: bool,
    #[serde(default)]
    pub allow_any: bool,
    #[serde(default)]
    pub done_state: bool,
    #[serde(default = "default_true")]
    pub can_edit_doc: bool,
    #[serde(default = "default_true")]
    pub can_create_doc: bool,
    #[serde(default)]
    pub add_fullpage_edit_btn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slides: Option<Vec<SlideGroupSpec>>,
}

impl SlideViewDefinition {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            route: None,
            reference_doctype: None,
            allow_back: true,
            allow_any: false,
            done_state: false,
            can_edit_doc: true,
            can_create_doc: true,
            add_fullpage_edit_btn: false,
            slides: None,
        }
    }

    pub fn from_yaml_str(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let definition: SlideViewDefinition =
            serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
                path: origin.to_string(),
                source,
            })?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw, &path.display().to_string())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let body = serde_yaml::to_string(self).map_err(|source| ConfigError::Encode {
            path: path.display().to_string(),
            source,
        })?;
        atomic_write_file(path, body.as_bytes()).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Definition(
                "`title` must be non-empty".to_string(),
            ));
        }
        if self.add_fullpage_edit_btn && self.reference_doctype.is_none() {
            return Err(ConfigError::Definition(
                "`add_fullpage_edit_btn` requires `reference_doctype`".to_string(),
            ));
        }
        if let Some(slides) = self.slides.as_ref() {
            if slides.is_empty() {
                return Err(ConfigError::Definition(
                    "`slides` must be omitted or non-empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn with_reference_doctype(mut self, schema: SchemaName) -> Self {
        self.reference_doctype = Some(schema);
        self
    }

    pub fn with_slides(mut self, slides: Vec<SlideGroupSpec>) -> Self {
        self.slides = Some(slides);
        self
    }
}

/// A field given inline or by fieldname of the reference schema.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FieldRef {
    Name(String),
    Field(DocField),
}

impl From<DocField> for FieldRef {
    fn from(value: DocField) -> Self {
        FieldRef::Field(value)
    }
}

impl From<&str> for FieldRef {
    fn from(value: &str) -> Self {
        FieldRef::Name(value.to_string())
    }
}

/// Slide group with metadata overrides.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GroupSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    pub fields: Vec<FieldRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub add_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<usize>,
}

type SlideBuilderFn =
    dyn Fn(usize, &GroupToSlide<'_>, &str) -> Result<SlideDescriptor, GenerationError> + Send + Sync;

/// Programmatic slide entry. Receives the entry index, a helper that turns a
/// field group into a descriptor, and the definition title.
#[derive(Clone)]
pub struct SlideBuilder(Arc<SlideBuilderFn>);

impl SlideBuilder {
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn(usize, &GroupToSlide<'_>, &str) -> Result<SlideDescriptor, GenerationError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(builder))
    }

    pub fn build(
        &self,
        index: usize,
        helper: &GroupToSlide<'_>,
        title: &str,
    ) -> Result<SlideDescriptor, GenerationError> {
        (self.0)(index, helper, title)
    }
}

impl std::fmt::Debug for SlideBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SlideBuilder(..)")
    }
}

/// One entry of a definition's `slides` list.
///
/// Anything that matches none of the known shapes is kept as `Invalid` so the
/// generation step can report it with the rest of the descriptor errors.
#[derive(Debug, Clone)]
pub enum SlideGroupSpec {
    Fields(Vec<FieldRef>),
    Group(GroupSpec),
    Section(String),
    Rest,
    Builder(SlideBuilder),
    Invalid(serde_json::Value),
}

impl SlideGroupSpec {
    pub fn fields<I, F>(items: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldRef>,
    {
        SlideGroupSpec::Fields(items.into_iter().map(Into::into).collect())
    }

    pub fn section(name: impl Into<String>) -> Self {
        SlideGroupSpec::Section(name.into())
    }

    fn from_token(token: String) -> Self {
        if token == REST_GROUP_TOKEN {
            return SlideGroupSpec::Rest;
        }
        match token.strip_prefix(SECTION_GROUP_PREFIX) {
            Some(name) => SlideGroupSpec::Section(name.to_string()),
            None => SlideGroupSpec::Invalid(serde_json::Value::String(token)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGroup {
    Fields(Vec<FieldRef>),
    Group(GroupSpec),
    Token(String),
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for SlideGroupSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawGroup::deserialize(deserializer)? {
            RawGroup::Fields(fields) => SlideGroupSpec::Fields(fields),
            RawGroup::Group(group) => SlideGroupSpec::Group(group),
            RawGroup::Token(token) => SlideGroupSpec::from_token(token),
            RawGroup::Other(value) => SlideGroupSpec::Invalid(value),
        })
    }
}

impl Serialize for SlideGroupSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SlideGroupSpec::Fields(fields) => fields.serialize(serializer),
            SlideGroupSpec::Group(group) => group.serialize(serializer),
            SlideGroupSpec::Section(name) => {
                serializer.serialize_str(&format!("{SECTION_GROUP_PREFIX}{name}"))
            }
            SlideGroupSpec::Rest => serializer.serialize_str(REST_GROUP_TOKEN),
            SlideGroupSpec::Builder(_) => Err(S::Error::custom(
                "programmatic slide builders cannot be serialized",
            )),
            SlideGroupSpec::Invalid(value) => value.serialize(serializer),
        }
    }
}
