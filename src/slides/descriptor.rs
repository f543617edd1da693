use crate::expression::Condition;
use crate::schema::DocField;

/// Plain description of one wizard page, produced by a generation strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDescriptor {
    pub name: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub help: Option<String>,
    pub image_src: Option<String>,
    pub fields: Vec<DocField>,
    pub condition: Option<Condition>,
    /// Set for slides that exist only to carry fields and are never shown.
    pub always_skip: bool,
    pub add_more: bool,
    pub max_count: Option<usize>,
}

impl SlideDescriptor {
    pub fn new(name: impl Into<String>, title: impl Into<String>, fields: Vec<DocField>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            subtitle: None,
            help: None,
            image_src: None,
            fields,
            condition: None,
            always_skip: false,
            add_more: false,
            max_count: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn value_field_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|field| !field.fieldtype.is_layout())
            .count()
    }
}
