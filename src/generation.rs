//! Turns a definition plus schema into slide descriptors.
//!
//! Both strategies are pure: nothing is cached between calls, so the same
//! definition can be rendered again for a different document.

pub mod auto;
pub mod groups;

pub use auto::auto_slides;
pub use groups::{explicit_slides, GroupToSlide};

use crate::config::SlideViewDefinition;
use crate::expression::ExpressionError;
use crate::schema::{DocField, Schema};
use crate::slides::SlideDescriptor;

/// A malformed slide or field-group entry. Always a configuration bug.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("slide entry {entry}: fieldname `{fieldname}` is not in the reference schema")]
    UnknownField { entry: usize, fieldname: String },
    #[error("slide entry {entry}: fieldname `{fieldname}` needs a reference schema")]
    FieldWithoutSchema { entry: usize, fieldname: String },
    #[error("slide entry {entry}: no section named `{name}`")]
    UnknownSection { entry: usize, name: String },
    #[error("slide entry {entry}: `section:{name}` needs a reference schema")]
    SectionWithoutSchema { entry: usize, name: String },
    #[error("slide entry {entry}: `*` needs a reference schema")]
    RestWithoutSchema { entry: usize },
    #[error("slide entry {entry}: `*` must be the last entry")]
    RestNotLast { entry: usize },
    #[error("slide entry {entry}: field group is empty")]
    EmptyGroup { entry: usize },
    #[error("slide entry {entry}: condition `{expression}` is invalid")]
    InvalidCondition {
        entry: usize,
        expression: String,
        #[source]
        source: ExpressionError,
    },
    #[error("slide entry {entry}: unsupported entry {value}")]
    InvalidEntry { entry: usize, value: String },
    #[error("slide entry {entry}: {reason}")]
    Builder { entry: usize, reason: String },
}

/// Picks the strategy: explicit groups when the definition lists slides,
/// otherwise one slide per schema section.
///
/// `prompt_for_name` prepends the name-entry field; callers set it for new
/// records whose schema wants a user-supplied name.
pub fn generate_slides(
    definition: &SlideViewDefinition,
    schema: Option<&Schema>,
    prompt_for_name: bool,
) -> Result<Vec<SlideDescriptor>, GenerationError> {
    match definition.slides.as_deref() {
        Some(groups) => {
            let mut slides = explicit_slides(groups, schema, &definition.title)?;
            if prompt_for_name {
                if let Some(first) = slides.iter_mut().find(|slide| !slide.always_skip) {
                    first.fields.insert(0, DocField::new_name_field());
                }
            }
            Ok(slides)
        }
        None => Ok(schema
            .map(|schema| auto_slides(schema, &definition.title, prompt_for_name))
            .unwrap_or_default()),
    }
}
