use crate::form::SubForm;
use serde_json::{Map, Value};

/// Answer of a validation hook. `Deferred` means the host will report the
/// result later through `Slides::resolve_validation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Ready(bool),
    Deferred,
}

impl From<bool> for Validation {
    fn from(value: bool) -> Self {
        Validation::Ready(value)
    }
}

pub struct SlideContext<'a> {
    pub index: usize,
    pub name: &'a str,
    pub values: &'a Map<String, Value>,
    pub values_is_doc: bool,
}

/// Per-slide behaviour supplied by the wizard author.
pub trait SlideHooks: Send + Sync {
    fn validate(&self, _ctx: &SlideContext<'_>) -> Validation {
        Validation::Ready(true)
    }

    /// `Some` overrides the descriptor's condition.
    fn should_skip(&self, _ctx: &SlideContext<'_>) -> Option<bool> {
        None
    }

    fn before_show(&self, _ctx: &SlideContext<'_>, _form: &mut dyn SubForm) {}

    fn after_load(&self, _ctx: &SlideContext<'_>, _form: &mut dyn SubForm) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl SlideHooks for DefaultHooks {}
