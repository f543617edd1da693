use super::descriptor::SlideDescriptor;
use super::hooks::{SlideContext, SlideHooks, Validation};
use crate::expression::ExpressionEvaluator;
use crate::form::{FieldIssue, FormFactory, SubForm};
use crate::schema::DocField;
use crate::shared::{Fieldname, SessionLog};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Result of the last validation: never validated, passed, failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationStatus {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideMode {
    /// Fields bound one-to-one to the shared values.
    Bound,
    /// Suffixed copies of the fields, one set per entry.
    Atomic { entries: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideState {
    pub seen: bool,
    pub done: bool,
    pub error: bool,
    pub skip: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideErrors {
    pub invalid: Vec<FieldIssue>,
    pub missing_required: Vec<String>,
    pub rejected_by_hook: bool,
}

impl SlideErrors {
    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty() && self.missing_required.is_empty() && !self.rejected_by_hook
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing_required.is_empty() {
            parts.push(format!("missing: {}", self.missing_required.join(", ")));
        }
        if !self.invalid.is_empty() {
            let fields: Vec<&str> = self.invalid.iter().map(|i| i.fieldname.as_str()).collect();
            parts.push(format!("invalid: {}", fields.join(", ")));
        }
        if self.rejected_by_hook {
            parts.push("rejected by validation".to_string());
        }
        parts.join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCheck {
    Clean,
    Errors(SlideErrors),
    /// The validation hook deferred its answer.
    Pending,
}

/// Values and collaborators a slide needs for one operation.
pub(crate) struct SlideEnv<'a> {
    pub values: &'a Map<String, Value>,
    pub values_is_doc: bool,
    pub log: &'a SessionLog,
}

/// One wizard page over a subset of the shared values.
pub struct Slide {
    index: usize,
    descriptor: SlideDescriptor,
    hooks: Arc<dyn SlideHooks>,
    evaluator: Arc<dyn ExpressionEvaluator>,
    form_factory: FormFactory,
    form: Option<Box<dyn SubForm>>,
    mode: SlideMode,
    seen: bool,
    done: bool,
    visible: bool,
    last_validation: ValidationStatus,
}

impl Slide {
    pub(crate) fn new(
        index: usize,
        descriptor: SlideDescriptor,
        hooks: Arc<dyn SlideHooks>,
        evaluator: Arc<dyn ExpressionEvaluator>,
        form_factory: FormFactory,
    ) -> Self {
        let mode = if descriptor.add_more {
            SlideMode::Atomic { entries: 1 }
        } else {
            SlideMode::Bound
        };
        Self {
            index,
            descriptor,
            hooks,
            evaluator,
            form_factory,
            form: None,
            mode,
            seen: false,
            done: false,
            visible: false,
            last_validation: ValidationStatus::Unknown,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &SlideDescriptor {
        &self.descriptor
    }

    pub fn mode(&self) -> SlideMode {
        self.mode
    }

    pub fn is_made(&self) -> bool {
        self.form.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn seen(&self) -> bool {
        self.seen
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn last_validation(&self) -> ValidationStatus {
        self.last_validation
    }

    pub fn form(&self) -> Option<&dyn SubForm> {
        self.form.as_deref()
    }

    pub(crate) fn form_mut(&mut self) -> Option<&mut (dyn SubForm + 'static)> {
        self.form.as_deref_mut()
    }

    pub(crate) fn mark_done(&mut self) {
        self.done = true;
    }

    /// Fields the sub-form is built from: the descriptor's fields, or the
    /// suffixed copies in multi-entry mode.
    pub fn form_fields(&self) -> Vec<DocField> {
        match self.mode {
            SlideMode::Bound => self.descriptor.fields.clone(),
            SlideMode::Atomic { entries } => atomic_fields(&self.descriptor.fields, entries),
        }
    }

    pub fn owns_field(&self, fieldname: &str) -> bool {
        match self.form.as_ref() {
            Some(form) => form.owns_field(fieldname),
            None => self
                .form_fields()
                .iter()
                .any(|field| field.fieldname.as_str() == fieldname && !field.fieldtype.is_layout()),
        }
    }

    fn context<'a>(&'a self, values: &'a Map<String, Value>, values_is_doc: bool) -> SlideContext<'a> {
        SlideContext {
            index: self.index,
            name: &self.descriptor.name,
            values,
            values_is_doc,
        }
    }

    /// Builds the sub-form. A second call leaves the existing form untouched
    /// and returns false.
    pub(crate) fn make(&mut self, env: &SlideEnv<'_>) -> bool {
        if self.form.is_some() {
            env.log.warn(
                "slide.make_twice",
                &format!("slide `{}` is already made", self.descriptor.name),
            );
            return false;
        }
        let mut form = (self.form_factory)(self.form_fields());
        form.make();
        form.set_values(env.values);
        form.refresh(env.values);
        let ctx = SlideContext {
            index: self.index,
            name: &self.descriptor.name,
            values: env.values,
            values_is_doc: env.values_is_doc,
        };
        self.hooks.after_load(&ctx, form.as_mut());
        self.form = Some(form);
        true
    }

    pub(crate) fn show_slide(&mut self, env: &SlideEnv<'_>) {
        if self.form.is_none() {
            self.make(env);
        }
        let ctx = SlideContext {
            index: self.index,
            name: &self.descriptor.name,
            values: env.values,
            values_is_doc: env.values_is_doc,
        };
        if let Some(form) = self.form.as_deref_mut() {
            form.set_values(env.values);
            form.refresh(env.values);
            self.hooks.before_show(&ctx, form);
            form.focus_on_first_input();
        }
        self.visible = true;
        self.seen = true;
    }

    pub(crate) fn hide_slide(&mut self) {
        self.visible = false;
    }

    /// Drops the sub-form; seen/done/validation flags survive for the dots.
    pub(crate) fn destroy(&mut self) {
        self.form = None;
        self.visible = false;
    }

    pub fn should_skip(&self, values: &Map<String, Value>, values_is_doc: bool) -> bool {
        if let Some(skip) = self
            .hooks
            .should_skip(&self.context(values, values_is_doc))
        {
            return skip;
        }
        if self.descriptor.always_skip {
            return true;
        }
        self.descriptor
            .condition
            .as_ref()
            .map(|condition| !self.evaluator.evaluate(condition, values))
            .unwrap_or(false)
    }

    pub fn validate(&self, values: &Map<String, Value>, values_is_doc: bool) -> Validation {
        self.hooks.validate(&self.context(values, values_is_doc))
    }

    /// Form-level problems, without calling the validation hook.
    pub fn form_errors(&mut self, ignore_required: bool, values: &Map<String, Value>) -> SlideErrors {
        let Some(form) = self.form.as_deref_mut() else {
            return SlideErrors::default();
        };
        form.refresh(values);
        SlideErrors {
            invalid: form.invalid_fields(),
            missing_required: if ignore_required {
                Vec::new()
            } else {
                form.missing_required()
            },
            rejected_by_hook: false,
        }
    }

    pub(crate) fn has_errors(&mut self, ignore_required: bool, env: &SlideEnv<'_>) -> ErrorCheck {
        if self.form.is_none() {
            self.make(env);
        }
        let errors = self.form_errors(ignore_required, env.values);
        if !errors.is_empty() {
            self.last_validation = ValidationStatus::Invalid;
            return ErrorCheck::Errors(errors);
        }
        match self.validate(env.values, env.values_is_doc) {
            Validation::Ready(true) => {
                self.last_validation = ValidationStatus::Valid;
                ErrorCheck::Clean
            }
            Validation::Ready(false) => {
                self.last_validation = ValidationStatus::Invalid;
                ErrorCheck::Errors(SlideErrors {
                    rejected_by_hook: true,
                    ..SlideErrors::default()
                })
            }
            Validation::Deferred => ErrorCheck::Pending,
        }
    }

    pub(crate) fn resolve_deferred(&mut self, passed: bool) {
        self.last_validation = if passed {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid
        };
    }

    /// `force_get_all` returns the values even when the form is invalid.
    pub fn get_values(&self, force_get_all: bool) -> Option<Map<String, Value>> {
        match self.form.as_ref() {
            Some(form) => form.get_values(force_get_all),
            None => Some(Map::new()),
        }
    }

    pub fn get_state(&self, values: &Map<String, Value>, values_is_doc: bool) -> SlideState {
        SlideState {
            seen: self.seen,
            done: self.done,
            error: self.last_validation == ValidationStatus::Invalid,
            skip: self.should_skip(values, values_is_doc),
        }
    }

    /// Adds another entry to a multi-entry slide, keeping entered values.
    /// Returns the new entry count, or `None` when the slide is not
    /// multi-entry or already holds `max_count` entries.
    pub(crate) fn add_more_entry(&mut self, env: &SlideEnv<'_>) -> Option<usize> {
        let SlideMode::Atomic { entries } = self.mode else {
            return None;
        };
        if self
            .descriptor
            .max_count
            .is_some_and(|max_count| entries >= max_count)
        {
            return None;
        }
        let kept = self.get_values(true).unwrap_or_default();
        self.mode = SlideMode::Atomic {
            entries: entries + 1,
        };
        let was_visible = self.visible;
        self.form = None;
        self.make(env);
        if let Some(form) = self.form.as_deref_mut() {
            form.set_values(&kept);
            form.refresh(env.values);
        }
        self.visible = was_visible;
        Some(entries + 1)
    }
}

impl std::fmt::Debug for Slide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slide")
            .field("index", &self.index)
            .field("name", &self.descriptor.name)
            .field("mode", &self.mode)
            .field("made", &self.form.is_some())
            .field("seen", &self.seen)
            .field("done", &self.done)
            .field("last_validation", &self.last_validation)
            .finish()
    }
}

/// Copies of the value fields with `_<n>` suffixes for entries `1..=entries`.
pub fn atomic_fields(fields: &[DocField], entries: usize) -> Vec<DocField> {
    (1..=entries)
        .flat_map(|entry| {
            fields.iter().map(move |field| {
                let mut copy = field.clone();
                if !field.fieldtype.is_layout() {
                    copy.fieldname =
                        Fieldname::from_trusted(&format!("{}_{entry}", field.fieldname));
                }
                copy
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Condition, DependsOnEvaluator};
    use crate::form::field_group_factory;
    use crate::schema::FieldType;
    use crate::slides::hooks::DefaultHooks;
    use serde_json::json;

    fn text_field(name: &str) -> DocField {
        DocField::new(Fieldname::parse(name).expect("fieldname"), FieldType::Data)
    }

    fn slide(descriptor: SlideDescriptor) -> Slide {
        let evaluator: Arc<dyn ExpressionEvaluator> = Arc::new(DependsOnEvaluator);
        Slide::new(
            0,
            descriptor,
            Arc::new(DefaultHooks),
            evaluator.clone(),
            field_group_factory(evaluator),
        )
    }

    #[test]
    fn make_twice_is_a_no_op() {
        let mut slide = slide(SlideDescriptor::new("a", "A", vec![text_field("x")]));
        let values = Map::new();
        let log = SessionLog::disabled();
        let env = SlideEnv {
            values: &values,
            values_is_doc: false,
            log: &log,
        };
        assert!(slide.make(&env));
        assert!(!slide.make(&env));
    }

    #[test]
    fn error_flag_stays_false_until_validated() {
        let mut slide = slide(SlideDescriptor::new(
            "a",
            "A",
            vec![text_field("x").required()],
        ));
        let values = Map::new();
        let log = SessionLog::disabled();
        let env = SlideEnv {
            values: &values,
            values_is_doc: false,
            log: &log,
        };
        slide.show_slide(&env);
        assert!(!slide.get_state(&values, false).error);
        assert!(matches!(slide.has_errors(false, &env), ErrorCheck::Errors(_)));
        assert!(slide.get_state(&values, false).error);
        assert_eq!(slide.has_errors(true, &env), ErrorCheck::Clean);
        assert_eq!(slide.last_validation(), ValidationStatus::Valid);
    }

    #[test]
    fn condition_drives_skip_live() {
        let slide = slide(
            SlideDescriptor::new("b", "B", vec![text_field("y")])
                .with_condition(Condition::parse("eval:doc.x=='foo'").expect("condition")),
        );
        let mut values = Map::new();
        values.insert("x".to_string(), json!("bar"));
        assert!(slide.should_skip(&values, false));
        values.insert("x".to_string(), json!("foo"));
        assert!(!slide.should_skip(&values, false));
    }

    #[test]
    fn add_more_appends_suffixed_fields_up_to_max() {
        let mut descriptor = SlideDescriptor::new("people", "People", vec![text_field("name")]);
        descriptor.add_more = true;
        descriptor.max_count = Some(2);
        let mut slide = slide(descriptor);
        let values = Map::new();
        let log = SessionLog::disabled();
        let env = SlideEnv {
            values: &values,
            values_is_doc: false,
            log: &log,
        };
        slide.show_slide(&env);
        slide
            .form_mut()
            .expect("form")
            .set_value("name_1", json!("Ada"))
            .expect("set");
        assert_eq!(slide.add_more_entry(&env), Some(2));
        assert_eq!(slide.add_more_entry(&env), None);
        let kept = slide.get_values(true).expect("values");
        assert_eq!(kept.get("name_1"), Some(&json!("Ada")));
        assert!(slide.owns_field("name_2"));
        assert!(!slide.owns_field("name"));
    }
}
