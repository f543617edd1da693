use super::descriptor::SlideDescriptor;
use super::events::{ListenerId, SessionEvents, SlideEvent};
use super::hooks::{DefaultHooks, SlideHooks};
use super::progress::{DotState, DotsUpdate, ProgressDots};
use super::slide::{ErrorCheck, Slide, SlideEnv, SlideErrors};
use crate::document::ValueBag;
use crate::expression::{DependsOnEvaluator, ExpressionEvaluator};
use crate::form::{field_group_factory, FormError, FormFactory};
use crate::shared::SessionLog;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SlidesError {
    #[error("slide list is empty")]
    NoSlides,
    #[error("a validation is in progress (ticket {ticket})")]
    Busy { ticket: u64 },
    #[error("wizard is already complete")]
    AlreadyComplete,
    #[error("wizard has been disposed")]
    Disposed,
    #[error("wizard is hidden; its slide forms are not loaded")]
    Hidden,
    #[error("going back is not allowed")]
    BackNotAllowed,
    #[error("progress dots are not clickable")]
    DotsNotClickable,
    #[error("cannot jump forward to slide {target} in unidirectional mode")]
    JumpForwardNotAllowed { target: usize },
    #[error("slide {index} is out of range (0..{len})")]
    SlideOutOfRange { index: usize, len: usize },
    #[error("slide {index} is skipped")]
    SlideSkipped { index: usize },
    #[error("validation ticket {ticket} is not pending")]
    StaleTicket { ticket: u64 },
    #[error("slide `{slide}` cannot take another entry")]
    AddMoreUnavailable { slide: String },
    #[error(transparent)]
    Form(#[from] FormError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self, index: usize, len: usize) -> Option<usize> {
        match self {
            Direction::Forward => index.checked_add(1).filter(|next| *next < len),
            Direction::Backward => index.checked_sub(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValidationTicket(u64);

impl ValidationTicket {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavOutcome {
    Moved { from: usize, to: usize },
    Stayed,
    Blocked { slide: usize, errors: SlideErrors },
    /// Waiting for `Slides::resolve_validation`.
    Pending(ValidationTicket),
    /// Aggregated values handed to the completion handler.
    Completed(Map<String, Value>),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionState {
    pub can_prev: bool,
    pub can_next: bool,
    /// Forward action completes the wizard instead of moving.
    pub next_completes: bool,
    pub next_enabled: bool,
    pub complete_enabled: bool,
    pub busy: bool,
}

pub type CompletionHandler = Box<dyn FnOnce(&ValueBag) + Send>;

pub struct SlidesOptions {
    pub starting_slide: usize,
    pub unidirectional: bool,
    pub unidirectional_allow_back: bool,
    pub clickable_progress_dots: bool,
    pub done_state: bool,
    /// Hooks keyed by slide name.
    pub hooks: BTreeMap<String, Arc<dyn SlideHooks>>,
    pub evaluator: Arc<dyn ExpressionEvaluator>,
    /// Defaults to a headless `FieldGroup` per slide.
    pub form_factory: Option<FormFactory>,
    pub log: SessionLog,
}

impl Default for SlidesOptions {
    fn default() -> Self {
        Self {
            starting_slide: 0,
            unidirectional: false,
            unidirectional_allow_back: true,
            clickable_progress_dots: false,
            done_state: false,
            hooks: BTreeMap::new(),
            evaluator: Arc::new(DependsOnEvaluator),
            form_factory: None,
            log: SessionLog::disabled(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Active,
    Complete,
    Disposed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SuspendedAction {
    Next { target: usize },
    Jump { target: usize },
    Complete,
}

#[derive(Debug, Clone, Copy)]
struct PendingValidation {
    ticket: ValidationTicket,
    slide: usize,
    action: SuspendedAction,
}

/// Ordered wizard over a shared value bag.
pub struct Slides {
    slides: Vec<Slide>,
    current_id: usize,
    bag: ValueBag,
    unidirectional: bool,
    unidirectional_allow_back: bool,
    clickable_progress_dots: bool,
    done_state: bool,
    events: SessionEvents,
    log: SessionLog,
    dots: ProgressDots,
    actions: ActionState,
    phase: Phase,
    hidden: bool,
    pending: Option<PendingValidation>,
    next_ticket: u64,
    on_complete: Option<CompletionHandler>,
}

impl Slides {
    pub fn new(
        descriptors: Vec<SlideDescriptor>,
        bag: ValueBag,
        options: SlidesOptions,
    ) -> Result<Self, SlidesError> {
        if descriptors.is_empty() {
            return Err(SlidesError::NoSlides);
        }
        let SlidesOptions {
            starting_slide,
            unidirectional,
            unidirectional_allow_back,
            clickable_progress_dots,
            done_state,
            hooks,
            evaluator,
            form_factory,
            log,
        } = options;
        let form_factory = form_factory.unwrap_or_else(|| field_group_factory(evaluator.clone()));
        let default_hooks: Arc<dyn SlideHooks> = Arc::new(DefaultHooks);
        let slides: Vec<Slide> = descriptors
            .into_iter()
            .enumerate()
            .map(|(index, descriptor)| {
                let slide_hooks = hooks
                    .get(&descriptor.name)
                    .cloned()
                    .unwrap_or_else(|| default_hooks.clone());
                Slide::new(
                    index,
                    descriptor,
                    slide_hooks,
                    evaluator.clone(),
                    form_factory.clone(),
                )
            })
            .collect();

        let current_id = starting_slide.min(slides.len() - 1);
        let mut wizard = Self {
            slides,
            current_id,
            bag,
            unidirectional,
            unidirectional_allow_back,
            clickable_progress_dots,
            done_state,
            events: SessionEvents::new(),
            log,
            dots: ProgressDots::new(),
            actions: ActionState::default(),
            phase: Phase::Active,
            hidden: false,
            pending: None,
            next_ticket: 1,
            on_complete: None,
        };
        if wizard.slide_is_skipped(current_id) {
            wizard.current_id = wizard
                .find_next_nonskipped_slide(Direction::Forward, current_id)
                .or_else(|| wizard.find_next_nonskipped_slide(Direction::Backward, current_id))
                .unwrap_or(current_id);
        }
        wizard.show_current();
        wizard.refresh();
        Ok(wizard)
    }

    pub fn set_on_complete<F>(&mut self, handler: F)
    where
        F: FnOnce(&ValueBag) + Send + 'static,
    {
        self.on_complete = Some(Box::new(handler));
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SlideEvent) + Send + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.current_id]
    }

    pub fn current_id(&self) -> usize {
        self.current_id
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn bag(&self) -> &ValueBag {
        &self.bag
    }

    pub fn into_bag(self) -> ValueBag {
        self.bag
    }

    pub fn dots(&self) -> &ProgressDots {
        &self.dots
    }

    pub fn action_state(&self) -> ActionState {
        self.actions
    }

    pub fn is_unidirectional(&self) -> bool {
        self.unidirectional
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn is_disposed(&self) -> bool {
        self.phase == Phase::Disposed
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn pending_ticket(&self) -> Option<ValidationTicket> {
        self.pending.map(|pending| pending.ticket)
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Going back is always safe unless unidirectional mode forbids it.
    pub fn allow_back(&self) -> bool {
        !self.unidirectional || self.unidirectional_allow_back
    }

    pub fn clickable_progress_dots(&self) -> bool {
        self.clickable_progress_dots
    }

    /// Shared values overlaid with whatever the current slide holds.
    pub fn values(&self) -> Map<String, Value> {
        let mut values = self.bag.values().clone();
        if let Some(current) = self.slides[self.current_id].get_values(true) {
            for (key, value) in current {
                values.insert(key, value);
            }
        }
        values
    }

    fn slide_is_skipped(&self, index: usize) -> bool {
        let values = self.values();
        self.slides[index].should_skip(&values, self.bag.is_doc())
    }

    /// First slide after `start` in `direction` whose skip predicate is false
    /// right now. Nothing is cached between calls.
    pub fn find_next_nonskipped_slide(&self, direction: Direction, start: usize) -> Option<usize> {
        let values = self.values();
        let is_doc = self.bag.is_doc();
        let mut index = start;
        while let Some(candidate) = direction.step(index, self.slides.len()) {
            if !self.slides[candidate].should_skip(&values, is_doc) {
                return Some(candidate);
            }
            index = candidate;
        }
        None
    }

    pub fn can_go_next(&self) -> bool {
        self.find_next_nonskipped_slide(Direction::Forward, self.current_id)
            .is_some()
    }

    pub fn can_go_prev(&self) -> bool {
        self.allow_back()
            && self
                .find_next_nonskipped_slide(Direction::Backward, self.current_id)
                .is_some()
    }

    fn ensure_navigable(&self) -> Result<(), SlidesError> {
        match self.phase {
            Phase::Disposed => return Err(SlidesError::Disposed),
            Phase::Complete => return Err(SlidesError::AlreadyComplete),
            Phase::Active => {}
        }
        if let Some(pending) = self.pending {
            return Err(SlidesError::Busy {
                ticket: pending.ticket.id(),
            });
        }
        Ok(())
    }

    pub fn next(&mut self) -> Result<NavOutcome, SlidesError> {
        self.ensure_navigable()?;
        match self.find_next_nonskipped_slide(Direction::Forward, self.current_id) {
            Some(target) => {
                let check = self.check_current(false);
                self.after_check(check, SuspendedAction::Next { target })
            }
            None => {
                let check = self.check_current(!self.unidirectional);
                self.after_check(check, SuspendedAction::Complete)
            }
        }
    }

    /// Never validates the slide being left.
    pub fn prev(&mut self) -> Result<NavOutcome, SlidesError> {
        self.ensure_navigable()?;
        if !self.allow_back() {
            return Err(SlidesError::BackNotAllowed);
        }
        match self.find_next_nonskipped_slide(Direction::Backward, self.current_id) {
            Some(target) => Ok(self.move_to(target, false)),
            None => Ok(NavOutcome::Stayed),
        }
    }

    /// Dot click. Validation failure marks the slide but never traps the user.
    pub fn jump_to(&mut self, target: usize) -> Result<NavOutcome, SlidesError> {
        self.ensure_navigable()?;
        if !self.clickable_progress_dots {
            return Err(SlidesError::DotsNotClickable);
        }
        if target >= self.slides.len() {
            return Err(SlidesError::SlideOutOfRange {
                index: target,
                len: self.slides.len(),
            });
        }
        if self.unidirectional && target > self.current_id {
            return Err(SlidesError::JumpForwardNotAllowed { target });
        }
        if self.slide_is_skipped(target) {
            return Err(SlidesError::SlideSkipped { index: target });
        }
        if target == self.current_id {
            return Ok(NavOutcome::Stayed);
        }
        let check = self.check_current(false);
        self.after_check(check, SuspendedAction::Jump { target })
    }

    /// Only the current slide is checked, with required fields ignored.
    pub fn complete(&mut self) -> Result<NavOutcome, SlidesError> {
        self.ensure_navigable()?;
        let check = self.check_current(true);
        self.after_check(check, SuspendedAction::Complete)
    }

    /// Finishes the navigation suspended on `ticket`.
    pub fn resolve_validation(
        &mut self,
        ticket: ValidationTicket,
        passed: bool,
    ) -> Result<NavOutcome, SlidesError> {
        if self.phase == Phase::Disposed {
            self.log.warn(
                "slides.validation_late",
                &format!("ticket {} resolved after dispose", ticket.id()),
            );
            return Err(SlidesError::Disposed);
        }
        let pending = match self.pending {
            Some(pending) if pending.ticket == ticket => pending,
            _ => {
                self.log.warn(
                    "slides.validation_stale",
                    &format!("ticket {} is not pending", ticket.id()),
                );
                return Err(SlidesError::StaleTicket { ticket: ticket.id() });
            }
        };
        self.pending = None;
        self.slides[pending.slide].resolve_deferred(passed);
        self.log.info(
            "slides.validation_resolved",
            &format!("ticket {} passed={passed}", ticket.id()),
        );
        self.events
            .emit(&SlideEvent::ValidationResolved { ticket, passed });
        let check = if passed {
            ErrorCheck::Clean
        } else {
            ErrorCheck::Errors(SlideErrors {
                rejected_by_hook: true,
                ..SlideErrors::default()
            })
        };
        self.after_check(check, pending.action)
    }

    fn check_current(&mut self, ignore_required: bool) -> ErrorCheck {
        let values = self.values();
        let env = SlideEnv {
            values: &values,
            values_is_doc: self.bag.is_doc(),
            log: &self.log,
        };
        self.slides[self.current_id].has_errors(ignore_required, &env)
    }

    fn after_check(
        &mut self,
        check: ErrorCheck,
        action: SuspendedAction,
    ) -> Result<NavOutcome, SlidesError> {
        let outcome = match (check, action) {
            (ErrorCheck::Pending, action) => {
                let ticket = ValidationTicket(self.next_ticket);
                self.next_ticket += 1;
                self.pending = Some(PendingValidation {
                    ticket,
                    slide: self.current_id,
                    action,
                });
                self.log.info(
                    "slides.validation_pending",
                    &format!("slide {} ticket {}", self.current_id, ticket.id()),
                );
                self.events.emit(&SlideEvent::ValidationPending {
                    index: self.current_id,
                    ticket,
                });
                NavOutcome::Pending(ticket)
            }
            (ErrorCheck::Clean, SuspendedAction::Next { target }) => self.move_to(target, true),
            (ErrorCheck::Clean, SuspendedAction::Jump { target }) => self.move_to(target, false),
            (ErrorCheck::Clean, SuspendedAction::Complete) => {
                self.slides[self.current_id].mark_done();
                self.finish_complete()
            }
            (ErrorCheck::Errors(errors), SuspendedAction::Next { target }) => {
                if self.unidirectional {
                    self.blocked(errors)
                } else {
                    self.move_to(target, false)
                }
            }
            (ErrorCheck::Errors(_), SuspendedAction::Jump { target }) => {
                self.move_to(target, false)
            }
            (ErrorCheck::Errors(errors), SuspendedAction::Complete) => self.blocked(errors),
        };
        self.refresh();
        Ok(outcome)
    }

    fn blocked(&mut self, errors: SlideErrors) -> NavOutcome {
        self.log.info(
            "slides.navigation_blocked",
            &format!("slide {}: {}", self.current_id, errors.summary()),
        );
        self.events.emit(&SlideEvent::NavigationBlocked {
            index: self.current_id,
        });
        NavOutcome::Blocked {
            slide: self.current_id,
            errors,
        }
    }

    /// Flushes the current slide's values into the shared bag, even when
    /// they do not validate.
    pub fn update_values(&mut self) {
        if let Some(values) = self.slides[self.current_id].get_values(true) {
            self.bag.merge(values);
        }
    }

    fn move_to(&mut self, target: usize, mark_done: bool) -> NavOutcome {
        let from = self.current_id;
        self.update_values();
        if mark_done {
            self.slides[from].mark_done();
        }
        self.slides[from].hide_slide();
        self.events.emit(&SlideEvent::SlideHidden { index: from });
        self.current_id = target;
        self.show_current();
        self.log.debug(
            "slides.moved",
            &format!("{from} -> {target}"),
        );
        NavOutcome::Moved { from, to: target }
    }

    fn show_current(&mut self) {
        let index = self.current_id;
        let env = SlideEnv {
            values: self.bag.values(),
            values_is_doc: self.bag.is_doc(),
            log: &self.log,
        };
        self.slides[index].show_slide(&env);
        let name = self.slides[index].name().to_string();
        self.events.emit(&SlideEvent::SlideShown { index, name });
    }

    fn finish_complete(&mut self) -> NavOutcome {
        self.update_values();
        self.phase = Phase::Complete;
        self.slides[self.current_id].hide_slide();
        self.log.info(
            "slides.completed",
            &format!("completed on slide {}", self.current_id),
        );
        if let Some(handler) = self.on_complete.take() {
            handler(&self.bag);
        }
        self.events.emit(&SlideEvent::Completed);
        NavOutcome::Completed(self.bag.values().clone())
    }

    /// Writes a field of the current slide. Bound documents see the value
    /// immediately; transient bags get it on the next flush.
    pub fn set_value(&mut self, fieldname: &str, value: Value) -> Result<(), SlidesError> {
        self.ensure_navigable()?;
        if self.hidden {
            return Err(SlidesError::Hidden);
        }
        let current = &mut self.slides[self.current_id];
        let form = current.form_mut().ok_or_else(|| FormError::UnknownField {
            fieldname: fieldname.to_string(),
        })?;
        form.set_value(fieldname, value.clone())?;
        if self.bag.is_doc() {
            self.bag.set(fieldname, value.clone());
        }
        self.events.emit(&SlideEvent::FieldChanged {
            fieldname: fieldname.to_string(),
            value,
        });
        self.refresh();
        Ok(())
    }

    /// Writes straight into the shared values, e.g. from a form script.
    /// The current slide picks the value up if it owns the field. Works while
    /// hidden; the slide reloads from the shared values on `show`.
    pub fn set_document_value(&mut self, fieldname: &str, value: Value) -> Result<(), SlidesError> {
        if self.phase == Phase::Disposed {
            return Err(SlidesError::Disposed);
        }
        if let Some(pending) = self.pending {
            return Err(SlidesError::Busy {
                ticket: pending.ticket.id(),
            });
        }
        self.bag.set(fieldname, value.clone());
        let current = &mut self.slides[self.current_id];
        if current.owns_field(fieldname) {
            if let Some(form) = current.form_mut() {
                form.set_value(fieldname, value.clone())?;
            }
        }
        self.events.emit(&SlideEvent::FieldChanged {
            fieldname: fieldname.to_string(),
            value,
        });
        self.refresh();
        Ok(())
    }

    pub fn add_more_entry(&mut self) -> Result<usize, SlidesError> {
        self.ensure_navigable()?;
        let index = self.current_id;
        let env = SlideEnv {
            values: self.bag.values(),
            values_is_doc: self.bag.is_doc(),
            log: &self.log,
        };
        let added = self.slides[index].add_more_entry(&env);
        let entries = added.ok_or_else(|| SlidesError::AddMoreUnavailable {
            slide: self.slides[index].name().to_string(),
        })?;
        self.refresh();
        Ok(entries)
    }

    /// Recomputes dots and action state from live values.
    pub fn refresh(&mut self) -> DotsUpdate {
        let update = self.render_progress_dots();
        self.actions = self.compute_action_state();
        update
    }

    pub fn render_progress_dots(&mut self) -> DotsUpdate {
        let values = self.values();
        let is_doc = self.bag.is_doc();
        let complete = self.phase == Phase::Complete;
        let states: Vec<DotState> = self
            .slides
            .iter()
            .enumerate()
            .map(|(index, slide)| {
                let state = slide.get_state(&values, is_doc);
                let active = self.phase == Phase::Active && index == self.current_id;
                let skip = state.skip && !active;
                let completed = if self.done_state {
                    state.done
                } else {
                    complete || index < self.current_id
                };
                DotState {
                    active,
                    skip,
                    error: state.seen && state.error,
                    success: self.done_state && state.done,
                    completed: completed && !skip,
                }
            })
            .collect();
        self.dots.update(states)
    }

    fn compute_action_state(&mut self) -> ActionState {
        if self.phase != Phase::Active {
            return ActionState::default();
        }
        let busy = self.pending.is_some();
        let can_next = self.can_go_next();
        let can_prev = self.can_go_prev();
        let blocking = if self.unidirectional {
            let values = self.values();
            !self.slides[self.current_id]
                .form_errors(false, &values)
                .is_empty()
        } else {
            false
        };
        ActionState {
            can_prev,
            can_next,
            next_completes: !can_next,
            next_enabled: !busy && !blocking,
            complete_enabled: !busy && !blocking,
            busy,
        }
    }

    /// Host page or dialog went out of view: events stop and forms are freed.
    pub fn hide(&mut self) {
        if self.hidden || self.phase == Phase::Disposed {
            return;
        }
        self.update_values();
        self.events.suspend();
        for slide in &mut self.slides {
            slide.destroy();
        }
        self.hidden = true;
        self.log.debug("slides.hidden", "wizard hidden");
    }

    pub fn show(&mut self) {
        if !self.hidden || self.phase == Phase::Disposed {
            return;
        }
        self.hidden = false;
        self.events.resume();
        if self.phase == Phase::Active {
            self.show_current();
        }
        self.refresh();
        self.log.debug("slides.shown", "wizard shown");
    }

    /// Detaches listeners. Pending validations resolved afterwards are
    /// rejected without touching the values.
    pub fn dispose(&mut self) {
        if self.phase == Phase::Disposed {
            return;
        }
        self.pending = None;
        self.phase = Phase::Disposed;
        self.events.clear();
        for slide in &mut self.slides {
            slide.destroy();
        }
        self.actions = ActionState::default();
        self.log.debug("slides.disposed", "wizard disposed");
    }
}

impl std::fmt::Debug for Slides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slides")
            .field("slides", &self.slides)
            .field("current_id", &self.current_id)
            .field("phase", &self.phase)
            .field("pending", &self.pending.map(|p| p.ticket))
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DocField, FieldType};
    use crate::shared::Fieldname;
    use serde_json::json;

    fn field(name: &str) -> DocField {
        DocField::new(Fieldname::parse(name).expect("fieldname"), FieldType::Data)
    }

    fn three_slides() -> Vec<SlideDescriptor> {
        vec![
            SlideDescriptor::new("a", "A", vec![field("x")]),
            SlideDescriptor::new("b", "B", vec![field("y")]),
            SlideDescriptor::new("c", "C", vec![field("z")]),
        ]
    }

    #[test]
    fn starting_slide_is_clamped() {
        let wizard = Slides::new(
            three_slides(),
            ValueBag::transient(),
            SlidesOptions {
                starting_slide: 99,
                ..SlidesOptions::default()
            },
        )
        .expect("slides");
        assert_eq!(wizard.current_id(), 2);
        assert!(wizard.action_state().next_completes);
    }

    #[test]
    fn empty_slide_list_is_rejected() {
        let err = Slides::new(Vec::new(), ValueBag::transient(), SlidesOptions::default())
            .expect_err("empty");
        assert!(matches!(err, SlidesError::NoSlides));
    }

    #[test]
    fn direction_step_stops_at_both_ends() {
        assert_eq!(Direction::Forward.step(1, 3), Some(2));
        assert_eq!(Direction::Forward.step(2, 3), None);
        assert_eq!(Direction::Backward.step(0, 3), None);
    }

    #[test]
    fn stale_ticket_is_rejected() {
        let mut wizard =
            Slides::new(three_slides(), ValueBag::transient(), SlidesOptions::default())
                .expect("slides");
        let err = wizard
            .resolve_validation(ValidationTicket(42), true)
            .expect_err("stale");
        assert!(matches!(err, SlidesError::StaleTicket { ticket: 42 }));
    }

    #[test]
    fn set_value_reaches_document_bag_immediately() {
        let mut values = Map::new();
        values.insert("x".to_string(), json!("old"));
        let doc = crate::document::Document::existing(
            crate::shared::SchemaName::parse("Todo").expect("schema"),
            "T-1",
            values,
        );
        let mut wizard = Slides::new(three_slides(), ValueBag::Document(doc), SlidesOptions::default())
            .expect("slides");
        wizard.set_value("x", json!("new")).expect("set");
        assert_eq!(wizard.bag().get("x"), Some(&json!("new")));
    }
}
