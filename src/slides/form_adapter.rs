//! Lets a wizard act as the edit form of its document.
//!
//! Scripts react to field changes observed on the session event bus. Writes
//! made by scripts are queued and applied in order, so a cascade of
//! dependent updates never re-enters a script.

use super::events::{ListenerId, SlideEvent};
use super::sequencer::{Slides, SlidesError};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Upper bound on change notifications handled for one external write.
pub const MAX_CASCADE_STEPS: usize = 64;

pub trait FormScript: Send {
    fn refresh(&mut self, _form: &mut FormHandle) {}

    fn on_change(&mut self, _fieldname: &str, _form: &mut FormHandle) {}

    fn validate(&mut self, _form: &mut FormHandle) -> Result<(), String> {
        Ok(())
    }

    fn before_save(&mut self, _form: &mut FormHandle) -> Result<(), String> {
        Ok(())
    }

    fn after_save(&mut self, _form: &mut FormHandle) {}
}

/// Snapshot handed to scripts. Writes are recorded, not applied.
#[derive(Debug, Default)]
pub struct FormHandle {
    values: Map<String, Value>,
    writes: Vec<(String, Value)>,
    messages: Vec<String>,
}

impl FormHandle {
    fn new(values: Map<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn get(&self, fieldname: &str) -> Option<&Value> {
        self.values.get(fieldname)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn set_value(&mut self, fieldname: impl Into<String>, value: Value) {
        let fieldname = fieldname.into();
        self.values.insert(fieldname.clone(), value.clone());
        self.writes.push((fieldname, value));
    }

    pub fn msgprint(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

type ChangeQueue = Arc<Mutex<VecDeque<String>>>;

pub struct SlideViewerForm {
    slides: Slides,
    scripts: Vec<Box<dyn FormScript>>,
    changes: ChangeQueue,
    listener: ListenerId,
    messages: Vec<String>,
}

impl SlideViewerForm {
    pub fn new(mut slides: Slides, scripts: Vec<Box<dyn FormScript>>) -> Self {
        let changes: ChangeQueue = Arc::new(Mutex::new(VecDeque::new()));
        let sink = changes.clone();
        let listener = slides.subscribe(move |event| {
            if let SlideEvent::FieldChanged { fieldname, .. } = event {
                let mut queue = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                queue.push_back(fieldname.clone());
            }
        });
        let mut form = Self {
            slides,
            scripts,
            changes,
            listener,
            messages: Vec::new(),
        };
        form.refresh();
        form
    }

    pub fn slides(&self) -> &Slides {
        &self.slides
    }

    pub fn slides_mut(&mut self) -> &mut Slides {
        &mut self.slides
    }

    pub fn into_slides(mut self) -> Slides {
        self.slides.unsubscribe(self.listener);
        self.slides
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// Runs every script's `refresh`.
    pub fn refresh(&mut self) {
        let mut handle = FormHandle::new(self.slides.values());
        for script in &mut self.scripts {
            script.refresh(&mut handle);
        }
        self.absorb(handle);
        self.drain_changes();
    }

    pub fn set_value(&mut self, fieldname: &str, value: Value) -> Result<(), SlidesError> {
        self.write(fieldname, value)?;
        self.drain_changes();
        Ok(())
    }

    pub fn validate(&mut self) -> Result<(), Vec<String>> {
        let mut handle = FormHandle::new(self.slides.values());
        let failures: Vec<String> = self
            .scripts
            .iter_mut()
            .filter_map(|script| script.validate(&mut handle).err())
            .collect();
        self.absorb(handle);
        self.drain_changes();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    pub fn before_save(&mut self) -> Result<(), String> {
        let mut handle = FormHandle::new(self.slides.values());
        let mut outcome = Ok(());
        for script in &mut self.scripts {
            if let Err(err) = script.before_save(&mut handle) {
                outcome = Err(err);
                break;
            }
        }
        self.absorb(handle);
        self.drain_changes();
        outcome
    }

    pub fn after_save(&mut self) {
        let mut handle = FormHandle::new(self.slides.values());
        for script in &mut self.scripts {
            script.after_save(&mut handle);
        }
        self.messages.append(&mut handle.messages);
    }

    fn write(&mut self, fieldname: &str, value: Value) -> Result<(), SlidesError> {
        if !self.slides.is_complete() && self.slides.current_slide().owns_field(fieldname) {
            self.slides.set_value(fieldname, value)
        } else {
            self.slides.set_document_value(fieldname, value)
        }
    }

    /// Applies recorded script writes; each one lands on the change queue.
    fn absorb(&mut self, mut handle: FormHandle) {
        self.messages.append(&mut handle.messages);
        for (fieldname, value) in handle.writes {
            if let Err(err) = self.write(&fieldname, value) {
                self.slides.log().warn(
                    "form.script_write_failed",
                    &format!("`{fieldname}`: {err}"),
                );
            }
        }
    }

    fn pop_change(&self) -> Option<String> {
        let mut queue = self
            .changes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        queue.pop_front()
    }

    fn drain_changes(&mut self) {
        let mut steps = 0;
        while let Some(fieldname) = self.pop_change() {
            steps += 1;
            if steps > MAX_CASCADE_STEPS {
                self.slides.log().warn(
                    "form.cascade_limit",
                    &format!("stopped after {MAX_CASCADE_STEPS} changes at `{fieldname}`"),
                );
                let mut queue = self
                    .changes
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                queue.clear();
                return;
            }
            let mut handle = FormHandle::new(self.slides.values());
            for script in &mut self.scripts {
                script.on_change(&fieldname, &mut handle);
            }
            self.absorb(handle);
        }
    }
}
