use super::sequencer::ValidationTicket;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum SlideEvent {
    SlideShown { index: usize, name: String },
    SlideHidden { index: usize },
    FieldChanged { fieldname: String, value: Value },
    NavigationBlocked { index: usize },
    ValidationPending { index: usize, ticket: ValidationTicket },
    ValidationResolved { ticket: ValidationTicket, passed: bool },
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&SlideEvent) + Send>;

/// Event bus owned by one wizard session. Listeners live exactly as long as
/// the session, so nothing has to be restored when it goes away.
#[derive(Default)]
pub struct SessionEvents {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u64,
    suspended: bool,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&SlideEvent) + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    pub fn emit(&mut self, event: &SlideEvent) {
        if self.suspended {
            return;
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }

    /// Events emitted while suspended are dropped.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEvents")
            .field("listeners", &self.listeners.len())
            .field("suspended", &self.suspended)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn suspended_bus_drops_events_and_unsubscribe_detaches() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut events = SessionEvents::new();
        let id = events.subscribe(move |event| {
            sink.lock().expect("lock").push(event.clone());
        });

        events.emit(&SlideEvent::Completed);
        events.suspend();
        events.emit(&SlideEvent::SlideHidden { index: 0 });
        events.resume();
        assert!(events.unsubscribe(id));
        events.emit(&SlideEvent::Completed);

        assert_eq!(*seen.lock().expect("lock"), vec![SlideEvent::Completed]);
        assert_eq!(events.listener_count(), 0);
    }
}
