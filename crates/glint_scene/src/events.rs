//! Input event dispatch.
//!
//! The engine does not source events; the host feeds them in on the
//! frame-loop thread between ticks. Listeners can be global or scoped to a
//! single node, and fire in registration order. A panicking listener is
//! isolated and logged, like a property watcher.

use crate::graph::NodeId;
use glint_core::PropertyStore;
use std::panic::{catch_unwind, AssertUnwindSafe};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Pointer press on a node.
    Press,
    /// Key press, always global.
    KeyPress,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Press {
        /// Hit-test result supplied by the host, if any.
        target: Option<NodeId>,
        x: f64,
        y: f64,
        button: u32,
    },
    KeyPress {
        keycode: u32,
        ch: Option<char>,
        modifiers: Modifiers,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Press { .. } => EventKind::Press,
            Event::KeyPress { .. } => EventKind::KeyPress,
        }
    }

    pub fn target(&self) -> Option<NodeId> {
        match self {
            Event::Press { target, .. } => *target,
            Event::KeyPress { .. } => None,
        }
    }
}

/// Handle for unregistering a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerId(u64);

pub type ListenerFn = Box<dyn FnMut(&Event, &mut PropertyStore)>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    /// `None` matches every event of the kind; `Some` only events
    /// targeting that node.
    target: Option<NodeId>,
    callback: ListenerFn,
}

#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<Listener>,
    next: u64,
}

impl Listeners {
    pub fn on(&mut self, kind: EventKind, target: Option<NodeId>, callback: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push(Listener {
            id,
            kind,
            target,
            callback,
        });
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|l| l.id != id);
        self.entries.len() != before
    }

    pub fn dispatch(&mut self, event: &Event, store: &mut PropertyStore) {
        let kind = event.kind();
        let target = event.target();

        // Taken out so listeners can register or remove listeners
        // re-entrantly without aliasing the list.
        let mut taken = std::mem::take(&mut self.entries);
        for listener in taken.iter_mut() {
            if listener.kind != kind {
                continue;
            }
            if listener.target.is_some() && listener.target != target {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                (listener.callback)(event, store);
            }));
            if outcome.is_err() {
                tracing::error!(?kind, "event listener panicked; continuing");
            }
        }
        taken.append(&mut self.entries);
        self.entries = taken;
    }
}
