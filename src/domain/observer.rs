/// Observer plumbing shared by entities and levels.
///
/// A subject keeps an ordered `Observers` list. Two kinds of subscriber:
///   - `Owner`  : whoever owns the subject (the level for an entity, the
///     controller for a level). Delivered by pushing onto the outbox the
///     owner drains after the current call returns.
///   - `Shared` : an external listener held by reference. Delivered
///     immediately, in attachment order.
///
/// Cloning an `Observers` list clones the handles, not the listeners:
/// a copied subject keeps reporting to the same external views.
///
/// Notification takes `&self`, so a listener cannot add or remove
/// subscribers while the list is being walked.

use std::fmt;
use std::rc::Rc;

use crate::sim::event::GameEvent;

/// Queue of events addressed to the owner of a subject.
pub type Outbox = Vec<GameEvent>;

pub trait Observer {
    fn update(&self, event: &GameEvent);
}

#[derive(Clone)]
pub enum Subscriber {
    Owner,
    Shared(Rc<dyn Observer>),
}

impl Subscriber {
    /// Identity comparison: `Shared` handles match when they point at the same listener.
    pub fn same_as(&self, other: &Subscriber) -> bool {
        match (self, other) {
            (Subscriber::Owner, Subscriber::Owner) => true,
            (Subscriber::Shared(a), Subscriber::Shared(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscriber::Owner => f.write_str("Owner"),
            Subscriber::Shared(rc) => write!(f, "Shared({:p})", Rc::as_ptr(rc) as *const ()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Observers {
    list: Vec<Subscriber>,
}

impl Observers {
    pub fn new() -> Self {
        Observers { list: Vec::new() }
    }

    /// Attach unless already present.
    pub fn attach(&mut self, subscriber: Subscriber) {
        if !self.contains(&subscriber) {
            self.list.push(subscriber);
        }
    }

    pub fn detach(&mut self, subscriber: &Subscriber) {
        self.list.retain(|s| !s.same_as(subscriber));
    }

    pub fn contains(&self, subscriber: &Subscriber) -> bool {
        self.list.iter().any(|s| s.same_as(subscriber))
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subscriber> {
        self.list.iter()
    }

    pub fn notify(&self, event: &GameEvent, outbox: &mut Outbox) {
        for subscriber in &self.list {
            match subscriber {
                Subscriber::Owner => outbox.push(event.clone()),
                Subscriber::Shared(listener) => listener.update(event),
            }
        }
    }
}
