/// Message bar fed by level events.
///
/// `Banner` is attached to the controller as an external observer, so it
/// keeps receiving events across resets, level changes and restores. It
/// also raises a repaint flag the main loop reads to force a full redraw.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

use stickrun::domain::entity::EntityKind;
use stickrun::domain::observer::Observer;
use stickrun::sim::event::GameEvent;

/// How long a message stays on screen.
const MESSAGE_TTL: Duration = Duration::from_secs(3);

#[derive(Default)]
pub struct Banner {
    message: RefCell<Option<(String, Instant)>>,
    repaint: Cell<bool>,
}

impl Banner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn say(&self, text: impl Into<String>) {
        *self.message.borrow_mut() = Some((text.into(), Instant::now()));
    }

    /// Current message, or empty once it has expired.
    pub fn text(&self) -> String {
        match &*self.message.borrow() {
            Some((text, at)) if at.elapsed() < MESSAGE_TTL => text.clone(),
            _ => String::new(),
        }
    }

    /// True once after a level was swapped or restored.
    pub fn take_repaint(&self) -> bool {
        self.repaint.replace(false)
    }
}

fn describe(event: &GameEvent) -> Option<&'static str> {
    match event {
        GameEvent::PickupCollected { kind: EntityKind::Mushroom } => Some("Mushroom! Press F to shoot"),
        GameEvent::EntityDestroyed { kind: EntityKind::Slime } => Some("Slime down +100"),
        GameEvent::PlayerKilled => Some("Ouch!"),
        GameEvent::LevelWon => Some("Level clear!"),
        GameEvent::LevelLost => Some("Out of lives"),
        GameEvent::LevelReset => Some("Try again"),
        GameEvent::Restored => Some("Snapshot restored"),
        _ => None,
    }
}

impl Observer for Banner {
    fn update(&self, event: &GameEvent) {
        if matches!(event, GameEvent::LevelReset | GameEvent::Restored | GameEvent::LevelWon) {
            self.repaint.set(true);
        }
        if let Some(text) = describe(event) {
            self.say(text);
        }
    }
}
