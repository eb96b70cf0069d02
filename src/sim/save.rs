/// Single-slot, in-memory save.
///
/// `GameMemento` is a complete, independent copy of everything the
/// controller needs to resume: the level graph, game state, timer reading,
/// lives, and scores. The `Caretaker` keeps only the most recent one.
///
/// Independence goes both ways: the memento takes a deep copy on the way
/// in, and `most_recent()` hands out another deep copy on the way out, so
/// neither the live game nor a restorer can touch the stored level.

use log::{debug, info};

use crate::error::SnapshotError;
use crate::sim::level::Level;
use crate::sim::state::GameState;

#[derive(Clone, Debug)]
pub struct GameMemento {
    level: Level,
    state: GameState,
    seconds: u64,
    lives: u32,
    current_point: i64,
    banked: bool,
    total_point: u32,
    level_index: usize,
}

impl GameMemento {
    /// Freeze the given values. `level` is copied, never borrowed into the memento.
    pub fn capture(
        level: &Level,
        state: GameState,
        seconds: u64,
        lives: u32,
        current_point: i64,
        banked: bool,
        total_point: u32,
        level_index: usize,
    ) -> Self {
        GameMemento {
            level: level.copy(),
            state,
            seconds,
            lives,
            current_point,
            banked,
            total_point,
            level_index,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Take the level out for restoring.
    pub fn into_level(self) -> Level {
        self.level
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    /// Time points of the level at capture.
    pub fn current_point(&self) -> i64 {
        self.current_point
    }

    /// Whether the level's points were already moved into the total.
    pub fn banked(&self) -> bool {
        self.banked
    }

    pub fn total_point(&self) -> u32 {
        self.total_point
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }
}

#[derive(Debug, Default)]
pub struct Caretaker {
    slot: Option<GameMemento>,
}

impl Caretaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is stored.
    pub fn overwrite(&mut self, memento: GameMemento) {
        if self.slot.is_some() {
            debug!("overwriting previous snapshot");
        }
        info!(
            "snapshot saved: level {} at {}s, {} lives",
            memento.level_index, memento.seconds, memento.lives
        );
        self.slot = Some(memento);
    }

    /// A fresh copy of the stored memento.
    pub fn most_recent(&self) -> Result<GameMemento, SnapshotError> {
        self.slot.clone().ok_or(SnapshotError::NotFound)
    }

    pub fn has_snapshot(&self) -> bool {
        self.slot.is_some()
    }
}
