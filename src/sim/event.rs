/// Events emitted by entities and levels.
/// Observers (the owning level, the controller, views) consume these.

use crate::domain::entity::EntityKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    /// An entity was deactivated by a hit (enemy shot, bullet spent).
    EntityDestroyed { kind: EntityKind },
    /// A pickup was consumed by the hero.
    PickupCollected { kind: EntityKind },
    PlayerUpgraded,
    PlayerKilled,
    /// The hero touched the goal. The level turns this into `LevelWon`.
    GoalReached,
    LevelWon,
    LevelLost,
    /// The level was rebuilt from its source.
    LevelReset,
    /// The level came back from a snapshot.
    Restored,
}
