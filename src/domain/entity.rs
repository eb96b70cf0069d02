/// Entities: the common body every simulated object carries and the
/// `Entity` trait the level stores them behind.
///
/// Capabilities (moving, interactable, point giver, projectile) are
/// separate traits; an entity advertises the ones it has through the
/// `as_*` accessors, and the level partitions its views by asking.

use std::fmt;

use super::capability::{Interactable, Moving, PointGiver, Projectile};
use super::observer::{Observers, Outbox};
use super::physics::Aabb;
use crate::sim::event::GameEvent;

/// Draw ordering only. Also used to keep scenery out of collision sweeps.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Layer {
    Background,
    Foreground,
    Effect,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, +1.0 for right.
    pub fn sign(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntityKind {
    Hero,
    Slime,
    Mushroom,
    Platform,
    Flag,
    Cloud,
    Bullet,
    WinMarker,
    LoseMarker,
}

/// Handle the level uses to address an entity across its views.
/// Copies of a level keep the same handles for corresponding entities.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Reserved for the hero of every level.
    pub const HERO: EntityId = EntityId(0);
}

/// State shared by every entity.
#[derive(Clone, Debug)]
pub struct Body {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub layer: Layer,
    pub active: bool,
    pub observers: Observers,
}

impl Body {
    pub fn new(x: f64, y: f64, width: f64, height: f64, layer: Layer) -> Self {
        Body {
            x, y, width, height, layer,
            active: true,
            observers: Observers::new(),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn overlaps(&self, other: &Body) -> bool {
        self.aabb().overlaps(&other.aabb())
    }

    pub fn notify(&self, event: GameEvent, outbox: &mut Outbox) {
        self.observers.notify(&event, outbox);
    }

    /// Deactivate and tell observers. Returns false if already inactive.
    pub fn deactivate(&mut self, event: GameEvent, outbox: &mut Outbox) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.notify(event, outbox);
        true
    }
}

pub trait Entity: fmt::Debug {
    fn kind(&self) -> EntityKind;
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;

    /// Independent clone: positions, sizes, flags and velocities are
    /// duplicated; observer handles are re-attached, not cloned.
    fn copy(&self) -> Box<dyn Entity>;

    /// Can other entities stand on it?
    fn is_solid(&self) -> bool {
        false
    }

    fn as_moving(&self) -> Option<&dyn Moving> {
        None
    }

    fn as_moving_mut(&mut self) -> Option<&mut dyn Moving> {
        None
    }

    fn as_interactable_mut(&mut self) -> Option<&mut dyn Interactable> {
        None
    }

    fn is_interactable(&self) -> bool {
        false
    }

    fn as_point_giver(&self) -> Option<&dyn PointGiver> {
        None
    }

    fn as_projectile(&self) -> Option<&dyn Projectile> {
        None
    }

    fn is_active(&self) -> bool {
        self.body().active
    }
}

impl Clone for Box<dyn Entity> {
    fn clone(&self) -> Self {
        self.copy()
    }
}
