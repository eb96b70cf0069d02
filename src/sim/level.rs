/// Level: owner of one scene's entity graph.
///
/// ## Views
///
/// Entities live in a single store keyed by `EntityId`. Four ordered views
/// index into it:
///   - `entities`      : everything, in insertion order (the hero included)
///   - `moving`        : entities with the `Moving` capability
///   - `interactables` : entities with the `Interactable` capability
///   - `projectiles`   : entities with the `Projectile` capability
///
/// Every view is derived from capabilities when an entity is placed, so a
/// view is always `entities` filtered by one capability. The hero is not
/// in the store; it is a typed field addressed as `EntityId::HERO`.
///
/// ## Observers
///
/// The level subscribes as `Owner` to every entity it adopts; their
/// notices come back through the tick's notice queue (see `step.rs`).
/// The level's own subscribers receive level events: `Owner` events are
/// queued for the controller (`take_events`), `Shared` listeners are
/// called immediately.
///
/// ## Copy protocol
///
/// `copy()` produces a level that shares nothing mutable with `self`:
///   1. clone every non-hero entity through its own `copy()`
///   2. re-partition the clones by inspecting their capabilities
///   3. clone the hero separately and subscribe the new level to it
///   4. carry over score and active flag
///   5. re-attach the same subscriber handles (shared, not cloned)

use std::collections::HashMap;

use log::debug;

use crate::domain::capability::{PointReceiver, Score};
use crate::domain::entity::{Entity, EntityId};
use crate::domain::hero::{Hero, HeroSize};
use crate::domain::observer::{Observers, Outbox, Subscriber};
use crate::sim::event::GameEvent;

pub const DEFAULT_TARGET_SECONDS: u64 = 30;

/// Static facts about a level, as built from its description.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelMeta {
    /// Name the level was loaded from; `reset` rebuilds from it.
    pub source: String,
    pub height: f64,
    pub width: f64,
    pub floor_height: f64,
    pub hero_x: f64,
    pub hero_size: HeroSize,
    pub target_seconds: u64,
}

#[derive(Debug)]
pub struct Level {
    pub(super) meta: LevelMeta,
    pub(super) hero: Hero,
    pub(super) store: HashMap<EntityId, Box<dyn Entity>>,
    pub(super) entities: Vec<EntityId>,
    pub(super) moving: Vec<EntityId>,
    pub(super) interactables: Vec<EntityId>,
    pub(super) projectiles: Vec<EntityId>,
    pub(super) next_id: u32,
    pub(super) score: Score,
    pub(super) active: bool,
    pub(super) observers: Observers,
    pub(super) events: Outbox,
}

// ── Construction ──

impl Level {
    /// Adopt `entities` in order, then place a fresh hero at `meta.hero_x`.
    pub fn new(meta: LevelMeta, entities: Vec<Box<dyn Entity>>) -> Self {
        let mut hero = Hero::new(meta.hero_x, meta.floor_height, meta.hero_size);
        hero.body_mut().observers.attach(Subscriber::Owner);

        let mut level = Level {
            meta,
            hero,
            store: HashMap::with_capacity(entities.len()),
            entities: Vec::with_capacity(entities.len() + 1),
            moving: vec![],
            interactables: vec![],
            projectiles: vec![],
            next_id: EntityId::HERO.0 + 1,
            score: Score::default(),
            active: true,
            observers: Observers::new(),
            events: Outbox::new(),
        };

        for entity in entities {
            level.adopt(entity);
        }
        level.place(EntityId::HERO);
        level
    }

    /// Add an entity while the level runs (bullets, markers).
    pub fn spawn(&mut self, entity: Box<dyn Entity>) -> EntityId {
        self.adopt(entity)
    }

    fn adopt(&mut self, mut entity: Box<dyn Entity>) -> EntityId {
        entity.body_mut().observers.attach(Subscriber::Owner);
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.store.insert(id, entity);
        self.place(id);
        id
    }

    /// Append `id` to every view its capabilities call for.
    fn place(&mut self, id: EntityId) {
        let (moving, interactable, projectile) = match self.entity(id) {
            Some(e) => (e.as_moving().is_some(), e.is_interactable(), e.as_projectile().is_some()),
            None => {
                debug!("place: no entity for {id:?}");
                return;
            }
        };
        self.entities.push(id);
        if moving {
            self.moving.push(id);
        }
        if interactable {
            self.interactables.push(id);
        }
        if projectile {
            self.projectiles.push(id);
        }
    }

    /// Deep copy; see the module docs for the protocol.
    pub fn copy(&self) -> Level {
        let mut level = Level {
            meta: self.meta.clone(),
            hero: self.hero.clone(),
            store: HashMap::with_capacity(self.store.len()),
            entities: Vec::with_capacity(self.entities.len()),
            moving: Vec::with_capacity(self.moving.len()),
            interactables: Vec::with_capacity(self.interactables.len()),
            projectiles: Vec::with_capacity(self.projectiles.len()),
            next_id: self.next_id,
            score: Score::default(),
            active: true,
            observers: Observers::new(),
            events: Outbox::new(),
        };

        for &id in &self.entities {
            if id == EntityId::HERO {
                level.place(id);
                continue;
            }
            match self.store.get(&id) {
                Some(entity) => {
                    level.store.insert(id, entity.copy());
                    level.place(id);
                }
                None => debug!("copy: no entity for {id:?}"),
            }
        }

        level.hero.body_mut().observers.attach(Subscriber::Owner);
        if !level.entities.contains(&EntityId::HERO) {
            level.place(EntityId::HERO);
        }

        level.score = self.score;
        level.active = self.active;
        level.observers = self.observers.clone();
        level
    }
}

impl Clone for Level {
    fn clone(&self) -> Self {
        self.copy()
    }
}

// ── Queries ──

impl Level {
    pub fn source(&self) -> &str {
        &self.meta.source
    }

    pub fn meta(&self) -> &LevelMeta {
        &self.meta
    }

    pub fn height(&self) -> f64 {
        self.meta.height
    }

    pub fn width(&self) -> f64 {
        self.meta.width
    }

    pub fn floor_height(&self) -> f64 {
        self.meta.floor_height
    }

    pub fn target_seconds(&self) -> u64 {
        self.meta.target_seconds
    }

    /// Still running (not yet won or lost)?
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn hero(&self) -> &Hero {
        &self.hero
    }

    pub fn hero_mut(&mut self) -> &mut Hero {
        &mut self.hero
    }

    pub fn hero_x(&self) -> f64 {
        self.hero.body().x
    }

    pub fn hero_y(&self) -> f64 {
        self.hero.body().y
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        if id == EntityId::HERO {
            Some(&self.hero)
        } else {
            self.store.get(&id).map(|e| e.as_ref())
        }
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut (dyn Entity + 'static)> {
        if id == EntityId::HERO {
            Some(&mut self.hero)
        } else {
            self.store.get_mut(&id).map(|e| e.as_mut())
        }
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> + '_ {
        self.entities.iter().filter_map(move |&id| self.entity(id).map(|e| (id, e)))
    }

    pub fn entity_ids(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn moving_ids(&self) -> &[EntityId] {
        &self.moving
    }

    pub fn interactable_ids(&self) -> &[EntityId] {
        &self.interactables
    }

    pub fn projectile_ids(&self) -> &[EntityId] {
        &self.projectiles
    }
}

// ── Hero input ──

impl Level {
    pub fn jump(&mut self) -> bool {
        self.active && self.hero.jump()
    }

    pub fn move_left(&mut self) -> bool {
        self.active && self.hero.move_left()
    }

    pub fn move_right(&mut self) -> bool {
        self.active && self.hero.move_right()
    }

    pub fn stop_moving(&mut self) -> bool {
        self.active && self.hero.stop()
    }
}

// ── Subject ──

impl Level {
    pub fn attach(&mut self, subscriber: Subscriber) {
        self.observers.attach(subscriber);
    }

    pub fn detach(&mut self, subscriber: &Subscriber) {
        self.observers.detach(subscriber);
    }

    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    pub fn notify_observers(&mut self, event: GameEvent) {
        self.observers.notify(&event, &mut self.events);
    }

    /// Drain events queued for the `Owner` subscriber.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl PointReceiver for Level {
    fn current_point(&self) -> u32 {
        self.score.current_point()
    }

    fn absorb_point(&mut self, point: u32) {
        self.score.absorb_point(point);
    }
}
