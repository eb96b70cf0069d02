/// One simulation tick of a level.
///
/// ## Phase order
///
///   1. advance every active moving entity (hero included)
///   2. hero vs interactables, stopping as soon as the hero dies
///   3. projectiles vs moving targets: projectile and target both die
///   4. projectiles vs static foreground: only the projectile dies
///   5. feed the collected notices through `update`, which forwards them
///      to the level's observers and harvests points from dead givers
///   6. drop inactive entities from every view and the store
///
/// Entities never reach back into the level during a phase. Anything they
/// report lands in the tick's notice queue and is handled in phase 5,
/// after all phases that borrow the views have finished. Points are
/// harvested before pruning so a dead giver is always counted.

use std::collections::HashSet;

use log::{debug, info};

use crate::domain::actors::{Bullet, Marker};
use crate::domain::capability::{Projectile, TickContext};
use crate::domain::entity::{Entity, EntityId, Layer};
use crate::domain::observer::Outbox;
use crate::domain::physics::Aabb;
use crate::sim::event::GameEvent;
use crate::sim::level::Level;

/// Marker offsets from the hero's position.
const WIN_MARKER_OFFSET: (f64, f64) = (-200.0, -200.0);
const LOSE_MARKER_OFFSET: (f64, f64) = (0.0, -200.0);

impl Level {
    pub fn tick(&mut self) {
        if !self.active {
            return;
        }

        self.advance_moving();

        let mut notices = Outbox::new();
        self.resolve_interactions(&mut notices);
        self.resolve_projectile_hits(&mut notices);
        self.resolve_projectile_blocks(&mut notices);

        for notice in notices {
            self.update(&notice);
        }

        self.clear_out_inactive();
    }

    // ── Phase 1: movement ──

    fn advance_moving(&mut self) {
        let solids: Vec<Aabb> = self
            .entities()
            .filter(|(_, e)| e.is_active() && e.is_solid())
            .map(|(_, e)| e.body().aabb())
            .collect();
        let ctx = TickContext {
            hero_x: self.hero.body().x,
            floor_height: self.meta.floor_height,
            level_width: self.meta.width,
            solids: &solids,
        };

        for id in &self.moving {
            let entity: &mut (dyn Entity + 'static) = if *id == EntityId::HERO {
                &mut self.hero
            } else {
                match self.store.get_mut(id) {
                    Some(e) => e.as_mut(),
                    None => {
                        debug!("advance: no entity for {id:?}");
                        continue;
                    }
                }
            };
            if !entity.is_active() {
                continue;
            }
            if let Some(moving) = entity.as_moving_mut() {
                moving.tick(&ctx);
            }
        }
    }

    // ── Phase 2: hero vs interactables ──

    fn resolve_interactions(&mut self, notices: &mut Outbox) {
        for id in &self.interactables {
            // A dead hero touches nothing else this tick.
            if !self.hero.is_active() {
                break;
            }
            let Some(entity) = self.store.get_mut(id) else {
                continue;
            };
            let Some(interactable) = entity.as_interactable_mut() else {
                continue;
            };
            if interactable.check_collide(self.hero.body()) {
                interactable.interact(&mut self.hero, notices);
            }
        }
    }

    // ── Phases 3 and 4: projectiles ──

    fn resolve_projectile_hits(&mut self, notices: &mut Outbox) {
        for shooter in self.projectiles.clone() {
            let hit = match self.live_projectile(shooter) {
                Some(projectile) => projectile.first_hit(&self.targets(shooter, true)),
                None => continue,
            };
            if let Some(target) = hit {
                debug!("{shooter:?} hit {target:?}");
                self.destroy(shooter, notices);
                self.destroy(target, notices);
            }
        }
    }

    fn resolve_projectile_blocks(&mut self, notices: &mut Outbox) {
        for shooter in self.projectiles.clone() {
            let blocked = match self.live_projectile(shooter) {
                Some(projectile) => projectile.first_hit(&self.targets(shooter, false)).is_some(),
                None => continue,
            };
            if blocked {
                self.destroy(shooter, notices);
            }
        }
    }

    fn live_projectile(&self, id: EntityId) -> Option<&dyn Projectile> {
        self.store
            .get(&id)
            .filter(|e| e.is_active())
            .and_then(|e| e.as_projectile())
    }

    /// Active foreground entities a projectile can strike: moving ones
    /// when `moving` is set, static ones otherwise. Never the hero or
    /// another projectile.
    fn targets(&self, shooter: EntityId, moving: bool) -> Vec<(EntityId, Aabb)> {
        let view = if moving { &self.moving } else { &self.entities };
        view.iter()
            .filter(|id| **id != EntityId::HERO && **id != shooter)
            .filter_map(|id| self.store.get(id).map(|e| (*id, e)))
            .filter(|(_, e)| {
                e.is_active()
                    && e.body().layer == Layer::Foreground
                    && e.as_projectile().is_none()
                    && e.as_moving().is_some() == moving
            })
            .map(|(id, e)| (id, e.body().aabb()))
            .collect()
    }

    fn destroy(&mut self, id: EntityId, notices: &mut Outbox) {
        if let Some(entity) = self.store.get_mut(&id) {
            let kind = entity.kind();
            entity.body_mut().deactivate(GameEvent::EntityDestroyed { kind }, notices);
        }
    }

    // ── Phase 5: notices ──

    /// Handle one notice from an owned entity.
    pub fn update(&mut self, event: &GameEvent) {
        match event {
            GameEvent::GoalReached => self.win(),
            other => self.notify_observers(other.clone()),
        }
        self.harvest_points();
    }

    /// Collect points from dead givers, newest first, and forget them.
    fn harvest_points(&mut self) {
        for i in (0..self.entities.len()).rev() {
            let Some(entity) = self.store.get(&self.entities[i]) else {
                continue;
            };
            if entity.is_active() {
                continue;
            }
            if let Some(giver) = entity.as_point_giver() {
                giver.give_point(&mut self.score);
                debug!("harvested {} points from {:?}", giver.point_value(), entity.kind());
                self.entities.remove(i);
            }
        }
    }

    // ── Phase 6: pruning ──

    fn clear_out_inactive(&mut self) {
        let store = &self.store;
        self.entities
            .retain(|id| *id == EntityId::HERO || store.get(id).is_some_and(|e| e.is_active()));

        let live: HashSet<EntityId> = self.entities.iter().copied().collect();
        self.moving.retain(|id| live.contains(id));
        self.interactables.retain(|id| live.contains(id));
        self.projectiles.retain(|id| live.contains(id));
        self.store.retain(|id, _| live.contains(id));
    }

    // ── Outcomes ──

    pub fn win(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let (dx, dy) = WIN_MARKER_OFFSET;
        let marker = Marker::win(self.hero_x() + dx, self.hero_y() + dy);
        self.spawn(Box::new(marker));
        info!("level {} won", self.meta.source);
        self.notify_observers(GameEvent::LevelWon);
    }

    pub fn lose(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let (dx, dy) = LOSE_MARKER_OFFSET;
        let marker = Marker::lose(self.hero_x() + dx, self.hero_y() + dy);
        self.spawn(Box::new(marker));
        info!("level {} lost", self.meta.source);
        self.notify_observers(GameEvent::LevelLost);
    }

    /// Fire a bullet from the hero's leading edge, two thirds of a width
    /// below the top. Needs an upgraded, live hero on an active level.
    pub fn shoot(&mut self) -> bool {
        if !self.active || !self.hero.is_active() || !self.hero.upgraded() {
            return false;
        }
        let body = self.hero.body();
        let x = if self.hero.is_left_facing() { body.x } else { body.x + body.width };
        let y = body.y + 2.0 * body.width / 3.0;
        let bullet = Bullet::new(x, y, self.hero.facing());
        self.spawn(Box::new(bullet));
        true
    }
}
