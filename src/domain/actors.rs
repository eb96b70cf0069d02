/// Every non-hero entity type a level can contain.
///
/// | type     | moving | interactable | points | solid |
/// |----------|--------|--------------|--------|-------|
/// | Slime    | yes    | kills hero   | 100    |       |
/// | Mushroom |        | upgrades     | 50     |       |
/// | Flag     |        | wins level   |        |       |
/// | Platform |        |              |        | yes   |
/// | Cloud    | yes    |              |        |       |
/// | Bullet   | yes (projectile)      |        |       |
/// | Marker   |        |              |        |       |

use super::ai::Strategy;
use super::capability::{Interactable, Moving, PointGiver, Projectile, TickContext};
use super::entity::{Body, Entity, EntityKind, Facing, Layer};
use super::hero::Hero;
use super::observer::Outbox;
use super::physics::{self, Aabb};
use crate::sim::event::GameEvent;

pub const SLIME_POINTS: u32 = 100;
pub const MUSHROOM_POINTS: u32 = 50;
pub const BULLET_SPEED: f64 = 6.0;
pub const BULLET_SIZE: f64 = 6.0;

/// Below this speed a slime turns round.
const TURN_THRESHOLD: f64 = 0.05;

macro_rules! entity_basics {
    ($kind:expr) => {
        fn kind(&self) -> EntityKind {
            $kind
        }

        fn body(&self) -> &Body {
            &self.body
        }

        fn body_mut(&mut self) -> &mut Body {
            &mut self.body
        }

        fn copy(&self) -> Box<dyn Entity> {
            Box::new(self.clone())
        }
    };
}

// ── Slime ──

#[derive(Clone, Debug)]
pub struct Slime {
    body: Body,
    vx: f64,
    vy: f64,
    left: bool,
    spawn_x: f64,
    strategy: Strategy,
}

impl Slime {
    pub fn new(x: f64, y: f64, start_left: bool, strategy: Strategy) -> Self {
        Slime {
            body: Body::new(x, y, 30.0, 20.0, Layer::Foreground),
            vx: 0.0,
            vy: 0.0,
            left: start_left,
            spawn_x: x,
            strategy,
        }
    }

    pub fn is_heading_left(&self) -> bool {
        self.left
    }
}

impl Moving for Slime {
    fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    fn tick(&mut self, ctx: &TickContext<'_>) {
        let (y, vy) = physics::fall(&self.body.aabb(), self.vy, ctx.floor_height, ctx.solids);
        self.body.y = y;
        self.vy = vy;

        self.vx = self.strategy.think(self.body.x, self.spawn_x, self.left, ctx.hero_x);
        self.body.x += self.vx;

        if self.vx.abs() < TURN_THRESHOLD {
            self.left = !self.left;
        }
    }
}

impl Interactable for Slime {
    fn interact(&mut self, hero: &mut Hero, outbox: &mut Outbox) {
        if self.body.active {
            hero.die(outbox);
        }
    }
}

impl PointGiver for Slime {
    fn point_value(&self) -> u32 {
        SLIME_POINTS
    }
}

impl Entity for Slime {
    entity_basics!(EntityKind::Slime);

    fn as_moving(&self) -> Option<&dyn Moving> {
        Some(self)
    }

    fn as_moving_mut(&mut self) -> Option<&mut dyn Moving> {
        Some(self)
    }

    fn is_interactable(&self) -> bool {
        true
    }

    fn as_interactable_mut(&mut self) -> Option<&mut dyn Interactable> {
        Some(self)
    }

    fn as_point_giver(&self) -> Option<&dyn PointGiver> {
        Some(self)
    }
}

// ── Mushroom ──

#[derive(Clone, Debug)]
pub struct Mushroom {
    body: Body,
}

impl Mushroom {
    pub fn new(x: f64, y: f64) -> Self {
        Mushroom { body: Body::new(x, y, 20.0, 20.0, Layer::Foreground) }
    }
}

impl Interactable for Mushroom {
    fn interact(&mut self, hero: &mut Hero, outbox: &mut Outbox) {
        if self.body.deactivate(GameEvent::PickupCollected { kind: EntityKind::Mushroom }, outbox) {
            hero.upgrade(outbox);
        }
    }
}

impl PointGiver for Mushroom {
    fn point_value(&self) -> u32 {
        MUSHROOM_POINTS
    }
}

impl Entity for Mushroom {
    entity_basics!(EntityKind::Mushroom);

    fn is_interactable(&self) -> bool {
        true
    }

    fn as_interactable_mut(&mut self) -> Option<&mut dyn Interactable> {
        Some(self)
    }

    fn as_point_giver(&self) -> Option<&dyn PointGiver> {
        Some(self)
    }
}

// ── Flag ──

#[derive(Clone, Debug)]
pub struct Flag {
    body: Body,
    reached: bool,
}

impl Flag {
    pub fn new(x: f64, y: f64) -> Self {
        Flag { body: Body::new(x, y, 20.0, 40.0, Layer::Foreground), reached: false }
    }
}

impl Interactable for Flag {
    fn interact(&mut self, hero: &mut Hero, outbox: &mut Outbox) {
        if self.reached || !self.body.active || !hero.is_active() {
            return;
        }
        self.reached = true;
        self.body.notify(GameEvent::GoalReached, outbox);
    }
}

impl Entity for Flag {
    entity_basics!(EntityKind::Flag);

    fn is_interactable(&self) -> bool {
        true
    }

    fn as_interactable_mut(&mut self) -> Option<&mut dyn Interactable> {
        Some(self)
    }
}

// ── Platform ──

#[derive(Clone, Debug)]
pub struct Platform {
    body: Body,
}

impl Platform {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Platform { body: Body::new(x, y, width, height, Layer::Foreground) }
    }
}

impl Entity for Platform {
    entity_basics!(EntityKind::Platform);

    fn is_solid(&self) -> bool {
        true
    }
}

// ── Cloud ──

#[derive(Clone, Debug)]
pub struct Cloud {
    body: Body,
    vx: f64,
}

impl Cloud {
    pub fn new(x: f64, y: f64, speed: f64) -> Self {
        Cloud { body: Body::new(x, y, 60.0, 20.0, Layer::Background), vx: speed }
    }
}

impl Moving for Cloud {
    fn velocity(&self) -> (f64, f64) {
        (self.vx, 0.0)
    }

    fn tick(&mut self, ctx: &TickContext<'_>) {
        self.body.x += self.vx;
        if self.body.x > ctx.level_width {
            self.body.x = -self.body.width;
        } else if self.body.x + self.body.width < 0.0 {
            self.body.x = ctx.level_width;
        }
    }
}

impl Entity for Cloud {
    entity_basics!(EntityKind::Cloud);

    fn as_moving(&self) -> Option<&dyn Moving> {
        Some(self)
    }

    fn as_moving_mut(&mut self) -> Option<&mut dyn Moving> {
        Some(self)
    }
}

// ── Bullet ──

#[derive(Clone, Debug)]
pub struct Bullet {
    body: Body,
    vx: f64,
}

impl Bullet {
    pub fn new(x: f64, y: f64, facing: Facing) -> Self {
        Bullet {
            body: Body::new(x, y, BULLET_SIZE, BULLET_SIZE, Layer::Foreground),
            vx: facing.sign() * BULLET_SPEED,
        }
    }
}

impl Moving for Bullet {
    fn velocity(&self) -> (f64, f64) {
        (self.vx, 0.0)
    }

    fn tick(&mut self, ctx: &TickContext<'_>) {
        self.body.x += self.vx;
        if self.body.x + self.body.width < 0.0 || self.body.x > ctx.level_width {
            self.body.active = false;
        }
    }
}

impl Projectile for Bullet {
    fn sweep_box(&self) -> Aabb {
        self.body.aabb().swept_back(self.vx)
    }
}

impl Entity for Bullet {
    entity_basics!(EntityKind::Bullet);

    fn as_moving(&self) -> Option<&dyn Moving> {
        Some(self)
    }

    fn as_moving_mut(&mut self) -> Option<&mut dyn Moving> {
        Some(self)
    }

    fn as_projectile(&self) -> Option<&dyn Projectile> {
        Some(self)
    }
}

// ── Win / Lose markers ──

/// Visual-only banner dropped when a level ends.
#[derive(Clone, Debug)]
pub struct Marker {
    body: Body,
    won: bool,
}

impl Marker {
    pub fn win(x: f64, y: f64) -> Self {
        Marker { body: Body::new(x, y, 400.0, 400.0, Layer::Effect), won: true }
    }

    pub fn lose(x: f64, y: f64) -> Self {
        Marker { body: Body::new(x, y, 400.0, 400.0, Layer::Effect), won: false }
    }
}

impl Entity for Marker {
    fn kind(&self) -> EntityKind {
        if self.won { EntityKind::WinMarker } else { EntityKind::LoseMarker }
    }

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn copy(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hero::HeroSize;
    use crate::domain::observer::Subscriber;

    fn ctx() -> TickContext<'static> {
        TickContext { hero_x: 0.0, floor_height: 300.0, level_width: 500.0, solids: &[] }
    }

    fn hero() -> Hero {
        let mut h = Hero::new(100.0, 300.0, HeroSize::Normal);
        h.body_mut().observers.attach(Subscriber::Owner);
        h
    }

    #[test]
    fn slime_kills_on_contact() {
        let mut slime = Slime::new(100.0, 280.0, true, Strategy::Idle);
        let mut h = hero();
        let mut outbox = Outbox::new();
        assert!(slime.check_collide(h.body()));
        slime.interact(&mut h, &mut outbox);
        assert!(!h.is_active());
        assert_eq!(outbox, vec![GameEvent::PlayerKilled]);
    }

    #[test]
    fn slime_turns_at_end_of_patrol() {
        let mut slime = Slime::new(100.0, 280.0, true, Strategy::Patrol { speed: 5.0, range: 5.0 });
        slime.tick(&ctx());
        assert_eq!(slime.body().x, 95.0);
        assert!(slime.is_heading_left());
        slime.tick(&ctx());
        assert_eq!(slime.body().x, 95.0);
        assert!(!slime.is_heading_left());
        slime.tick(&ctx());
        assert_eq!(slime.body().x, 100.0);
    }

    #[test]
    fn mushroom_fires_once() {
        let mut mushroom = Mushroom::new(100.0, 280.0);
        mushroom.body_mut().observers.attach(Subscriber::Owner);
        let mut h = hero();
        let mut outbox = Outbox::new();

        mushroom.interact(&mut h, &mut outbox);
        mushroom.interact(&mut h, &mut outbox);

        assert!(!mushroom.is_active());
        assert!(h.upgraded());
        assert_eq!(
            outbox,
            vec![
                GameEvent::PickupCollected { kind: EntityKind::Mushroom },
                GameEvent::PlayerUpgraded,
            ]
        );
        assert!(!mushroom.check_collide(h.body()));
    }

    #[test]
    fn flag_ignores_dead_hero() {
        let mut flag = Flag::new(100.0, 260.0);
        flag.body_mut().observers.attach(Subscriber::Owner);
        let mut h = hero();
        let mut outbox = Outbox::new();
        h.die(&mut outbox);
        outbox.clear();

        flag.interact(&mut h, &mut outbox);
        assert!(outbox.is_empty());
    }

    #[test]
    fn flag_reports_goal_once() {
        let mut flag = Flag::new(100.0, 260.0);
        flag.body_mut().observers.attach(Subscriber::Owner);
        let mut h = hero();
        let mut outbox = Outbox::new();
        flag.interact(&mut h, &mut outbox);
        flag.interact(&mut h, &mut outbox);
        assert_eq!(outbox, vec![GameEvent::GoalReached]);
    }

    #[test]
    fn bullet_expires_outside_level() {
        let mut bullet = Bullet::new(496.0, 100.0, Facing::Right);
        bullet.tick(&ctx());
        assert!(!bullet.is_active());

        let mut back = Bullet::new(2.0, 100.0, Facing::Left);
        back.tick(&ctx());
        assert!(back.is_active());
        back.tick(&ctx());
        assert!(!back.is_active());
    }

    #[test]
    fn bullet_sweep_finds_first_target() {
        use crate::domain::entity::EntityId;
        let mut bullet = Bullet::new(0.0, 10.0, Facing::Right);
        bullet.tick(&ctx());
        let targets = [
            (EntityId(7), Aabb::new(100.0, 0.0, 10.0, 30.0)),
            (EntityId(3), Aabb::new(2.0, 0.0, 3.0, 30.0)),
        ];
        assert_eq!(bullet.first_hit(&targets), Some(EntityId(3)));
    }

    #[test]
    fn cloud_wraps_around() {
        let mut cloud = Cloud::new(499.0, 10.0, 2.0);
        cloud.tick(&ctx());
        assert_eq!(cloud.body().x, -60.0);
    }

    #[test]
    fn copy_keeps_state() {
        let mut slime = Slime::new(10.0, 20.0, false, Strategy::Idle);
        slime.body_mut().active = false;
        let copy = slime.copy();
        assert_eq!(copy.kind(), EntityKind::Slime);
        assert!(!copy.is_active());
        assert_eq!(copy.body().x, 10.0);
        assert_eq!(Marker::lose(0.0, 0.0).kind(), EntityKind::LoseMarker);
    }
}
