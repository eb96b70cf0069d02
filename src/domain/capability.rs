/// Capability traits layered onto entities.
///
/// An entity implements any combination of these. The level never looks
/// at concrete types: it asks `Entity::as_moving()`, `as_point_giver()`
/// and friends, and dispatches on what it gets back.

use super::entity::{Body, Entity, EntityId};
use super::hero::Hero;
use super::observer::Outbox;
use super::physics::Aabb;

/// World facts a moving entity may consult while advancing one tick.
#[derive(Clone, Copy, Debug)]
pub struct TickContext<'a> {
    /// Hero x at the start of the tick.
    pub hero_x: f64,
    pub floor_height: f64,
    pub level_width: f64,
    /// Active solid surfaces, captured before anything moves.
    pub solids: &'a [Aabb],
}

pub trait Moving {
    fn velocity(&self) -> (f64, f64);

    /// Gravity, vertical integration, horizontal intent, horizontal integration.
    fn tick(&mut self, ctx: &TickContext<'_>);
}

/// One-shot effect on the hero when their boxes overlap.
///
/// Implementations must be safe to call repeatedly: once the effect has
/// fired, later calls do nothing.
pub trait Interactable: Entity {
    fn check_collide(&self, hero: &Body) -> bool {
        self.is_active() && self.body().overlaps(hero)
    }

    fn interact(&mut self, hero: &mut Hero, outbox: &mut Outbox);
}

pub trait PointReceiver {
    fn current_point(&self) -> u32;
    fn absorb_point(&mut self, point: u32);
}

pub trait PointGiver {
    fn point_value(&self) -> u32;

    fn give_point(&self, receiver: &mut dyn PointReceiver) {
        receiver.absorb_point(self.point_value());
    }
}

pub trait Projectile {
    /// Area covered since the previous tick.
    fn sweep_box(&self) -> Aabb;

    /// First target, in list order, the sweep touches.
    fn first_hit(&self, targets: &[(EntityId, Aabb)]) -> Option<EntityId> {
        let sweep = self.sweep_box();
        targets
            .iter()
            .find(|(_, target)| sweep.overlaps(target))
            .map(|(id, _)| *id)
    }
}

/// Plain score accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score(pub u32);

impl PointReceiver for Score {
    fn current_point(&self) -> u32 {
        self.0
    }

    fn absorb_point(&mut self, point: u32) {
        self.0 = self.0.saturating_add(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Coin(u32);

    impl PointGiver for Coin {
        fn point_value(&self) -> u32 {
            self.0
        }
    }

    #[test]
    fn give_point_deposits_value() {
        let mut score = Score::default();
        Coin(50).give_point(&mut score);
        Coin(100).give_point(&mut score);
        assert_eq!(score.current_point(), 150);
    }

    #[test]
    fn score_saturates() {
        let mut score = Score(u32::MAX - 1);
        score.absorb_point(10);
        assert_eq!(score.current_point(), u32::MAX);
    }
}
