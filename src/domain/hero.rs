/// The controllable stick figure.
///
/// Input is intent-based: `move_left`/`move_right`/`stop` set the
/// horizontal intent that the next tick turns into velocity, and `jump`
/// is only honoured while the hero was supported at the end of the
/// previous tick.

use log::warn;

use super::capability::{Moving, TickContext};
use super::entity::{Body, Entity, EntityKind, Facing, Layer};
use super::observer::Outbox;
use super::physics;
use crate::sim::event::GameEvent;

pub const MOVE_SPEED: f64 = 2.5;
pub const JUMP_SPEED: f64 = 8.5;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HeroSize {
    Tiny,
    Normal,
    Large,
    Giant,
}

impl HeroSize {
    /// Parse a size tag; unknown tags fall back to `Normal`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "tiny" => HeroSize::Tiny,
            "normal" => HeroSize::Normal,
            "large" => HeroSize::Large,
            "giant" => HeroSize::Giant,
            other => {
                warn!("unknown hero size {other:?}, using normal");
                HeroSize::Normal
            }
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            HeroSize::Tiny => "tiny",
            HeroSize::Normal => "normal",
            HeroSize::Large => "large",
            HeroSize::Giant => "giant",
        }
    }

    /// `(height, width)` in pixels.
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            HeroSize::Tiny => (24.0, 12.0),
            HeroSize::Normal => (36.0, 18.0),
            HeroSize::Large => (48.0, 24.0),
            HeroSize::Giant => (60.0, 30.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Hero {
    body: Body,
    size: HeroSize,
    vx: f64,
    vy: f64,
    facing: Facing,
    intent: Option<Facing>,
    grounded: bool,
    upgraded: bool,
}

impl Hero {
    /// A hero standing on the floor at `x`.
    pub fn new(x: f64, floor_height: f64, size: HeroSize) -> Self {
        let (height, width) = size.dimensions();
        Hero {
            body: Body::new(x, floor_height - height, width, height, Layer::Foreground),
            size,
            vx: 0.0,
            vy: 0.0,
            facing: Facing::Right,
            intent: None,
            grounded: true,
            upgraded: false,
        }
    }

    pub fn size(&self) -> HeroSize {
        self.size
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn is_left_facing(&self) -> bool {
        self.facing == Facing::Left
    }

    pub fn upgraded(&self) -> bool {
        self.upgraded
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn jump(&mut self) -> bool {
        if !self.body.active || !self.grounded {
            return false;
        }
        self.vy = -JUMP_SPEED;
        self.grounded = false;
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.steer(Facing::Left)
    }

    pub fn move_right(&mut self) -> bool {
        self.steer(Facing::Right)
    }

    pub fn stop(&mut self) -> bool {
        if !self.body.active {
            return false;
        }
        self.intent = None;
        true
    }

    fn steer(&mut self, dir: Facing) -> bool {
        if !self.body.active {
            return false;
        }
        self.facing = dir;
        self.intent = Some(dir);
        true
    }

    /// Grant the ability to shoot.
    pub fn upgrade(&mut self, outbox: &mut Outbox) {
        if self.upgraded {
            return;
        }
        self.upgraded = true;
        self.body.notify(GameEvent::PlayerUpgraded, outbox);
    }

    /// Kill the hero. Fires `PlayerKilled` at most once.
    pub fn die(&mut self, outbox: &mut Outbox) -> bool {
        self.intent = None;
        self.vx = 0.0;
        self.body.deactivate(GameEvent::PlayerKilled, outbox)
    }
}

impl Moving for Hero {
    fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    fn tick(&mut self, ctx: &TickContext<'_>) {
        if !self.body.active {
            return;
        }

        let (y, vy) = physics::fall(&self.body.aabb(), self.vy, ctx.floor_height, ctx.solids);
        self.body.y = y;
        self.vy = vy;

        self.vx = self.intent.map_or(0.0, |dir| dir.sign() * MOVE_SPEED);
        let max_x = (ctx.level_width - self.body.width).max(0.0);
        self.body.x = (self.body.x + self.vx).clamp(0.0, max_x);

        self.grounded = physics::is_supported(&self.body.aabb(), ctx.floor_height, ctx.solids);
    }
}

impl Entity for Hero {
    fn kind(&self) -> EntityKind {
        EntityKind::Hero
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

    fn as_moving(&self) -> Option<&dyn Moving> {
        Some(self)
    }

    fn as_moving_mut(&mut self) -> Option<&mut dyn Moving> {
        Some(self)
    }
}
