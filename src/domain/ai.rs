/// Enemy movement strategies.
///
/// A strategy only chooses horizontal velocity. The slime reverses its
/// direction whenever the chosen speed is (almost) zero, so a patrol that
/// reaches the end of its range returns 0.0 for one tick and turns round.
///
/// No randomness: the same layout always produces the same motion.

use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Strategy {
    /// Walk up to `range` pixels either side of the spawn point.
    Patrol { speed: f64, range: f64 },
    /// Walk toward the hero's x.
    Chase { speed: f64 },
    Idle,
}

/// Strategy tag as written in level files.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Patrol,
    Chase,
    Idle,
}

impl Strategy {
    pub fn from_kind(kind: StrategyKind, speed: f64, range: f64) -> Self {
        match kind {
            StrategyKind::Patrol => Strategy::Patrol { speed, range },
            StrategyKind::Chase => Strategy::Chase { speed },
            StrategyKind::Idle => Strategy::Idle,
        }
    }

    /// Horizontal velocity for this tick.
    pub fn think(&self, x: f64, spawn_x: f64, left: bool, hero_x: f64) -> f64 {
        match *self {
            Strategy::Patrol { speed, range } => {
                let at_end = if left { x <= spawn_x - range } else { x >= spawn_x + range };
                if at_end {
                    0.0
                } else if left {
                    -speed
                } else {
                    speed
                }
            }
            Strategy::Chase { speed } => {
                let gap = hero_x - x;
                if gap.abs() <= speed {
                    0.0
                } else {
                    speed * gap.signum()
                }
            }
            Strategy::Idle => 0.0,
        }
    }
}
