/// Simple platformer physics: axis-aligned boxes, gravity, landing.
///
/// ## Coordinates
///
/// Screen convention: `x` grows rightwards, `y` grows downwards, and an
/// entity's `(x, y)` is its top-left corner. The floor is the horizontal
/// line `y = floor_height`; an entity stands on it when
/// `y + height == floor_height`.
///
/// ## Support
///
/// An entity is SUPPORTED (will not fall) when its bottom edge rests on:
///   - the floor, or
///   - the top face of an active solid entity it horizontally overlaps.
///
/// Otherwise gravity accelerates it downwards, capped at `MAX_FALL_SPEED`.
/// There is no ceiling collision: jumping through a platform from below
/// lands on top of it.

/// Downward acceleration per tick.
pub const GRAVITY: f64 = 0.35;
/// Terminal velocity per tick.
pub const MAX_FALL_SPEED: f64 = 9.0;

const EPS: f64 = 0.001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Aabb {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Aabb { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Strict overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    fn overlaps_horizontally(&self, other: &Aabb) -> bool {
        self.x < other.right() && other.x < self.right()
    }

    /// Box covering both this box and the box it was `dx` pixels ago.
    /// Used for projectile sweeps so fast bullets cannot skip thin targets.
    pub fn swept_back(&self, dx: f64) -> Aabb {
        let from = self.x - dx;
        let left = from.min(self.x);
        let right = (from + self.width).max(self.right());
        Aabb::new(left, self.y, right - left, self.height)
    }
}

/// Height of the surface under `body`: the highest solid top at or below
/// its feet, or the floor.
pub fn support_height(body: &Aabb, floor_height: f64, solids: &[Aabb]) -> f64 {
    solids
        .iter()
        .filter(|s| s.overlaps_horizontally(body) && s.y >= body.bottom() - EPS)
        .map(|s| s.y)
        .fold(floor_height, f64::min)
}

/// Is `body` resting on something?
pub fn is_supported(body: &Aabb, floor_height: f64, solids: &[Aabb]) -> bool {
    body.bottom() >= support_height(body, floor_height, solids) - EPS
}

/// Apply one tick of gravity and vertical integration.
///
/// Returns the new `(y, vy)`. A falling body that would pass through its
/// support surface is snapped on top of it with `vy = 0`.
pub fn fall(body: &Aabb, vy: f64, floor_height: f64, solids: &[Aabb]) -> (f64, f64) {
    let ground = support_height(body, floor_height, solids);
    let mut vy = vy;

    if body.bottom() < ground - EPS {
        vy = (vy + GRAVITY).min(MAX_FALL_SPEED);
    } else if vy > 0.0 {
        vy = 0.0;
    }

    let y = body.y + vy;
    if vy >= 0.0 && y + body.height >= ground {
        (ground - body.height, 0.0)
    } else {
        (y, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_excludes_touching_edges() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(10.0, 0.0, 10.0, 10.0);
        let c = Aabb::new(9.0, 9.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn resting_on_floor_stays_put() {
        let body = Aabb::new(0.0, 70.0, 10.0, 30.0);
        let (y, vy) = fall(&body, 0.0, 100.0, &[]);
        assert_eq!(y, 70.0);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn airborne_body_accelerates() {
        let body = Aabb::new(0.0, 0.0, 10.0, 30.0);
        let (y, vy) = fall(&body, 0.0, 100.0, &[]);
        assert!((vy - GRAVITY).abs() < 1e-9);
        assert!((y - GRAVITY).abs() < 1e-9);
    }

    #[test]
    fn falling_body_lands_on_floor_without_sinking() {
        let body = Aabb::new(0.0, 68.0, 10.0, 30.0);
        let (y, vy) = fall(&body, 5.0, 100.0, &[]);
        assert_eq!(y, 70.0);
        assert_eq!(vy, 0.0);
    }

    #[test]
    fn lands_on_platform_it_overlaps() {
        let platform = Aabb::new(0.0, 50.0, 40.0, 10.0);
        let body = Aabb::new(5.0, 18.0, 10.0, 30.0);
        let (y, vy) = fall(&body, 4.0, 100.0, &[platform]);
        assert_eq!(y, 20.0);
        assert_eq!(vy, 0.0);
        assert!(is_supported(&Aabb::new(5.0, 20.0, 10.0, 30.0), 100.0, &[platform]));
    }

    #[test]
    fn platform_beside_body_gives_no_support() {
        let platform = Aabb::new(100.0, 50.0, 40.0, 10.0);
        let body = Aabb::new(5.0, 20.0, 10.0, 30.0);
        assert!(!is_supported(&body, 100.0, &[platform]));
    }

    #[test]
    fn rising_body_keeps_its_velocity_sign() {
        let body = Aabb::new(0.0, 70.0, 10.0, 30.0);
        let (y, vy) = fall(&body, -8.0, 100.0, &[]);
        assert!(vy < 0.0);
        assert!(y < 70.0);
    }

    #[test]
    fn sweep_covers_previous_position() {
        let now = Aabb::new(20.0, 0.0, 6.0, 6.0);
        let swept = now.swept_back(6.0);
        assert_eq!(swept.x, 14.0);
        assert_eq!(swept.width, 12.0);
        let left = Aabb::new(20.0, 0.0, 6.0, 6.0).swept_back(-6.0);
        assert_eq!(left.x, 20.0);
        assert_eq!(left.width, 12.0);
    }
}
