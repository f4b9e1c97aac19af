use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

pub const MIN_COUNT: usize = 10;
pub const MAX_COUNT: usize = 50;
const COUNT_STEP: i32 = 5;

/// One falling petal. Purely cosmetic; spawned with random lane, size class,
/// sway and fall duration, and discarded once its fall completes.
struct Petal {
    born: Instant,
    delay_secs: f32, // 0-5
    fall_secs: f32,  // 15-40
    lane: f32,       // Horizontal start, fraction of width
    sway: f32,       // Sideways amplitude in px
    phase: f32,
    radius: f32,
    white: bool,
}

/// A petal's current place on screen, handed to the renderer.
pub struct PetalPos {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub white: bool,
    pub opacity: f32,
}

impl Petal {
    fn spawn(rng: &mut SmallRng, now: Instant) -> Self {
        // Three size classes, like the original's small/regular/large.
        let radius = match rng.gen_range(0..3) {
            0 => 3.0,
            1 => 4.5,
            _ => 6.5,
        };
        Self {
            born: now,
            delay_secs: rng.gen_range(0.0..5.0),
            fall_secs: rng.gen_range(15.0..40.0),
            lane: rng.gen_range(0.0..1.0),
            sway: rng.gen_range(10.0..45.0),
            phase: rng.gen_range(0.0..std::f32::consts::TAU),
            radius,
            white: rng.gen_bool(0.3),
        }
    }

    /// Fall progress in [0, 1], or None outside the petal's lifetime.
    fn progress(&self, now: Instant) -> Option<f32> {
        let elapsed = now.duration_since(self.born).as_secs_f32() - self.delay_secs;
        if elapsed < 0.0 {
            return None;
        }
        let p = elapsed / self.fall_secs;
        (p <= 1.0).then_some(p)
    }

    fn expired(&self, now: Instant) -> bool {
        let elapsed = now.duration_since(self.born).as_secs_f32();
        elapsed > self.delay_secs + self.fall_secs
    }

    fn position(&self, now: Instant, width: f32, height: f32) -> Option<PetalPos> {
        let p = self.progress(now)?;
        let y = p * (height + 2.0 * self.radius) - self.radius;
        let wobble = (self.phase + p * std::f32::consts::TAU * 2.0).sin();
        let x = self.lane * width + wobble * self.sway;
        // Fade in quickly, fade out over the last stretch of the fall.
        let opacity = (p * 12.0).min(1.0).min((1.0 - p) * 6.0).clamp(0.0, 1.0);
        Some(PetalPos {
            x,
            y,
            radius: self.radius,
            white: self.white,
            opacity,
        })
    }
}

/// The decorative effect state: a self-replenishing set of petals topped up
/// by a recurring timer, independent of the catalog and filter state.
pub struct BlossomField {
    petals: Vec<Petal>,
    active: bool,
    count: usize,
    rng: SmallRng,
}

impl BlossomField {
    pub fn new(active: bool, count: usize) -> Self {
        let mut field = Self {
            petals: Vec::new(),
            active,
            count: count.clamp(MIN_COUNT, MAX_COUNT),
            rng: SmallRng::from_entropy(),
        };
        if field.active {
            field.fill();
        }
        field
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Turning the effect off clears the field immediately; turning it back
    /// on refills to the target count.
    pub fn toggle(&mut self) {
        self.active = !self.active;
        self.petals.clear();
        if self.active {
            self.fill();
        }
    }

    /// Steps the target count by one notch, clamped to [MIN_COUNT, MAX_COUNT].
    pub fn adjust_count(&mut self, direction: i32) {
        let next = self.count as i32 + direction.signum() * COUNT_STEP;
        self.count = (next.max(0) as usize).clamp(MIN_COUNT, MAX_COUNT);
        if self.petals.len() > self.count {
            self.petals.truncate(self.count);
        }
    }

    /// Timer tick: drop finished petals and spawn one replacement if below
    /// the target, mirroring the original's 500 ms interval.
    pub fn top_up(&mut self) {
        if !self.active {
            return;
        }
        let now = Instant::now();
        self.petals.retain(|p| !p.expired(now));
        if self.petals.len() < self.count {
            self.petals.push(Petal::spawn(&mut self.rng, now));
        }
    }

    fn fill(&mut self) {
        let now = Instant::now();
        while self.petals.len() < self.count {
            self.petals.push(Petal::spawn(&mut self.rng, now));
        }
    }

    /// Current on-screen petal positions.
    pub fn positions(&self, now: Instant, width: f32, height: f32) -> Vec<PetalPos> {
        if !self.active {
            return Vec::new();
        }
        self.petals
            .iter()
            .filter_map(|p| p.position(now, width, height))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn count_adjustment_clamps_to_bounds() {
        let mut field = BlossomField::new(true, 50);
        field.adjust_count(1);
        assert_eq!(field.count(), 50);

        let mut field = BlossomField::new(true, 10);
        field.adjust_count(-1);
        assert_eq!(field.count(), 10);

        let mut field = BlossomField::new(true, 25);
        field.adjust_count(1);
        assert_eq!(field.count(), 30);
        field.adjust_count(-1);
        assert_eq!(field.count(), 25);
    }

    #[test]
    fn initial_count_is_clamped_too() {
        assert_eq!(BlossomField::new(true, 500).count(), 50);
        assert_eq!(BlossomField::new(true, 0).count(), 10);
    }

    #[test]
    fn toggling_off_clears_and_hides_petals() {
        let mut field = BlossomField::new(true, 25);
        assert!(field.active());
        field.toggle();
        assert!(!field.active());
        assert!(field.positions(Instant::now(), 800.0, 600.0).is_empty());

        // Top-up is a no-op while inactive.
        field.top_up();
        assert!(field.positions(Instant::now(), 800.0, 600.0).is_empty());
    }

    #[test]
    fn top_up_never_exceeds_the_target() {
        let mut field = BlossomField::new(true, 10);
        for _ in 0..100 {
            field.top_up();
        }
        assert!(field.petals.len() <= 10);
    }

    #[test]
    fn inactive_field_starts_empty() {
        let field = BlossomField::new(false, 25);
        assert!(field.petals.is_empty());
    }
}
