//! Repetition counting.
//!
//! A [`RepetitionTracker`] consumes one completion percentage per frame. Each time the percentage
//! reaches the end of the range of motion that the limb is currently moving towards, half a
//! repetition is counted and the direction flips.
//!
//! By default, "reaching the end" means the percentage is *exactly* 100 (while extending) or
//! exactly 0 (while contracting). This relies on the percentage being clamped upstream; a noisy
//! signal that never settles on the exact boundary values will not be counted. A tolerance band
//! can be enabled with [`Thresholds::tolerance`].

use std::fmt;

/// The half of the repetition cycle the tracked limb is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Moving towards 100%.
    #[default]
    Extending = 0,
    /// Moving back towards 0%.
    Contracting = 1,
}

/// Repetition count and current direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepState {
    half_reps: u32,
    direction: Direction,
}

impl RepState {
    /// Returns the number of half-repetitions counted so far.
    #[inline]
    pub fn half_reps(&self) -> u32 {
        self.half_reps
    }

    /// Returns the repetition count, in steps of 0.5.
    #[inline]
    pub fn count(&self) -> f32 {
        self.half_reps as f32 / 2.0
    }

    /// Returns the number of completed repetitions (the count rounded down).
    #[inline]
    pub fn reps(&self) -> u32 {
        self.half_reps / 2
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Display for RepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} reps ({:?})", self.count(), self.direction)
    }
}

/// Percentage bands that count as reaching either end of the range of motion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thresholds {
    tolerance: f32,
}

impl Thresholds {
    /// Requires the percentage to be exactly 100 or exactly 0.
    pub const EXACT: Self = Self { tolerance: 0.0 };

    /// Accepts percentages in `100 - tolerance ..= 100` and `0 ..= tolerance` as boundary hits.
    ///
    /// Percentages outside of 0 to 100 never count, regardless of tolerance.
    ///
    /// # Panics
    ///
    /// This method panics if `tolerance` is negative, NaN, or large enough (50 or more) for the
    /// two bands to touch.
    pub fn tolerance(tolerance: f32) -> Self {
        assert!(
            (0.0..50.0).contains(&tolerance),
            "tolerance must be in range 0.0..50.0, got {tolerance}"
        );
        Self { tolerance }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.tolerance
    }

    fn is_top(&self, percentage: f32) -> bool {
        (100.0 - self.tolerance..=100.0).contains(&percentage)
    }

    fn is_bottom(&self, percentage: f32) -> bool {
        (0.0..=self.tolerance).contains(&percentage)
    }
}

/// State machine turning completion percentages into repetition counts.
#[derive(Debug, Clone, Default)]
pub struct RepetitionTracker {
    state: RepState,
    thresholds: Thresholds,
}

impl RepetitionTracker {
    /// Creates a tracker that counts exact 100/0 boundary hits.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            state: RepState::default(),
            thresholds,
        }
    }

    #[inline]
    pub fn state(&self) -> RepState {
        self.state
    }

    /// Feeds the completion percentage of the next frame into the tracker.
    ///
    /// Returns the updated state. Percentages that don't hit the boundary the limb is moving
    /// towards leave the state unchanged. The count saturates at `u32::MAX` half-repetitions; the
    /// direction keeps flipping.
    pub fn update(&mut self, percentage: f32) -> RepState {
        let next = match self.state.direction {
            Direction::Extending if self.thresholds.is_top(percentage) => Direction::Contracting,
            Direction::Contracting if self.thresholds.is_bottom(percentage) => Direction::Extending,
            _ => return self.state,
        };

        self.state.half_reps = self.state.half_reps.saturating_add(1);
        self.state.direction = next;
        log::trace!("{percentage}% -> {}", self.state);
        self.state
    }

    /// Resets the count to zero and the direction to [`Direction::Extending`].
    pub fn reset(&mut self) {
        self.state = RepState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Direction::*;

    fn feed(tracker: &mut RepetitionTracker, percentages: &[f32]) -> Vec<(f32, Direction)> {
        percentages
            .iter()
            .map(|&p| {
                let state = tracker.update(p);
                (state.count(), state.direction())
            })
            .collect()
    }

    #[test]
    fn full_repetition() {
        let mut tracker = RepetitionTracker::new();
        assert_eq!(
            feed(&mut tracker, &[50.0, 100.0, 50.0, 0.0]),
            [
                (0.0, Extending),
                (0.5, Contracting),
                (0.5, Contracting),
                (1.0, Extending)
            ]
        );
        assert_eq!(tracker.state().reps(), 1);
    }

    #[test]
    fn repeated_top_counts_once() {
        let mut tracker = RepetitionTracker::new();
        tracker.update(100.0);
        let state = tracker.update(100.0);
        assert_eq!(state.count(), 0.5);
        assert_eq!(state.direction(), Contracting);
    }

    #[test]
    fn bottom_first_is_ignored() {
        let mut tracker = RepetitionTracker::new();
        assert_eq!(tracker.update(0.0), RepState::default());
    }

    #[test]
    fn near_boundaries_are_ignored() {
        let mut tracker = RepetitionTracker::new();
        for p in [99.9, 100.1, 150.0, -1.0, f32::NAN, f32::INFINITY] {
            assert_eq!(tracker.update(p), RepState::default(), "{p}");
        }
        tracker.update(100.0);
        for p in [0.1, -0.1, -50.0, f32::NEG_INFINITY] {
            assert_eq!(tracker.update(p).half_reps(), 1, "{p}");
        }
    }

    #[test]
    fn reset() {
        let mut tracker = RepetitionTracker::new();
        feed(&mut tracker, &[100.0, 0.0, 100.0]);
        assert_eq!(tracker.state().count(), 1.5);
        assert_eq!(tracker.state().direction(), Contracting);

        tracker.reset();
        assert_eq!(tracker.state(), RepState::default());
        assert_eq!(tracker.state().direction(), Extending);

        // Resetting a fresh tracker is a no-op.
        tracker.reset();
        assert_eq!(tracker.state(), RepState::default());
    }

    #[test]
    fn tolerance_band() {
        let mut tracker = RepetitionTracker::with_thresholds(Thresholds::tolerance(5.0));
        assert_eq!(tracker.update(94.0).half_reps(), 0);
        assert_eq!(tracker.update(105.0).half_reps(), 0);
        assert_eq!(tracker.update(96.0).half_reps(), 1);
        assert_eq!(tracker.update(6.0).half_reps(), 1);
        assert_eq!(tracker.update(-2.0).half_reps(), 1);
        assert_eq!(tracker.update(3.0).half_reps(), 2);
        assert_eq!(tracker.state().direction(), Extending);
    }

    #[test]
    fn exact_is_default() {
        assert_eq!(Thresholds::default(), Thresholds::EXACT);
        assert_eq!(Thresholds::tolerance(0.0), Thresholds::EXACT);
    }

    #[test]
    #[should_panic]
    fn overlapping_bands() {
        Thresholds::tolerance(50.0);
    }

    #[test]
    #[should_panic]
    fn negative_tolerance() {
        Thresholds::tolerance(-1.0);
    }

    #[test]
    fn count_saturates() {
        let mut tracker = RepetitionTracker::new();
        tracker.state.half_reps = u32::MAX - 1;
        assert_eq!(tracker.update(100.0).half_reps(), u32::MAX);
        let state = tracker.update(0.0);
        assert_eq!(state.half_reps(), u32::MAX);
        assert_eq!(state.direction(), Extending);
        assert_eq!(tracker.update(100.0).direction(), Contracting);
        assert_eq!(tracker.state().reps(), u32::MAX / 2);
    }

    #[test]
    fn random_signal_invariants() {
        let mut rng = fastrand::Rng::with_seed(0x7265_7063);
        let mut tracker = RepetitionTracker::new();
        let mut prev = tracker.state();
        for _ in 0..20_000 {
            let p = match rng.u8(0..10) {
                0 => 0.0,
                1 => 100.0,
                2 => -rng.f32() * 20.0,
                _ => rng.f32() * 100.0,
            };
            let state = tracker.update(p);

            assert_eq!(state.count() * 2.0, state.half_reps() as f32);
            assert!(state.half_reps() >= prev.half_reps());
            if state.direction() == prev.direction() {
                assert_eq!(state, prev, "state changed without a direction flip at {p}%");
            } else {
                assert_eq!(state.half_reps(), prev.half_reps() + 1);
                let expected = if prev.direction() == Extending { 100.0 } else { 0.0 };
                assert_eq!(p, expected);
            }
            prev = state;
        }
        assert!(prev.half_reps() > 0);
    }
}
