//! Per-frame orchestration: landmarks in, repetition counts out.

use std::{
    ops::RangeInclusive,
    time::{Duration, Instant},
};

use crate::{
    angle::Joint,
    filter::{Circular, Ema, Filter},
    landmark::{Landmark, LandmarkFrame},
    num::interp,
    present::Presenter,
    rep::{RepState, RepetitionTracker, Thresholds},
    source::{Command, Input},
    timer::{FpsCounter, FrameClock, Timer},
};

/// Maps joint angles onto completion percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    range: RangeInclusive<f32>,
    clamp: bool,
}

/// The default calibration maps 210°-310° onto 0-100%, clamping angles outside of that range.
impl Default for Calibration {
    fn default() -> Self {
        Self::new(210.0..=310.0)
    }
}

impl Calibration {
    /// Creates a calibration mapping the angle range `range` onto 0-100%.
    ///
    /// # Panics
    ///
    /// This method panics if `range` is empty or contains only a single angle.
    pub fn new(range: RangeInclusive<f32>) -> Self {
        assert!(
            range.start() < range.end(),
            "calibration range {range:?} is empty"
        );
        Self { range, clamp: true }
    }

    /// Sets whether percentages are clamped to 0-100.
    ///
    /// When disabled, angles outside of the calibration range are extrapolated to percentages
    /// below 0 or above 100, which never count as reaching either end of the range of motion.
    ///
    /// By default, percentages are clamped.
    pub fn clamp(self, clamp: bool) -> Self {
        Self { clamp, ..self }
    }

    /// Converts a joint angle in degrees to a completion percentage.
    pub fn percentage(&self, angle: f32) -> f32 {
        interp(angle, self.range.clone(), 0.0..=100.0, self.clamp)
    }
}

/// Configuration of a [`Session`].
#[derive(Debug, Default, Clone)]
pub struct SessionOptions {
    joint: Joint,
    calibration: Calibration,
    thresholds: Thresholds,
    smoothing: Option<f32>,
}

impl SessionOptions {
    /// Sets the joint whose angle is tracked.
    ///
    /// By default, the right elbow is tracked ([`Joint::default`]).
    #[inline]
    pub fn joint(self, joint: Joint) -> Self {
        Self { joint, ..self }
    }

    #[inline]
    pub fn calibration(self, calibration: Calibration) -> Self {
        Self {
            calibration,
            ..self
        }
    }

    /// Sets the percentage bands counting as the ends of the range of motion.
    ///
    /// By default, [`Thresholds::EXACT`] is used.
    #[inline]
    pub fn thresholds(self, thresholds: Thresholds) -> Self {
        Self { thresholds, ..self }
    }

    /// Enables exponential smoothing of the joint angle with the given `alpha`.
    ///
    /// Smoothing is disabled by default. See [`Ema::new`] for the meaning of `alpha`. Angles are
    /// smoothed along the shorter way around the circle (see [`Circular`]).
    #[inline]
    pub fn smoothing(self, alpha: f32) -> Self {
        Self {
            smoothing: Some(alpha),
            ..self
        }
    }
}

/// Result of analyzing the tracked joint in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Analysis {
    /// The joint angle in degrees (after smoothing, if enabled).
    pub angle: f32,
    /// The completion percentage derived from `angle`.
    pub percentage: f32,
    /// Repetition state after this frame was counted.
    pub state: RepState,
    /// The joint's landmarks, ordered `[a, vertex, c]`.
    pub joint: [Landmark; 3],
}

/// Everything the presentation layer gets to see about a processed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Zero-based index of the frame within the session.
    pub index: u64,
    /// Instantaneous frame rate, or 0.0 if unknown.
    pub fps: f32,
    /// Time spent analyzing the frame.
    pub analyze_time: Duration,
    /// Repetition state after this frame. Unchanged when no analysis was possible.
    pub state: RepState,
    /// [`None`] if the frame contained no pose or lacked one of the joint's landmarks.
    pub analysis: Option<Analysis>,
}

impl FrameReport {
    /// Returns the number of completed repetitions, for display.
    #[inline]
    pub fn reps(&self) -> u32 {
        self.state.reps()
    }

    /// Returns the completion percentage truncated to an integer, for display.
    pub fn percentage(&self) -> Option<i32> {
        self.analysis.map(|a| a.percentage as i32)
    }
}

/// Outcome of [`Session::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of frames processed.
    pub frames: u64,
    /// Final repetition state.
    pub state: RepState,
}

/// A repetition counting session.
///
/// Frames have to be passed in the order they were captured.
pub struct Session {
    joint: Joint,
    calibration: Calibration,
    smoothing: Option<Circular<Ema>>,
    tracker: RepetitionTracker,
    clock: FrameClock,
    frames: u64,
    t_analyze: Timer,
    fps: FpsCounter,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        log::debug!(
            "tracking joint {} over {:?} ({}), tolerance {}",
            options.joint,
            options.calibration.range,
            if options.calibration.clamp {
                "clamped"
            } else {
                "extrapolated"
            },
            options.thresholds.value(),
        );
        Self {
            joint: options.joint,
            calibration: options.calibration,
            smoothing: options
                .smoothing
                .map(|alpha| Circular::new(Ema::new(alpha))),
            tracker: RepetitionTracker::with_thresholds(options.thresholds),
            clock: FrameClock::new(),
            frames: 0,
            t_analyze: Timer::new("analyze"),
            fps: FpsCounter::new(),
        }
    }

    #[inline]
    pub fn state(&self) -> RepState {
        self.tracker.state()
    }

    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Resets the repetition count and direction. Nothing else is affected.
    pub fn reset(&mut self) {
        log::info!("resetting count (was {})", self.tracker.state());
        self.tracker.reset();
    }

    /// Processes a frame that arrived at `now`.
    ///
    /// Frames without a pose, or without all of the tracked joint's landmarks, do not affect the
    /// repetition state.
    pub fn process(&mut self, frame: &LandmarkFrame, now: Instant) -> FrameReport {
        let index = self.frames;
        self.frames += 1;
        let fps = self.clock.tick(now);

        let analysis = self.t_analyze.time(|| {
            analyze(
                frame,
                &self.joint,
                &self.calibration,
                self.smoothing.as_mut(),
                &mut self.tracker,
            )
        });
        if analysis.is_none() {
            if frame.is_empty() {
                log::trace!("frame {index}: no pose");
            } else {
                log::trace!("frame {index}: landmarks of joint {} missing", self.joint);
            }
        }

        if let Some(frames) = self.fps.tick(now) {
            log::debug!("{frames} FPS ({})", self.t_analyze);
        }

        FrameReport {
            index,
            fps,
            analyze_time: self.t_analyze.last(),
            state: self.tracker.state(),
            analysis,
        }
    }

    /// Runs the session until `inputs` are exhausted or a [`Command::Quit`] is received.
    ///
    /// Every frame is passed to `presenter` after processing. [`Presenter::finish`] is called
    /// before returning, even if reading input or presenting a frame failed.
    pub fn run<I>(&mut self, inputs: I, presenter: &mut dyn Presenter) -> anyhow::Result<Summary>
    where
        I: IntoIterator<Item = anyhow::Result<Input>>,
    {
        log::debug!("session started");
        let result = self.run_loop(inputs.into_iter(), presenter);
        let finished = presenter.finish();
        log::debug!("session ended after {} frames", self.frames);

        result?;
        finished?;

        let summary = Summary {
            frames: self.frames,
            state: self.tracker.state(),
        };
        log::info!("{} frames, {}", summary.frames, summary.state);
        Ok(summary)
    }

    fn run_loop(
        &mut self,
        inputs: impl Iterator<Item = anyhow::Result<Input>>,
        presenter: &mut dyn Presenter,
    ) -> anyhow::Result<()> {
        for input in inputs {
            match input? {
                Input::Frame(frame) => {
                    let report = self.process(&frame, Instant::now());
                    presenter.present(&frame, &report)?;
                }
                Input::Command(Command::Reset) => self.reset(),
                Input::Command(Command::Quit) => {
                    log::debug!("quit requested");
                    break;
                }
            }
        }
        Ok(())
    }
}

fn analyze(
    frame: &LandmarkFrame,
    joint: &Joint,
    calibration: &Calibration,
    smoothing: Option<&mut Circular<Ema>>,
    tracker: &mut RepetitionTracker,
) -> Option<Analysis> {
    if frame.is_empty() {
        return None;
    }

    let (raw_angle, joint) = joint.angle(frame)?;
    let angle = match smoothing {
        Some(filter) => filter.push(raw_angle),
        None => raw_angle,
    };
    let percentage = calibration.percentage(angle);

    let before = tracker.state();
    let state = tracker.update(percentage);
    if state.reps() != before.reps() {
        log::info!("{} reps", state.reps());
    }

    Some(Analysis {
        angle,
        percentage,
        state,
        joint,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_abs_diff_eq;

    use crate::rep::Direction;

    use super::*;

    /// Builds a frame with the default joint (right arm) bent to `angle` degrees.
    fn arm_at(angle: f32) -> LandmarkFrame {
        let (sin, cos) = angle.to_radians().sin_cos();
        LandmarkFrame::from_iter([
            Landmark::new(12, 500.0, 300.0),
            Landmark::new(14, 400.0, 300.0),
            Landmark::new(16, 400.0 + 100.0 * cos, 300.0 + 100.0 * sin),
        ])
    }

    fn process_all(session: &mut Session, frames: &[LandmarkFrame]) -> Vec<FrameReport> {
        let start = Instant::now();
        frames
            .iter()
            .zip(0..)
            .map(|(frame, i)| session.process(frame, start + Duration::from_millis(i * 50)))
            .collect()
    }

    #[test]
    fn calibration_defaults() {
        let cal = Calibration::default();
        assert_eq!(cal.percentage(210.0), 0.0);
        assert_eq!(cal.percentage(310.0), 100.0);
        assert_abs_diff_eq!(cal.percentage(260.0), 50.0, epsilon = 1e-4);
        assert_eq!(cal.percentage(180.0), 0.0);
        assert_eq!(cal.percentage(330.0), 100.0);

        let cal = cal.clamp(false);
        assert_abs_diff_eq!(cal.percentage(180.0), -30.0, epsilon = 1e-4);
        assert_abs_diff_eq!(cal.percentage(330.0), 120.0, epsilon = 1e-4);
    }

    #[test]
    fn arm_helper_produces_angle() {
        let frame = arm_at(250.0);
        let (angle, _) = Joint::default().angle(&frame).unwrap();
        assert_abs_diff_eq!(angle, 250.0, epsilon = 1e-3);
    }

    #[test]
    fn counts_curls() {
        let mut session = Session::new(SessionOptions::default());
        let frames = [
            arm_at(230.0),
            arm_at(320.0), // past the top of the range -> 100%
            arm_at(280.0),
            arm_at(200.0), // past the bottom -> 0%
            arm_at(260.0),
            arm_at(315.0),
            arm_at(205.0),
        ];
        let reports = process_all(&mut session, &frames);
        let counts = reports.iter().map(|r| r.state.count()).collect::<Vec<_>>();
        assert_eq!(counts, [0.0, 0.5, 0.5, 1.0, 1.0, 1.5, 2.0]);
        assert_eq!(reports[1].percentage(), Some(100));
        assert_eq!(reports[3].percentage(), Some(0));
        assert_eq!(session.state().reps(), 2);
        assert_eq!(session.frames(), 7);
    }

    #[test]
    fn empty_and_incomplete_frames_are_skipped() {
        let mut session = Session::new(SessionOptions::default());
        session.process(&arm_at(320.0), Instant::now());
        let before = session.state();

        let partial = LandmarkFrame::from_iter([
            Landmark::new(12, 500.0, 300.0),
            Landmark::new(14, 400.0, 300.0),
        ]);
        let reports = process_all(&mut session, &[LandmarkFrame::empty(), partial]);
        for report in &reports {
            assert!(report.analysis.is_none());
            assert_eq!(report.percentage(), None);
            assert_eq!(report.state, before);
        }
        assert_eq!(session.state(), before);
        assert_eq!(session.frames(), 3);
    }

    #[test]
    fn extrapolated_percentages_never_count() {
        let mut session = Session::new(
            SessionOptions::default().calibration(Calibration::default().clamp(false)),
        );
        let reports = process_all(&mut session, &[arm_at(320.0), arm_at(200.0)]);
        assert!(reports[0].analysis.unwrap().percentage > 100.0);
        assert_eq!(session.state(), RepState::default());
    }

    #[test]
    fn tolerance_counts_near_boundaries() {
        let mut session = Session::new(
            SessionOptions::default()
                .calibration(Calibration::default().clamp(false))
                .thresholds(Thresholds::tolerance(5.0)),
        );
        process_all(&mut session, &[arm_at(307.0), arm_at(213.0)]);
        assert_eq!(session.state().count(), 1.0);
    }

    #[test]
    fn smoothing_delays_boundary() {
        let mut session = Session::new(SessionOptions::default().smoothing(0.5));
        let reports = process_all(&mut session, &[arm_at(260.0), arm_at(360.0 - 1.0)]);
        // (260 + 359) / 2 = 309.5 -> not quite at the top yet
        assert_abs_diff_eq!(reports[1].analysis.unwrap().angle, 309.5, epsilon = 1e-2);
        assert_eq!(session.state().half_reps(), 0);
        session.process(&arm_at(359.0), Instant::now());
        assert_eq!(session.state().half_reps(), 1);
    }

    #[test]
    fn smoothing_wraps_around_zero() {
        let mut session = Session::new(SessionOptions::default().smoothing(0.5));
        // Jitter across the 0°/360° seam: 1°, 357°, 3° averages to 1°, 359°, 1°.
        let reports = process_all(&mut session, &[arm_at(1.0), arm_at(357.0), arm_at(3.0)]);
        let angles = reports
            .iter()
            .map(|r| r.analysis.unwrap().angle)
            .collect::<Vec<_>>();
        assert_abs_diff_eq!(angles[0], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(angles[1], 359.0, epsilon = 1e-2);
        assert_abs_diff_eq!(angles[2], 1.0, epsilon = 1e-2);

        let counts = reports.iter().map(|r| r.state.count()).collect::<Vec<_>>();
        assert_eq!(counts, [0.0, 0.5, 1.0]);
    }

    #[test]
    fn reset_only_touches_count() {
        let mut session = Session::new(SessionOptions::default());
        let reports = process_all(&mut session, &[arm_at(320.0), arm_at(200.0), arm_at(320.0)]);
        assert_eq!(reports[2].state.count(), 1.5);

        session.reset();
        assert_eq!(session.state(), RepState::default());
        assert_eq!(session.state().direction(), Direction::Extending);
        assert_eq!(session.frames(), 3);
    }

    #[test]
    fn fps_from_frame_spacing() {
        let mut session = Session::new(SessionOptions::default());
        let reports = process_all(&mut session, &[arm_at(250.0), arm_at(250.0)]);
        assert_eq!(reports[0].fps, 0.0);
        assert_abs_diff_eq!(reports[1].fps, 20.0, epsilon = 1e-2);
    }

    #[test]
    #[should_panic]
    fn empty_calibration() {
        Calibration::new(300.0..=200.0);
    }
}
