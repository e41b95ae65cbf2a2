//! Data filtering and smoothing.

/// A filter for values of type `V`.
pub trait Filter<V> {
    /// Adds a new value to the filter, returning the filtered value.
    fn push(&mut self, value: V) -> V;

    /// Resets the accumulated history and state of the filter to be identical to the state just
    /// after construction.
    fn reset(&mut self);
}

/// Exponential Moving Average – a weighted moving average whose weight decreases exponentially.
///
/// This is a tunable IIR filter. The first value pushed after construction or [`Filter::reset`]
/// is passed through unchanged.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f32,
    last: Option<f32>,
}

impl Ema {
    /// Creates a new Exponential Moving Average filter.
    ///
    /// The `alpha` parameter must be between 0.0 and 1.0 and defines how quickly the weight of
    /// older values should decay. Values close to 1.0 very strongly favor recent values over older
    /// values, while values closer to 0.0 favor more recent values less strongly. An `alpha` of 1.0
    /// disables filtering.
    ///
    /// # Panics
    ///
    /// This method will panic if `alpha` is not in between 0.0 and 1.0.
    pub fn new(alpha: f32) -> Self {
        assert!(
            (0.0..=1.0).contains(&alpha),
            "EMA alpha must be in range 0.0..=1.0, got {alpha}"
        );
        Self { alpha, last: None }
    }
}

impl Filter<f32> for Ema {
    fn push(&mut self, value: f32) -> f32 {
        match self.last {
            Some(last) => {
                let avg = self.alpha * value + (1.0 - self.alpha) * last;
                self.last = Some(avg);
                avg
            }
            None => {
                self.last = Some(value);
                value
            }
        }
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// Adapts a filter of linear values to angles in degrees.
///
/// Angles wrap around at 360°, so a signal jittering between 1° and 359° has to be treated as
/// jittering around 0° rather than around 180°. Every pushed angle is shifted by a multiple of
/// 360° to lie within 180° of the previous output before it is passed to the inner filter. The
/// result is folded back into `[0, 360)`.
#[derive(Debug, Clone)]
pub struct Circular<F> {
    inner: F,
    /// Last output of `inner`, before folding.
    last: Option<f32>,
}

impl<F: Filter<f32>> Circular<F> {
    pub fn new(inner: F) -> Self {
        Self { inner, last: None }
    }
}

impl<F: Filter<f32>> Filter<f32> for Circular<F> {
    fn push(&mut self, angle: f32) -> f32 {
        let unwrapped = match self.last {
            Some(last) => last + ((angle - last + 180.0).rem_euclid(360.0) - 180.0),
            None => angle,
        };
        let out = self.inner.push(unwrapped);
        self.last = Some(out);

        let folded = out.rem_euclid(360.0);
        if folded >= 360.0 {
            0.0
        } else {
            folded
        }
    }

    fn reset(&mut self) {
        self.inner.reset();
        self.last = None;
    }
}
