//! Utilities for numerics.

use std::ops::RangeInclusive;

/// Linearly maps `value` from the range `from` onto the range `to`.
///
/// If `clamp` is `true`, values below `from` map to the start of `to` and values above it map to
/// the end of `to`, so the result always lies within `to`. Otherwise the mapping is extrapolated.
///
/// Inputs that lie exactly on an end of `from` map exactly onto the corresponding end of `to`.
///
/// # Panics
///
/// This function panics if `from` is empty or consists of a single value.
pub fn interp(value: f32, from: RangeInclusive<f32>, to: RangeInclusive<f32>, clamp: bool) -> f32 {
    let (x0, x1) = from.into_inner();
    let (y0, y1) = to.into_inner();
    assert!(x0 < x1, "cannot interpolate from empty range {x0}..={x1}");

    if clamp {
        if value <= x0 {
            return y0;
        }
        if value >= x1 {
            return y1;
        }
    } else if value == x0 {
        return y0;
    } else if value == x1 {
        return y1;
    }

    y0 + (value - x0) * (y1 - y0) / (x1 - x0)
}
