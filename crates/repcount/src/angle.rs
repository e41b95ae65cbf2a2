//! Joint angle computation.

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Context};
use itertools::Itertools;
use nalgebra::Point2;

use crate::landmark::{Landmark, LandmarkFrame, LandmarkIdx};

/// Computes the directed angle at `vertex`, from the ray towards `a` to the ray towards `c`.
///
/// The result is in degrees, in range `[0, 360)`. Swapping `a` and `c` yields `360 - angle` (or 0)
/// instead of the same value, so a joint bending through its full range of motion produces a
/// monotonic signal instead of one that folds back at 180°.
///
/// If `a` or `c` coincides with `vertex`, the direction of that ray is taken to be 0° and the
/// result is meaningless, but still finite.
pub fn joint_angle(a: Point2<f32>, vertex: Point2<f32>, c: Point2<f32>) -> f32 {
    let to_a = a - vertex;
    let to_c = c - vertex;
    let mut angle = (to_c.y.atan2(to_c.x) - to_a.y.atan2(to_a.x)).to_degrees();
    if angle < 0.0 {
        angle += 360.0;
    }
    // A tiny negative difference rounds up to exactly 360 after the adjustment above.
    if angle >= 360.0 {
        angle = 0.0;
    }
    angle
}

/// The three landmarks forming a tracked joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joint {
    a: u32,
    vertex: u32,
    c: u32,
}

/// The default joint is the right elbow, measured from the shoulder to the wrist.
impl Default for Joint {
    fn default() -> Self {
        Self::from_indices(
            LandmarkIdx::RightShoulder,
            LandmarkIdx::RightElbow,
            LandmarkIdx::RightWrist,
        )
    }
}

impl Joint {
    /// Creates a joint from raw landmark IDs. `vertex` is the landmark the angle is measured at.
    pub fn new(a: u32, vertex: u32, c: u32) -> Self {
        Self { a, vertex, c }
    }

    pub fn from_indices(a: LandmarkIdx, vertex: LandmarkIdx, c: LandmarkIdx) -> Self {
        Self::new(a.id(), vertex.id(), c.id())
    }

    /// Returns the landmark IDs as `[a, vertex, c]`.
    pub fn ids(&self) -> [u32; 3] {
        [self.a, self.vertex, self.c]
    }

    /// Looks up the joint's landmarks in `frame` and computes the joint angle.
    ///
    /// Returns the angle along with the three landmarks (ordered `[a, vertex, c]`), or [`None`] if
    /// any of them is missing from `frame`.
    pub fn angle(&self, frame: &LandmarkFrame) -> Option<(f32, [Landmark; 3])> {
        let a = frame.get(self.a)?;
        let vertex = frame.get(self.vertex)?;
        let c = frame.get(self.c)?;
        let angle = joint_angle(a.position(), vertex.position(), c.position());
        Some((angle, [a, vertex, c]))
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.ids().into_iter().enumerate() {
            if i != 0 {
                f.write_str(",")?;
            }
            match LandmarkIdx::from_id(id) {
                Some(idx) => write!(f, "{idx}")?,
                None => write!(f, "{id}")?,
            }
        }
        Ok(())
    }
}

/// Parses `A,VERTEX,C`, where each part is either a numeric landmark ID or a [`LandmarkIdx`] name.
///
/// Numeric IDs are not limited to the named body landmarks, so detectors with other landmark
/// layouts can be used.
impl FromStr for Joint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, vertex, c) = s
            .split(',')
            .map(|part| -> anyhow::Result<u32> {
                let part = part.trim();
                match part.parse::<u32>() {
                    Ok(id) => Ok(id),
                    Err(_) => Ok(part.parse::<LandmarkIdx>()?.id()),
                }
            })
            .collect_tuple()
            .ok_or_else(|| anyhow!("expected 3 comma-separated landmarks, got '{s}'"))?;
        let ctx = || format!("invalid joint '{s}'");
        Ok(Self::new(
            a.with_context(ctx)?,
            vertex.with_context(ctx)?,
            c.with_context(ctx)?,
        ))
    }
}
