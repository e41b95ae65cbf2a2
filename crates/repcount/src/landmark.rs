//! Body pose landmarks as delivered by a pose detector.

use std::{fmt, str::FromStr};

use anyhow::bail;
use nalgebra::Point2;

/// A single tracked anatomical point with a stable numeric identity.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Landmark {
    id: u32,
    pos: Point2<f32>,
}

impl Landmark {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            pos: Point2::new(x, y),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Point2<f32> {
        self.pos
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }
}

/// All landmarks a detector found in one camera frame.
///
/// A frame is empty when no pose was detected.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LandmarkFrame {
    landmarks: Vec<Landmark>,
}

impl LandmarkFrame {
    /// Creates an empty frame.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Creates a frame from normalized landmark positions.
    ///
    /// Landmark IDs are assigned in iteration order, starting at 0. Coordinates in range 0.0 to
    /// 1.0 are scaled to `width` x `height` and truncated to whole pixels.
    pub fn from_normalized<I>(positions: I, width: u32, height: u32) -> Self
    where
        I: IntoIterator<Item = [f32; 2]>,
    {
        let (w, h) = (width as f32, height as f32);
        let landmarks = positions
            .into_iter()
            .zip(0..)
            .map(|([x, y], id)| Landmark::new(id, (x * w).trunc(), (y * h).trunc()))
            .collect();
        Self { landmarks }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Landmark> + '_ {
        self.landmarks.iter().copied()
    }

    /// Looks up the landmark with the given `id`.
    ///
    /// Detectors usually emit landmarks ordered by ID, in which case this is a direct index.
    /// Otherwise the frame is searched.
    pub fn get(&self, id: u32) -> Option<Landmark> {
        match self.landmarks.get(id as usize) {
            Some(lm) if lm.id == id => Some(*lm),
            _ => self.landmarks.iter().find(|lm| lm.id == id).copied(),
        }
    }
}

impl FromIterator<Landmark> for LandmarkFrame {
    fn from_iter<T: IntoIterator<Item = Landmark>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

macro_rules! landmark_indices {
    ( $( $variant:ident = $id:literal => $name:literal, )+ ) => {
        /// IDs of the 33 body pose landmarks produced by MediaPipe-style pose detectors.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum LandmarkIdx {
            $( $variant = $id, )+
        }

        impl LandmarkIdx {
            /// All landmark indices, ordered by ID.
            pub const ALL: &'static [LandmarkIdx] = &[ $( LandmarkIdx::$variant, )+ ];

            /// Returns the kebab-case name of this landmark (eg. `right-elbow`).
            pub fn name(self) -> &'static str {
                match self {
                    $( LandmarkIdx::$variant => $name, )+
                }
            }
        }
    };
}

landmark_indices! {
    Nose = 0 => "nose",
    LeftEyeInner = 1 => "left-eye-inner",
    LeftEye = 2 => "left-eye",
    LeftEyeOuter = 3 => "left-eye-outer",
    RightEyeInner = 4 => "right-eye-inner",
    RightEye = 5 => "right-eye",
    RightEyeOuter = 6 => "right-eye-outer",
    LeftEar = 7 => "left-ear",
    RightEar = 8 => "right-ear",
    MouthLeft = 9 => "mouth-left",
    MouthRight = 10 => "mouth-right",
    LeftShoulder = 11 => "left-shoulder",
    RightShoulder = 12 => "right-shoulder",
    LeftElbow = 13 => "left-elbow",
    RightElbow = 14 => "right-elbow",
    LeftWrist = 15 => "left-wrist",
    RightWrist = 16 => "right-wrist",
    LeftPinky = 17 => "left-pinky",
    RightPinky = 18 => "right-pinky",
    LeftIndex = 19 => "left-index",
    RightIndex = 20 => "right-index",
    LeftThumb = 21 => "left-thumb",
    RightThumb = 22 => "right-thumb",
    LeftHip = 23 => "left-hip",
    RightHip = 24 => "right-hip",
    LeftKnee = 25 => "left-knee",
    RightKnee = 26 => "right-knee",
    LeftAnkle = 27 => "left-ankle",
    RightAnkle = 28 => "right-ankle",
    LeftHeel = 29 => "left-heel",
    RightHeel = 30 => "right-heel",
    LeftFootIndex = 31 => "left-foot-index",
    RightFootIndex = 32 => "right-foot-index",
}

impl LandmarkIdx {
    #[inline]
    pub fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }
}

impl fmt::Display for LandmarkIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LandmarkIdx {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u32>() {
            return match Self::from_id(id) {
                Some(idx) => Ok(idx),
                None => bail!("landmark ID {id} is out of range (0-{})", Self::ALL.len() - 1),
            };
        }

        let normalized = s.to_ascii_lowercase().replace('_', "-");
        match Self::ALL.iter().find(|idx| idx.name() == normalized) {
            Some(idx) => Ok(*idx),
            None => bail!("unknown landmark name '{s}'"),
        }
    }
}

/// Pairs of landmarks connected by the coarse body skeleton.
pub const COARSE_CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        (LeftShoulder, RightShoulder),
        (LeftShoulder, LeftElbow),
        (LeftElbow, LeftWrist),
        (RightShoulder, RightElbow),
        (RightElbow, RightWrist),
        (LeftShoulder, LeftHip),
        (LeftHip, RightHip),
        (LeftHip, LeftKnee),
        (LeftKnee, LeftAnkle),
        (LeftAnkle, LeftHeel),
        (LeftAnkle, LeftFootIndex),
        (RightShoulder, RightHip),
        (RightHip, RightKnee),
        (RightKnee, RightAnkle),
        (RightAnkle, RightHeel),
        (RightAnkle, RightFootIndex),
    ]
};
