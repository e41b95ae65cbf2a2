//! Exercise repetition counting from body pose landmarks.
//!
//! A pose detector produces one [`LandmarkFrame`] per camera frame. A [`Session`] picks the three
//! landmarks forming the tracked joint, computes the joint angle, remaps it to a completion
//! percentage, and feeds that to a [`RepetitionTracker`], which counts half-repetitions whenever
//! the percentage touches 100 or 0.
//!
//! # Coordinates
//!
//! Landmark coordinates are image pixel coordinates: X points to the right, Y points *down*. Joint
//! angles are measured in that coordinate system, so a visually counter-clockwise angle on screen
//! is clockwise in the math.
//!
//! # Environment Variables
//!
//! * `RUST_LOG`: overrides the log filter installed by [`init_logger!`].
//! * `REPCOUNT_*`: every command line option of the `repcount` binary can also be set through an
//!   environment variable (see `repcount --help`).
//!
//! [`LandmarkFrame`]: landmark::LandmarkFrame
//! [`Session`]: session::Session
//! [`RepetitionTracker`]: rep::RepetitionTracker

use log::LevelFilter;

pub mod angle;
pub mod draw;
pub mod filter;
pub mod landmark;
pub mod num;
pub mod present;
pub mod rep;
pub mod session;
pub mod source;
pub mod timer;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and `repcount` will log at *trace*
/// level. Otherwise, they will log at *debug* level. `RUST_LOG` is applied on top.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
