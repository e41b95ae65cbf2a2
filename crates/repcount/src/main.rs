//! Counts exercise repetitions in a stream of pose landmarks.
//!
//! Reads landmark frames and commands line by line from `SCRIPT` (or standard input), prints a
//! report for every frame, and the total repetition count at exit.

use std::{io, ops::RangeInclusive, path::PathBuf};

use clap::Parser;
use repcount::{
    angle::Joint,
    present::{OverlayOptions, OverlayPresenter, Presenter, TextPresenter},
    rep::Thresholds,
    session::{Calibration, Session, SessionOptions},
    source::{ScriptReader, DEFAULT_RESOLUTION},
};

#[derive(Parser, Debug)]
#[command(name = "repcount", version)]
#[command(about = "Count exercise repetitions from body pose landmarks")]
struct Args {
    /// Landmark script to read (defaults to standard input)
    #[arg(env = "REPCOUNT_SCRIPT")]
    script: Option<PathBuf>,

    /// Landmarks forming the tracked joint, as IDs or names (`A,VERTEX,C`)
    #[arg(long, env = "REPCOUNT_JOINT", default_value = "12,14,16")]
    joint: Joint,

    /// Joint angles in degrees mapped to 0% and 100% completion (`LO,HI`)
    #[arg(long, env = "REPCOUNT_ANGLE_RANGE", default_value = "210,310", value_parser = parse_angle_range)]
    angle_range: RangeInclusive<f32>,

    /// Extrapolate completion beyond 0-100% instead of clamping
    #[arg(long, env = "REPCOUNT_EXTRAPOLATE")]
    extrapolate: bool,

    /// Percentage points from 0 and 100 still counted as reaching the end of the motion
    #[arg(long, env = "REPCOUNT_TOLERANCE", default_value_t = 0.0, value_parser = parse_tolerance)]
    tolerance: f32,

    /// Smooth the joint angle with an exponential moving average of this alpha (0-1)
    #[arg(long, env = "REPCOUNT_SMOOTHING", value_parser = parse_alpha)]
    smoothing: Option<f32>,

    /// Resolution normalized `pose` coordinates are scaled to (`WxH`)
    #[arg(long, env = "REPCOUNT_RESOLUTION", value_parser = parse_resolution)]
    resolution: Option<(u32, u32)>,

    /// Save the HUD overlay of the last frame to this PNG file
    #[arg(long, env = "REPCOUNT_OVERLAY", value_name = "FILE")]
    overlay: Option<PathBuf>,

    /// Draw the tracked joint onto the overlay
    #[arg(long, env = "REPCOUNT_DRAW_JOINT")]
    draw_joint: bool,

    /// Draw all landmarks onto the overlay
    #[arg(long, env = "REPCOUNT_DRAW_POSE")]
    draw_pose: bool,

    /// Don't print per-frame reports
    #[arg(long, short, env = "REPCOUNT_QUIET")]
    quiet: bool,
}

fn parse_angle_range(s: &str) -> Result<RangeInclusive<f32>, String> {
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `LO,HI`, got '{s}'"))?;
    let lo = lo.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let hi = hi.trim().parse::<f32>().map_err(|e| e.to_string())?;
    if !lo.is_finite() || !hi.is_finite() {
        return Err(format!("angles must be finite, got '{s}'"));
    }
    if !(lo < hi) {
        return Err(format!("lower angle {lo} must be below upper angle {hi}"));
    }
    Ok(lo..=hi)
}

fn parse_tolerance(s: &str) -> Result<f32, String> {
    let tolerance = s.parse::<f32>().map_err(|e| e.to_string())?;
    if !(0.0..50.0).contains(&tolerance) {
        return Err(format!("tolerance must be at least 0 and below 50, got {tolerance}"));
    }
    Ok(tolerance)
}

fn parse_alpha(s: &str) -> Result<f32, String> {
    let alpha = s.parse::<f32>().map_err(|e| e.to_string())?;
    if !(0.0..=1.0).contains(&alpha) {
        return Err(format!("alpha must be between 0 and 1, got {alpha}"));
    }
    Ok(alpha)
}

fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected `WIDTHxHEIGHT`, got '{s}'"))?;
    let w = w.parse::<u32>().map_err(|e| e.to_string())?;
    let h = h.parse::<u32>().map_err(|e| e.to_string())?;
    if w == 0 || h == 0 {
        return Err(format!("resolution must not be empty, got {w}x{h}"));
    }
    Ok((w, h))
}

fn main() -> anyhow::Result<()> {
    repcount::init_logger!();

    let args = Args::parse();
    log::trace!("{args:?}");

    let mut options = SessionOptions::default()
        .joint(args.joint)
        .calibration(Calibration::new(args.angle_range).clamp(!args.extrapolate))
        .thresholds(Thresholds::tolerance(args.tolerance));
    if let Some(alpha) = args.smoothing {
        options = options.smoothing(alpha);
    }

    let (width, height) = args.resolution.unwrap_or(DEFAULT_RESOLUTION);
    let reader = ScriptReader::open(args.script.as_deref())?.resolution(width, height);

    let mut presenters: Vec<Box<dyn Presenter>> = Vec::new();
    if !args.quiet {
        presenters.push(Box::new(TextPresenter::new(io::stdout().lock())));
    }
    if args.overlay.is_some() || args.draw_joint || args.draw_pose {
        let mut overlay = OverlayOptions::default()
            .draw_joint(args.draw_joint)
            .draw_pose(args.draw_pose);
        if let Some(path) = args.overlay {
            overlay = overlay.output(path);
        }
        presenters.push(Box::new(OverlayPresenter::new(overlay)));
    }

    let mut session = Session::new(options);
    let summary = session.run(reader, &mut presenters)?;
    drop(presenters);

    println!("total: {} reps", summary.state.reps());
    Ok(())
}
