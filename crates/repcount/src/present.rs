//! Presentation of per-frame results.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use embedded_graphics::prelude::Point;

use crate::{
    draw::{self, Canvas, Color, FontSize},
    landmark::LandmarkFrame,
    num::interp,
    session::FrameReport,
};

/// Consumer of processed frames.
pub trait Presenter {
    /// Presents the results of a single frame.
    ///
    /// `frame` is the landmark frame `report` was computed from.
    fn present(&mut self, frame: &LandmarkFrame, report: &FrameReport) -> anyhow::Result<()>;

    /// Called once after the last frame, to flush output and release resources.
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Presents every frame to all contained presenters, in order.
///
/// An empty list discards all frames.
impl Presenter for Vec<Box<dyn Presenter>> {
    fn present(&mut self, frame: &LandmarkFrame, report: &FrameReport) -> anyhow::Result<()> {
        for presenter in self.iter_mut() {
            presenter.present(frame, report)?;
        }
        Ok(())
    }

    /// Finishes all presenters, even if some of them fail. The first error is returned.
    fn finish(&mut self) -> anyhow::Result<()> {
        let mut result = Ok(());
        for presenter in self.iter_mut() {
            let finished = presenter.finish();
            if result.is_ok() {
                result = finished;
            }
        }
        result
    }
}

/// Writes one line of text per frame.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn present(&mut self, _frame: &LandmarkFrame, report: &FrameReport) -> anyhow::Result<()> {
        let fps = report.fps as i32;
        let written = match report.analysis {
            Some(analysis) => writeln!(
                self.out,
                "frame {}: {} reps, {}%, {:.1}°, {fps} fps",
                report.index,
                report.reps(),
                analysis.percentage as i32,
                analysis.angle,
            ),
            None => writeln!(
                self.out,
                "frame {}: no pose, {} reps, {fps} fps",
                report.index,
                report.reps(),
            ),
        };
        written.context("failed to write frame report")
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        self.out.flush().context("failed to flush frame reports")
    }
}

const OVERLAY_WIDTH: u32 = 800;
const OVERLAY_HEIGHT: u32 = 600;
const BAR_LENGTH: u32 = 540;

const PRIMARY: Color = Color::from_rgb8(100, 100, 255);
const SECONDARY: Color = Color::from_rgb8(100, 255, 100);
const BACKGROUND: Color = Color::from_rgb8(50, 50, 50);
const RESET_BUTTON: Color = Color::from_rgb8(255, 130, 80);

/// Options for the [`OverlayPresenter`].
#[derive(Debug, Default, Clone)]
pub struct OverlayOptions {
    output: Option<PathBuf>,
    draw_joint: bool,
    draw_pose: bool,
}

impl OverlayOptions {
    /// Sets the path the overlay of the last frame is saved to when the session ends.
    pub fn output(self, path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
            ..self
        }
    }

    /// Draws the tracked joint's limb segments and angle.
    pub fn draw_joint(self, draw_joint: bool) -> Self {
        Self { draw_joint, ..self }
    }

    /// Draws all detected landmarks and the body skeleton.
    pub fn draw_pose(self, draw_pose: bool) -> Self {
        Self { draw_pose, ..self }
    }
}

/// Draws the repetition counter HUD onto an 800x600 canvas.
///
/// The HUD consists of a progress bar and labels for the repetition count, the completion
/// percentage, the frame rate, and the reset key. The count, percentage, and progress bar are
/// only shown for frames in which the joint could be analyzed.
pub struct OverlayPresenter {
    canvas: Canvas,
    options: OverlayOptions,
}

impl OverlayPresenter {
    pub fn new(options: OverlayOptions) -> Self {
        Self {
            canvas: Canvas::new(OVERLAY_WIDTH, OVERLAY_HEIGHT),
            options,
        }
    }

    /// Returns the canvas containing the overlay of the most recent frame.
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn output(&self) -> Option<&Path> {
        self.options.output.as_deref()
    }

    fn draw(&mut self, frame: &LandmarkFrame, report: &FrameReport) {
        let canvas = &mut self.canvas;
        canvas.clear(Color::BLACK);

        if self.options.draw_pose {
            draw::pose(canvas, frame);
        }

        if let Some(analysis) = report.analysis {
            if self.options.draw_joint {
                draw::joint(canvas, analysis.joint, analysis.angle);
            }

            let fill = interp(analysis.percentage, 0.0..=100.0, 0.0..=1.0, true);
            draw::progress_bar(canvas, Point::new(30, 560), BAR_LENGTH, fill)
                .color(SECONDARY)
                .thickness(20);

            let reps = format!("{} Reps", report.reps());
            draw::label(canvas, Point::new(580, 520), &reps)
                .size(FontSize::Large)
                .color(SECONDARY)
                .background(PRIMARY);

            let percentage = format!("{}%", analysis.percentage as i32);
            let color = if analysis.percentage <= 50.0 {
                PRIMARY
            } else {
                SECONDARY
            };
            draw::label(canvas, Point::new(10, 60), &percentage)
                .size(FontSize::Large)
                .color(color)
                .background(BACKGROUND);
        }

        let fps = format!("FPS: {}", report.fps as i32);
        draw::label(canvas, Point::new(660, 40), &fps)
            .color(SECONDARY)
            .background(PRIMARY);

        draw::label(canvas, Point::new(30, 520), "Reset Count (r)")
            .color(Color::WHITE)
            .background(RESET_BUTTON);
    }
}

impl Presenter for OverlayPresenter {
    fn present(&mut self, frame: &LandmarkFrame, report: &FrameReport) -> anyhow::Result<()> {
        self.draw(frame, report);
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        if let Some(path) = &self.options.output {
            self.canvas.save(path)?;
            log::info!("saved overlay to '{}'", path.display());
        }
        Ok(())
    }
}
