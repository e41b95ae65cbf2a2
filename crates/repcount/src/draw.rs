//! Drawing API for [`Canvas`]es.
//!
//! This module contains a collection of freestanding functions that draw shapes onto a
//! [`Canvas`]. All functions return a *guard object* that allows optional customization of the
//! shape and performs the draw operation when dropped.
//!
//! All drawing operations *overwrite* the target pixels with the shape color. They do not perform
//! blending. Pixels outside of the canvas are silently discarded.

use std::{convert::Infallible, fmt, path::Path, thread};

use anyhow::Context;
use embedded_graphics::{
    mono_font::{ascii, MonoFont, MonoTextStyle},
    pixelcolor::raw::RawU32,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};
use image::{ImageBuffer, Rgba, RgbaImage};

use crate::landmark::{Landmark, LandmarkFrame, COARSE_CONNECTIVITY};

/// An 8-bit RGBA color.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Color([u8; 4]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const BLUE: Self = Self([0, 0, 255, 255]);
    pub const MAGENTA: Self = Self([255, 0, 255, 255]);

    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.0[3]
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r(),
            self.g(),
            self.b(),
            self.a(),
        )
    }
}

impl PixelColor for Color {
    type Raw = RawU32;
}

/// An RGBA image that can be drawn on.
pub struct Canvas {
    buf: RgbaImage,
}

impl Canvas {
    /// Creates a black canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let mut canvas = Self {
            buf: ImageBuffer::new(width, height),
        };
        canvas.clear(Color::BLACK);
        canvas
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Fills the whole canvas with `color`.
    pub fn clear(&mut self, color: Color) {
        for pixel in self.buf.pixels_mut() {
            *pixel = Rgba(color.0);
        }
    }

    /// Returns the color of the pixel at `x`,`y`.
    ///
    /// # Panics
    ///
    /// This method panics if the coordinates are outside of the canvas.
    pub fn get(&self, x: u32, y: u32) -> Color {
        Color(self.buf.get_pixel(x, y).0)
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.buf.put_pixel(x, y, Rgba(color.0));
    }

    /// Saves the canvas to the file system.
    ///
    /// The image format is derived from the file extension of `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        self.save_impl(path.as_ref())
    }

    fn save_impl(&self, path: &Path) -> anyhow::Result<()> {
        self.buf
            .save(path)
            .with_context(|| format!("failed to save image to '{}'", path.display()))
    }
}

/// Font size of text drawn by [`text`] and [`label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSize {
    #[default]
    Small,
    Large,
}

impl FontSize {
    fn font(self) -> &'static MonoFont<'static> {
        match self {
            FontSize::Small => &ascii::FONT_6X10,
            FontSize::Large => &ascii::FONT_10X20,
        }
    }
}

/// Guard returned by [`rect`]; draws the rectangle when dropped and allows customization.
pub struct DrawRect<'a> {
    canvas: &'a mut Canvas,
    rect: Rectangle,
    color: Color,
    stroke_width: u32,
    filled: bool,
}

impl DrawRect<'_> {
    /// Sets the rectangle's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the rectangle's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }

    /// Fills the rectangle instead of only drawing its outline.
    pub fn filled(&mut self) -> &mut Self {
        self.filled = true;
        self
    }
}

impl Drop for DrawRect<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        let style = if self.filled {
            PrimitiveStyle::with_fill(self.color)
        } else {
            PrimitiveStyle::with_stroke(self.color, self.stroke_width)
        };
        match self.rect.into_styled(style).draw(&mut Target(&mut *self.canvas)) {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`line`][line()]; draws the line when dropped and allows customization.
pub struct DrawLine<'a> {
    canvas: &'a mut Canvas,
    start: Point,
    end: Point,
    color: Color,
    stroke_width: u32,
}

impl DrawLine<'_> {
    /// Sets the line's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the line's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl Drop for DrawLine<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        match Line::new(self.start, self.end)
            .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
            .draw(&mut Target(&mut *self.canvas))
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`circle`]; draws the circle when dropped and allows customization.
pub struct DrawCircle<'a> {
    canvas: &'a mut Canvas,
    center: Point,
    diameter: u32,
    stroke_width: u32,
    filled: bool,
    color: Color,
}

impl DrawCircle<'_> {
    /// Sets the circle's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the circle's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }

    /// Fills the circle instead of only drawing its outline.
    pub fn filled(&mut self) -> &mut Self {
        self.filled = true;
        self
    }
}

impl Drop for DrawCircle<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        let style = if self.filled {
            PrimitiveStyle::with_fill(self.color)
        } else {
            PrimitiveStyle::with_stroke(self.color, self.stroke_width)
        };
        match Circle::with_center(self.center, self.diameter)
            .into_styled(style)
            .draw(&mut Target(&mut *self.canvas))
        {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`text`]; draws the text when dropped and allows customization.
pub struct DrawText<'a> {
    canvas: &'a mut Canvas,
    pos: Point,
    text: &'a str,
    color: Color,
    size: FontSize,
    alignment: Alignment,
    baseline: Baseline,
}

impl DrawText<'_> {
    /// Sets the text color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    pub fn size(&mut self, size: FontSize) -> &mut Self {
        self.size = size;
        self
    }

    /// Aligns the left side of the text with the `x` coordinate.
    pub fn align_left(&mut self) -> &mut Self {
        self.alignment = Alignment::Left;
        self
    }

    /// Aligns the baseline of the text with the `y` coordinate.
    pub fn align_baseline(&mut self) -> &mut Self {
        self.baseline = Baseline::Alphabetic;
        self
    }
}

impl Drop for DrawText<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        let character_style = MonoTextStyle::new(self.size.font(), self.color);
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(self.baseline)
            .build();
        match Text::with_text_style(self.text, self.pos, character_style, text_style)
            .draw(&mut Target(&mut *self.canvas))
        {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`label`]; draws the label when dropped and allows customization.
pub struct DrawLabel<'a> {
    canvas: &'a mut Canvas,
    pos: Point,
    text: &'a str,
    color: Color,
    background: Color,
    size: FontSize,
    padding: u32,
}

impl DrawLabel<'_> {
    /// Sets the color of the text and the label's border.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    pub fn background(&mut self, color: Color) -> &mut Self {
        self.background = color;
        self
    }

    pub fn size(&mut self, size: FontSize) -> &mut Self {
        self.size = size;
        self
    }
}

impl Drop for DrawLabel<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        let text = Text::with_baseline(
            self.text,
            self.pos,
            MonoTextStyle::new(self.size.font(), self.color),
            Baseline::Alphabetic,
        );
        let bounds = text.bounding_box();
        let pad = self.padding as i32;
        let top_left = bounds.top_left - Point::new(pad, pad);
        let bottom_right = bounds
            .bottom_right()
            .unwrap_or(bounds.top_left)
            .component_max(self.pos)
            + Point::new(pad, pad);
        let frame = Rectangle::with_corners(top_left, bottom_right);

        let target = &mut Target(&mut *self.canvas);
        let results = [
            frame
                .into_styled(PrimitiveStyle::with_fill(self.background))
                .draw(target),
            frame
                .into_styled(PrimitiveStyle::with_stroke(self.color, 2))
                .draw(target),
            text.draw(target).map(drop),
        ];
        for result in results {
            match result {
                Ok(()) => {}
                Err(infallible) => match infallible {},
            }
        }
    }
}

/// Guard returned by [`progress_bar`]; draws the bar when dropped and allows customization.
pub struct DrawProgressBar<'a> {
    canvas: &'a mut Canvas,
    pos: Point,
    length: u32,
    fraction: f32,
    thickness: u32,
    color: Color,
}

impl DrawProgressBar<'_> {
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the height of the bar in pixels.
    ///
    /// The default thickness is 20.
    pub fn thickness(&mut self, thickness: u32) -> &mut Self {
        self.thickness = thickness;
        self
    }
}

impl Drop for DrawProgressBar<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        let filled = (self.fraction.clamp(0.0, 1.0) * self.length as f32) as u32;
        rect(
            self.canvas,
            Rectangle::new(self.pos, Size::new(self.length, self.thickness)),
        )
        .color(self.color)
        .stroke_width(2);
        if filled > 0 {
            rect(
                self.canvas,
                Rectangle::new(self.pos, Size::new(filled, self.thickness)),
            )
            .color(self.color)
            .filled();
        }
    }
}

/// Guard returned by [`joint`]; draws the joint visualization when dropped.
pub struct DrawJoint<'a> {
    canvas: &'a mut Canvas,
    landmarks: [Landmark; 3],
    angle: f32,
    line_color: Color,
    point_color: Color,
}

impl Drop for DrawJoint<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        let [a, vertex, c] = self.landmarks.map(to_point);
        line(self.canvas, a, vertex)
            .color(self.line_color)
            .stroke_width(3);
        line(self.canvas, c, vertex)
            .color(self.line_color)
            .stroke_width(3);

        for point in [a, vertex, c] {
            circle(self.canvas, point, 20)
                .color(self.point_color)
                .stroke_width(2);
            circle(self.canvas, point, 10)
                .color(self.point_color)
                .filled();
        }

        let angle = (self.angle as i32).to_string();
        text(self.canvas, vertex - Point::new(50, 50), &angle)
            .color(self.point_color)
            .size(FontSize::Large)
            .align_left()
            .align_baseline();
    }
}

/// Guard returned by [`pose`]; draws the skeleton when dropped.
pub struct DrawPose<'a> {
    canvas: &'a mut Canvas,
    frame: &'a LandmarkFrame,
    color: Color,
    marker_color: Color,
}

impl Drop for DrawPose<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            return;
        }

        for (a, b) in COARSE_CONNECTIVITY {
            if let (Some(a), Some(b)) = (self.frame.get(a.id()), self.frame.get(b.id())) {
                line(self.canvas, to_point(a), to_point(b)).color(self.color);
            }
        }
        for lm in self.frame.iter() {
            circle(self.canvas, to_point(lm), 10)
                .color(self.marker_color)
                .filled();
        }
    }
}

fn to_point(lm: Landmark) -> Point {
    Point::new(lm.x() as i32, lm.y() as i32)
}

/// Draws a rectangle onto a canvas.
pub fn rect(canvas: &mut Canvas, rect: Rectangle) -> DrawRect<'_> {
    DrawRect {
        canvas,
        rect,
        color: Color::RED,
        stroke_width: 1,
        filled: false,
    }
}

/// Draws a line onto a canvas.
pub fn line(canvas: &mut Canvas, start: Point, end: Point) -> DrawLine<'_> {
    DrawLine {
        canvas,
        start,
        end,
        color: Color::BLUE,
        stroke_width: 1,
    }
}

/// Draws a circle around `center` onto a canvas.
pub fn circle(canvas: &mut Canvas, center: Point, diameter: u32) -> DrawCircle<'_> {
    DrawCircle {
        canvas,
        center,
        diameter,
        stroke_width: 1,
        filled: false,
        color: Color::GREEN,
    }
}

/// Draws a text string onto a canvas.
///
/// By default, the text is drawn centered horizontally and vertically around `pos`.
pub fn text<'a>(canvas: &'a mut Canvas, pos: Point, text: &'a str) -> DrawText<'a> {
    DrawText {
        canvas,
        pos,
        text,
        color: Color::RED,
        size: FontSize::Small,
        alignment: Alignment::Center,
        baseline: Baseline::Middle,
    }
}

/// Draws a text label with a filled, bordered background box.
///
/// `pos` is the left end of the text's baseline. The box extends 10 pixels past the text on all
/// sides.
pub fn label<'a>(canvas: &'a mut Canvas, pos: Point, text: &'a str) -> DrawLabel<'a> {
    DrawLabel {
        canvas,
        pos,
        text,
        color: Color::WHITE,
        background: Color::BLACK,
        size: FontSize::Small,
        padding: 10,
    }
}

/// Draws a horizontal progress bar of `length` pixels, filled to `fraction` (0.0 to 1.0).
///
/// `pos` is the top left corner of the bar. Fractions outside of 0.0 to 1.0 are clamped.
pub fn progress_bar(
    canvas: &mut Canvas,
    pos: Point,
    length: u32,
    fraction: f32,
) -> DrawProgressBar<'_> {
    DrawProgressBar {
        canvas,
        pos,
        length,
        fraction,
        thickness: 20,
        color: Color::GREEN,
    }
}

/// Visualizes a joint angle: both limb segments, a marker on each landmark, and the angle in
/// degrees next to the vertex.
///
/// `landmarks` are ordered `[a, vertex, c]`, as returned by [`Joint::angle`].
///
/// [`Joint::angle`]: crate::angle::Joint::angle
pub fn joint(canvas: &mut Canvas, landmarks: [Landmark; 3], angle: f32) -> DrawJoint<'_> {
    DrawJoint {
        canvas,
        landmarks,
        angle,
        line_color: Color::WHITE,
        point_color: Color::RED,
    }
}

/// Draws all landmarks in `frame`, connected by the coarse body skeleton.
pub fn pose<'a>(canvas: &'a mut Canvas, frame: &'a LandmarkFrame) -> DrawPose<'a> {
    DrawPose {
        canvas,
        frame,
        color: Color::WHITE,
        marker_color: Color::MAGENTA,
    }
}

struct Target<'a>(&'a mut Canvas);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size {
                width: self.0.width(),
                height: self.0.height(),
            },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(pos, color) in pixels {
            if pos.x >= 0
                && (pos.x as u32) < self.0.width()
                && pos.y >= 0
                && (pos.y as u32) < self.0.height()
            {
                self.0.set(pos.x as u32, pos.y as u32, color);
            }
        }

        Ok(())
    }
}
