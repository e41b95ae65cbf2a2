//! Line-based landmark and command input.
//!
//! Pose detectors and control surfaces feed a [`Session`][crate::session::Session] through a
//! simple text stream with one entry per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! frame 12:412,220 14:431,318 16:380,402    # landmarks as ID:X,Y pixel coordinates
//! frame                                     # no pose detected in this frame
//! pose 0.51,0.20 0.52,0.18 0.53,0.18        # normalized X,Y coordinates, IDs 0, 1, 2, ...
//! reset                                     # or `r`: reset the repetition count
//! quit                                      # or `q`: stop processing
//! ```
//!
//! Normalized `pose` coordinates are scaled to the resolution configured with
//! [`ScriptReader::resolution`].

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use anyhow::{anyhow, bail, Context};

use crate::landmark::{Landmark, LandmarkFrame};

/// Default resolution normalized coordinates are scaled to.
pub const DEFAULT_RESOLUTION: (u32, u32) = (800, 600);

/// A command from the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Reset the repetition count and direction.
    Reset,
    /// Stop processing input.
    Quit,
}

/// One entry of the input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Frame(LandmarkFrame),
    Command(Command),
}

/// Parses a single line of input.
///
/// Returns `Ok(None)` for blank lines and comments. `width` and `height` are used to scale
/// normalized `pose` coordinates.
pub fn parse_line(line: &str, width: u32, height: u32) -> anyhow::Result<Option<Input>> {
    let line = match line.split_once('#') {
        Some((content, _comment)) => content,
        None => line,
    };
    let mut tokens = line.split_whitespace();
    let Some(directive) = tokens.next() else {
        return Ok(None);
    };

    let input = match directive {
        "frame" => Input::Frame(
            tokens
                .map(parse_landmark)
                .collect::<anyhow::Result<LandmarkFrame>>()?,
        ),
        "pose" => {
            let positions = tokens.map(parse_point).collect::<anyhow::Result<Vec<_>>>()?;
            Input::Frame(LandmarkFrame::from_normalized(positions, width, height))
        }
        "reset" | "r" => command(Command::Reset, tokens)?,
        "quit" | "q" => command(Command::Quit, tokens)?,
        _ => bail!("unknown directive '{directive}'"),
    };
    Ok(Some(input))
}

fn command<'a>(cmd: Command, mut rest: impl Iterator<Item = &'a str>) -> anyhow::Result<Input> {
    if let Some(extra) = rest.next() {
        bail!("unexpected argument '{extra}' to {cmd:?} command");
    }
    Ok(Input::Command(cmd))
}

fn parse_landmark(token: &str) -> anyhow::Result<Landmark> {
    let (id, point) = token
        .split_once(':')
        .ok_or_else(|| anyhow!("expected landmark as ID:X,Y, got '{token}'"))?;
    let id = id
        .parse::<u32>()
        .with_context(|| format!("invalid landmark ID in '{token}'"))?;
    let [x, y] = parse_point(point).with_context(|| format!("invalid landmark '{token}'"))?;
    Ok(Landmark::new(id, x, y))
}

fn parse_point(token: &str) -> anyhow::Result<[f32; 2]> {
    let (x, y) = token
        .split_once(',')
        .ok_or_else(|| anyhow!("expected coordinates as X,Y, got '{token}'"))?;
    let x = x.parse::<f32>()?;
    let y = y.parse::<f32>()?;
    if !x.is_finite() || !y.is_finite() {
        bail!("coordinates must be finite, got '{token}'");
    }
    Ok([x, y])
}

/// Reads [`Input`]s line by line from a [`BufRead`] implementor.
///
/// Reading blocks until a full line is available, so this can be attached to a live detector
/// writing to a pipe.
pub struct ScriptReader<R> {
    lines: io::Lines<R>,
    line_no: usize,
    width: u32,
    height: u32,
}

impl<R: BufRead> ScriptReader<R> {
    pub fn new(reader: R) -> Self {
        let (width, height) = DEFAULT_RESOLUTION;
        Self {
            lines: reader.lines(),
            line_no: 0,
            width,
            height,
        }
    }

    /// Sets the resolution that normalized `pose` coordinates are scaled to.
    pub fn resolution(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }
}

impl ScriptReader<Box<dyn BufRead>> {
    /// Opens the script at `path`, or standard input if `path` is [`None`].
    pub fn open(path: Option<&Path>) -> anyhow::Result<Self> {
        let reader: Box<dyn BufRead> = match path {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open '{}'", path.display()))?;
                Box::new(BufReader::new(file))
            }
            None => Box::new(io::stdin().lock()),
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> Iterator for ScriptReader<R> {
    type Item = anyhow::Result<Input>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line_no = self.line_no;
            let parsed = line
                .map_err(anyhow::Error::from)
                .and_then(|line| parse_line(&line, self.width, self.height))
                .with_context(|| format!("line {line_no}"));
            match parsed {
                Ok(Some(input)) => return Some(Ok(input)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> anyhow::Result<Option<Input>> {
        parse_line(line, 800, 600)
    }

    #[test]
    fn skips_blank_and_comments() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   \t").unwrap(), None);
        assert_eq!(parse("# frame 1:2,3").unwrap(), None);
    }

    #[test]
    fn frame() {
        let Some(Input::Frame(frame)) = parse("frame 12:412,220 14:431.5,318 # arm").unwrap()
        else {
            panic!("expected frame");
        };
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.get(12), Some(Landmark::new(12, 412.0, 220.0)));
        assert_eq!(frame.get(14), Some(Landmark::new(14, 431.5, 318.0)));
    }

    #[test]
    fn empty_frame() {
        assert_eq!(
            parse("frame").unwrap(),
            Some(Input::Frame(LandmarkFrame::empty()))
        );
    }

    #[test]
    fn normalized_pose() {
        let Some(Input::Frame(frame)) = parse("pose 0.5,0.5 0.25,1.0").unwrap() else {
            panic!("expected frame");
        };
        assert_eq!(frame.get(0), Some(Landmark::new(0, 400.0, 300.0)));
        assert_eq!(frame.get(1), Some(Landmark::new(1, 200.0, 600.0)));
    }

    #[test]
    fn commands() {
        assert_eq!(parse("reset").unwrap(), Some(Input::Command(Command::Reset)));
        assert_eq!(parse(" r ").unwrap(), Some(Input::Command(Command::Reset)));
        assert_eq!(parse("quit").unwrap(), Some(Input::Command(Command::Quit)));
        assert_eq!(parse("q").unwrap(), Some(Input::Command(Command::Quit)));
        assert!(parse("quit now").is_err());
    }

    #[test]
    fn malformed() {
        assert!(parse("jump").is_err());
        assert!(parse("frame 12").is_err());
        assert!(parse("frame x:1,2").is_err());
        assert!(parse("frame 12:1").is_err());
        assert!(parse("frame 12:1,y").is_err());
        assert!(parse("frame 12:inf,2").is_err());
        assert!(parse("pose 0.5").is_err());
    }

    #[test]
    fn reader_reports_line_numbers() {
        let script = "# header\nframe\n\nframe 1:2,\nquit\n";
        let mut reader = ScriptReader::new(script.as_bytes());
        assert!(matches!(reader.next(), Some(Ok(Input::Frame(_)))));
        let err = reader.next().unwrap().unwrap_err();
        assert!(format!("{err:#}").starts_with("line 4: "), "{err:#}");
        assert!(matches!(
            reader.next(),
            Some(Ok(Input::Command(Command::Quit)))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn reader_resolution() {
        let mut reader = ScriptReader::new("pose 0.5,0.5".as_bytes()).resolution(1920, 1080);
        let Some(Ok(Input::Frame(frame))) = reader.next() else {
            panic!("expected frame");
        };
        assert_eq!(frame.get(0), Some(Landmark::new(0, 960.0, 540.0)));
    }
}
