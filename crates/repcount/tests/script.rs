use std::{cell::RefCell, rc::Rc};

use repcount::{
    landmark::LandmarkFrame,
    present::{OverlayOptions, OverlayPresenter, Presenter, TextPresenter},
    session::{FrameReport, Session, SessionOptions},
    source::ScriptReader,
};

/// Records the reported counts, and whether the presenter was finished.
#[derive(Default, Clone)]
struct Recorder {
    counts: Rc<RefCell<Vec<f32>>>,
    finished: Rc<RefCell<bool>>,
}

impl Presenter for Recorder {
    fn present(&mut self, _: &LandmarkFrame, report: &FrameReport) -> anyhow::Result<()> {
        self.counts.borrow_mut().push(report.state.count());
        Ok(())
    }

    fn finish(&mut self) -> anyhow::Result<()> {
        *self.finished.borrow_mut() = true;
        Ok(())
    }
}

// Right arm with the elbow at (400,300). The shoulder points along +X, so the wrist position
// alone determines the angle: +Y is 90°, -Y is 270°, -X is 180°.
const STRAIGHT_UP: &str = "frame 12:500,300 14:400,300 16:400,200"; // 270° -> 60%
const FULL: &str = "frame 12:500,300 14:400,300 16:480,240"; // ~323° -> 100%
const CURLED: &str = "frame 12:500,300 14:400,300 16:300,290"; // ~185.7° -> 0%

fn script(lines: &[&str]) -> String {
    lines.join("\n")
}

fn run(script: &str) -> (anyhow::Result<u32>, Recorder) {
    let recorder = Recorder::default();
    let mut presenter = recorder.clone();
    let mut session = Session::new(SessionOptions::default());
    let result = session
        .run(ScriptReader::new(script.as_bytes()), &mut presenter)
        .map(|summary| {
            assert_eq!(summary.state, session.state());
            summary.state.reps()
        });
    (result, recorder)
}

#[test]
fn counts_repetitions() {
    let (reps, recorder) = run(&script(&[
        "# two curls",
        STRAIGHT_UP,
        FULL,
        CURLED,
        "frame",
        FULL,
        CURLED,
    ]));
    assert_eq!(reps.unwrap(), 2);
    assert_eq!(*recorder.counts.borrow(), [0.0, 0.5, 1.0, 1.0, 1.5, 2.0]);
    assert!(*recorder.finished.borrow());
}

#[test]
fn reset_and_quit() {
    let (reps, recorder) = run(&script(&[
        FULL, CURLED, "reset", FULL, "quit", CURLED, FULL, CURLED,
    ]));
    assert_eq!(reps.unwrap(), 0);
    assert_eq!(*recorder.counts.borrow(), [0.5, 1.0, 0.5]);
    assert!(*recorder.finished.borrow());
}

#[test]
fn malformed_line_still_finishes() {
    let (reps, recorder) = run(&script(&[FULL, "frame 12:500", CURLED]));
    let err = reps.unwrap_err();
    assert!(format!("{err:#}").starts_with("line 2: "), "{err:#}");
    assert_eq!(*recorder.counts.borrow(), [0.5]);
    assert!(*recorder.finished.borrow());
}

#[test]
fn normalized_poses() {
    // The same arm as `FULL` and `CURLED`, at the default 800x600 resolution.
    let full = "pose 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 \
                0.625,0.5 0,0 0.5,0.5 0,0 0.6,0.4";
    let curled = "pose 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 0,0 \
                  0.625,0.5 0,0 0.5,0.5 0,0 0.375,0.4833";
    let (reps, recorder) = run(&script(&[full, curled]));
    assert_eq!(reps.unwrap(), 1);
    assert_eq!(*recorder.counts.borrow(), [0.5, 1.0]);
}

#[test]
fn text_report() {
    let mut presenter = TextPresenter::new(Vec::new());
    let mut session = Session::new(SessionOptions::default());
    let summary = session
        .run(
            ScriptReader::new(script(&[STRAIGHT_UP, "frame", "q"]).as_bytes()),
            &mut presenter,
        )
        .unwrap();
    assert_eq!(summary.frames, 2);

    let out = String::from_utf8(presenter.into_inner()).unwrap();
    let lines = out.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(
        lines[0].starts_with("frame 0: 0 reps, 60%, 270.0°, "),
        "{}",
        lines[0]
    );
    assert!(lines[1].starts_with("frame 1: no pose, 0 reps, "), "{}", lines[1]);
}

#[test]
fn overlay_saved_after_error() {
    let path = std::env::temp_dir().join(format!("repcount-overlay-{}.png", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let mut presenter = OverlayPresenter::new(
        OverlayOptions::default()
            .output(&path)
            .draw_joint(true)
            .draw_pose(true),
    );
    let mut session = Session::new(SessionOptions::default());
    let err = session
        .run(
            ScriptReader::new(script(&[FULL, "jump"]).as_bytes()),
            &mut presenter,
        )
        .unwrap_err();
    assert!(format!("{err:#}").starts_with("line 2: "), "{err:#}");

    image::open(&path).unwrap();
    assert_eq!(image::image_dimensions(&path).unwrap(), (800, 600));
    std::fs::remove_file(&path).unwrap();
}
