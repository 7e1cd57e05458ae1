use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::composition::element::{ActiveWindow, SolidElement};
use crate::foundation::error::SceneError;

fn canvas() -> Canvas {
    Canvas {
        width: 2,
        height: 2,
    }
}

fn fps() -> Fps {
    Fps { num: 10, den: 1 }
}

fn solid(start: f64, end: f64, z: i32, color: [u8; 4]) -> Box<dyn Element> {
    Box::new(SolidElement::new(canvas(), start, end, z, color))
}

/// Element that reports how many times it was asked to draw.
struct CountingElement {
    window: ActiveWindow,
    color: [u8; 4],
    draws: AtomicUsize,
}

impl CountingElement {
    fn new(start: f64, end: f64, color: [u8; 4]) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            window: ActiveWindow {
                start,
                end,
                z_index: 0,
            },
            color,
            draws: AtomicUsize::new(0),
        })
    }
}

impl Element for std::sync::Arc<CountingElement> {
    fn active_window(&self) -> ActiveWindow {
        self.window
    }

    fn compute_transform_at(&self, _t: f64) -> crate::TransformState {
        crate::TransformState::default()
    }

    fn produce_frame_at(&self, _t: f64) -> SceneResult<Option<Frame>> {
        self.draws.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Frame::solid(canvas(), self.color)))
    }
}

/// Element that always fails to draw with the given error.
struct FailingElement {
    fatal: bool,
}

impl Element for FailingElement {
    fn active_window(&self) -> ActiveWindow {
        ActiveWindow {
            start: 0.0,
            end: 10.0,
            z_index: 100,
        }
    }

    fn compute_transform_at(&self, _t: f64) -> crate::TransformState {
        crate::TransformState::default()
    }

    fn produce_frame_at(&self, _t: f64) -> SceneResult<Option<Frame>> {
        if self.fatal {
            Err(SceneError::resource("asset vanished"))
        } else {
            Err(SceneError::draw("glyph cache miss"))
        }
    }
}

#[test]
fn builder_validates_canvas_and_duration() {
    let zero = Canvas {
        width: 0,
        height: 2,
    };
    assert!(TimelineBuilder::new(zero, fps(), 1.0).build().is_err());
    assert!(TimelineBuilder::new(canvas(), fps(), 0.0).build().is_err());
    assert!(TimelineBuilder::new(canvas(), fps(), f64::NAN).build().is_err());
    assert!(TimelineBuilder::new(canvas(), fps(), 1.0).build().is_ok());
}

#[test]
fn builder_rejects_degenerate_fps() {
    let dead_den = Fps { num: 30, den: 0 };
    assert!(TimelineBuilder::new(canvas(), dead_den, 1.0).build().is_err());
    let dead_num = Fps { num: 0, den: 1 };
    assert!(TimelineBuilder::new(canvas(), dead_num, 1.0).build().is_err());
}

#[test]
fn builder_rejects_invalid_transitions() {
    let mut bad = TransitionSpec::new("crossfade", 1.0, 1.0);
    bad.duration = -1.0;
    let result = TimelineBuilder::new(canvas(), fps(), 4.0)
        .transition(bad)
        .build();
    assert!(result.is_err());
}

#[test]
fn total_frames_uses_ceiling() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 1.05).build().unwrap();
    assert_eq!(timeline.total_frames(), 11);
}

#[test]
fn elements_composite_in_z_order() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 2.0)
        .element(solid(0.0, 2.0, 5, [0, 255, 0, 255]))
        .element(solid(0.0, 2.0, 1, [255, 0, 0, 255]))
        .build()
        .unwrap();
    let frame = TimelineCursor::new(&timeline).frame_at(0.5).unwrap();
    // The z=5 green card covers the z=1 red one.
    assert_eq!(&frame.data[0..4], &[0, 255, 0, 255]);
}

#[test]
fn inactive_elements_leave_the_frame_transparent() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 4.0)
        .element(solid(2.0, 3.0, 0, [255, 0, 0, 255]))
        .build()
        .unwrap();
    let mut cursor = TimelineCursor::new(&timeline);
    assert_eq!(cursor.frame_at(1.0).unwrap(), Frame::transparent(canvas()));
    // Half-open window: active at start, gone at end.
    assert_ne!(cursor.frame_at(2.0).unwrap(), Frame::transparent(canvas()));
    assert_eq!(cursor.frame_at(3.0).unwrap(), Frame::transparent(canvas()));
}

#[test]
fn overlapping_transitions_resolve_to_latest_start() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 10.0)
        .transition(TransitionSpec::new("crossfade", 1.0, 4.0))
        .transition(TransitionSpec::new("wipe", 2.0, 1.0))
        .build()
        .unwrap();
    assert_eq!(timeline.active_transition(1.5).unwrap().name, "crossfade");
    assert_eq!(timeline.active_transition(2.5).unwrap().name, "wipe");
    // The earlier spec resumes once the later one ends.
    assert_eq!(timeline.active_transition(3.5).unwrap().name, "crossfade");
    assert!(timeline.active_transition(6.0).is_none());
}

#[test]
fn transition_blends_frozen_endpoint_frames() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 4.0)
        .element(solid(0.0, 2.0, 0, [255, 0, 0, 255]))
        .element(solid(2.0, 4.0, 0, [0, 0, 255, 255]))
        .transition(TransitionSpec::new("crossfade", 1.5, 1.0))
        .build()
        .unwrap();
    let mut cursor = TimelineCursor::new(&timeline);

    // Progress 0 reproduces the raster frozen at start_time.
    let at_start = cursor.frame_at(1.5).unwrap();
    assert_eq!(&at_start.data[0..4], &[255, 0, 0, 255]);

    // Midway, both frozen endpoints contribute.
    let mid = cursor.frame_at(2.0).unwrap();
    assert!(mid.data[0] > 0 && mid.data[0] < 255);
    assert!(mid.data[2] > 0 && mid.data[2] < 255);

    // Past the window the live compositor takes over again.
    let after = cursor.frame_at(2.5).unwrap();
    assert_eq!(&after.data[0..4], &[0, 0, 255, 255]);
}

#[test]
fn identical_transitions_at_different_times_freeze_their_own_endpoints() {
    // Same name, duration, and params: the two specs share one built blend
    // but must not share frozen endpoint rasters.
    let timeline = TimelineBuilder::new(canvas(), fps(), 8.0)
        .element(solid(0.0, 4.0, 0, [255, 0, 0, 255]))
        .element(solid(4.0, 8.0, 0, [0, 0, 255, 255]))
        .transition(TransitionSpec::new("crossfade", 1.0, 1.0))
        .transition(TransitionSpec::new("crossfade", 5.0, 1.0))
        .build()
        .unwrap();
    let mut cursor = TimelineCursor::new(&timeline);

    // Drive the first transition so its endpoints get frozen.
    assert_eq!(&cursor.frame_at(1.0).unwrap().data[0..4], &[255, 0, 0, 255]);

    // The second transition freezes its own rasters: at its start both
    // endpoints composite to the blue card, not the earlier red one.
    assert_eq!(&cursor.frame_at(5.0).unwrap().data[0..4], &[0, 0, 255, 255]);
}

#[test]
fn endpoints_are_frozen_once_per_transition() {
    let counting = CountingElement::new(0.0, 10.0, [255, 255, 255, 255]);
    let timeline = TimelineBuilder::new(canvas(), fps(), 10.0)
        .element(Box::new(std::sync::Arc::clone(&counting)))
        .transition(TransitionSpec::new("crossfade", 2.0, 1.0))
        .build()
        .unwrap();
    let mut cursor = TimelineCursor::new(&timeline);

    for frame in 20..30 {
        cursor.frame_at(fps().frame_to_secs(frame)).unwrap();
    }
    // Both endpoint rasters were composited exactly once, no matter how many
    // blended frames were produced.
    assert_eq!(counting.draws.load(Ordering::SeqCst), 2);
}

#[test]
fn hard_cut_fallback_switches_mid_window() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 4.0)
        .element(solid(0.0, 2.0, 0, [255, 0, 0, 255]))
        .element(solid(2.0, 4.0, 0, [0, 0, 255, 255]))
        .transition(TransitionSpec::new("no-such-blend", 1.5, 1.0))
        .build()
        .unwrap();
    let mut cursor = TimelineCursor::new(&timeline);
    assert_eq!(&cursor.frame_at(1.9).unwrap().data[0..4], &[255, 0, 0, 255]);
    assert_eq!(&cursor.frame_at(2.1).unwrap().data[0..4], &[0, 0, 255, 255]);
}

#[test]
fn draw_errors_skip_the_element_but_keep_the_frame() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 2.0)
        .element(solid(0.0, 2.0, 0, [255, 0, 0, 255]))
        .element(Box::new(FailingElement { fatal: false }))
        .build()
        .unwrap();
    let frame = TimelineCursor::new(&timeline).frame_at(0.5).unwrap();
    assert_eq!(&frame.data[0..4], &[255, 0, 0, 255]);
}

#[test]
fn fatal_errors_abort_the_frame() {
    let timeline = TimelineBuilder::new(canvas(), fps(), 2.0)
        .element(solid(0.0, 2.0, 0, [255, 0, 0, 255]))
        .element(Box::new(FailingElement { fatal: true }))
        .build()
        .unwrap();
    let err = TimelineCursor::new(&timeline).frame_at(0.5).unwrap_err();
    assert!(matches!(err, SceneError::Resource(_)));
}

#[test]
fn audio_streams_aggregate_across_elements() {
    let stream = AudioStream {
        path: "music.mp3".into(),
        start_offset: 1.0,
        volume: 0.8,
        looped: false,
    };
    let timeline = TimelineBuilder::new(canvas(), fps(), 2.0)
        .element(Box::new(
            SolidElement::new(canvas(), 0.0, 2.0, 0, [255, 0, 0, 255])
                .with_audio(stream.clone()),
        ))
        .element(solid(0.0, 2.0, 1, [0, 255, 0, 255]))
        .build()
        .unwrap();
    assert_eq!(timeline.audio_streams(), vec![stream]);
}
