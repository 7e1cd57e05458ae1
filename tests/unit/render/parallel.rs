use super::*;
use crate::foundation::core::{Canvas, Fps};
use crate::timeline::TimelineBuilder;

fn timeline(duration: f64, fps: Fps) -> Timeline {
    TimelineBuilder::new(
        Canvas {
            width: 2,
            height: 2,
        },
        fps,
        duration,
    )
    .build()
    .unwrap()
}

#[test]
fn opts_validate_duration_and_concurrency() {
    assert!(ParallelOpts::default().validate().is_ok());
    let bad_duration = ParallelOpts {
        segment_duration_secs: 0.0,
        max_concurrency: 4,
    };
    assert!(bad_duration.validate().is_err());
    let bad_concurrency = ParallelOpts {
        segment_duration_secs: 10.0,
        max_concurrency: 0,
    };
    assert!(bad_concurrency.validate().is_err());
}

#[test]
fn segments_cover_every_frame_exactly_once() {
    let timeline = timeline(25.0, Fps { num: 30, den: 1 });
    let segments = plan_segments(&timeline, 10.0).unwrap();

    assert_eq!(segments.len(), 3);
    let covered: u64 = segments.iter().map(|s| s.frame_count).sum();
    assert_eq!(covered, timeline.total_frames());

    let mut next = 0u64;
    for (i, segment) in segments.iter().enumerate() {
        assert_eq!(segment.index, i);
        assert_eq!(segment.first_frame, next);
        next += segment.frame_count;
    }
}

#[test]
fn last_segment_is_truncated_to_the_remainder() {
    let timeline = timeline(25.0, Fps { num: 30, den: 1 });
    let segments = plan_segments(&timeline, 10.0).unwrap();
    assert_eq!(segments[0].frame_count, 300);
    assert_eq!(segments[1].frame_count, 300);
    assert_eq!(segments[2].frame_count, 150);
    assert!((segments[2].end_time - 25.0).abs() < 1e-9);
}

#[test]
fn segment_boundaries_land_on_whole_frames() {
    // 0.7s segments at 30fps: 21 frames each, never a fractional boundary.
    let timeline = timeline(2.0, Fps { num: 30, den: 1 });
    let segments = plan_segments(&timeline, 0.7).unwrap();
    for segment in &segments {
        assert_eq!(
            segment.start_time,
            timeline.fps().frame_to_secs(segment.first_frame)
        );
        assert!(segment.duration() > 0.0);
    }
    assert_eq!(segments[0].frame_count, 21);
}

#[test]
fn short_timelines_become_one_segment() {
    let timeline = timeline(3.0, Fps { num: 30, den: 1 });
    let segments = plan_segments(&timeline, 10.0).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].first_frame, 0);
    assert_eq!(segments[0].frame_count, 90);
}

#[test]
fn tiny_segment_durations_still_make_progress() {
    let timeline = timeline(1.0, Fps { num: 10, den: 1 });
    // Rounds to zero frames per segment; the planner clamps to one.
    let segments = plan_segments(&timeline, 0.001).unwrap();
    assert_eq!(segments.len(), 10);
    assert!(segments.iter().all(|s| s.frame_count == 1));
}

#[test]
fn plan_rejects_non_positive_segment_duration() {
    let timeline = timeline(1.0, Fps { num: 10, den: 1 });
    assert!(plan_segments(&timeline, 0.0).is_err());
    assert!(plan_segments(&timeline, f64::NAN).is_err());
}

#[test]
fn manifest_lists_segments_in_index_order() {
    let paths = vec![
        PathBuf::from("/tmp/s/segment_00000.mp4"),
        PathBuf::from("/tmp/s/segment_00001.mp4"),
        PathBuf::from("/tmp/s/segment_00002.mp4"),
    ];
    let manifest = build_concat_manifest(&paths);
    assert_eq!(
        manifest,
        "file '/tmp/s/segment_00000.mp4'\n\
         file '/tmp/s/segment_00001.mp4'\n\
         file '/tmp/s/segment_00002.mp4'\n"
    );
}

#[test]
fn manifest_escapes_single_quotes() {
    let paths = vec![PathBuf::from("/tmp/it's here/segment_00000.mp4")];
    let manifest = build_concat_manifest(&paths);
    assert_eq!(
        manifest,
        "file '/tmp/it'\\''s here/segment_00000.mp4'\n"
    );
}
