use super::*;
use crate::animation::anim::{Animation, Property};

fn canvas() -> Canvas {
    Canvas {
        width: 2,
        height: 2,
    }
}

#[test]
fn active_window_reports_construction_values() {
    let el = SolidElement::new(canvas(), 1.0, 4.0, 7, [255, 0, 0, 255]);
    let win = el.active_window();
    assert_eq!(win.start, 1.0);
    assert_eq!(win.end, 4.0);
    assert_eq!(win.z_index, 7);
    assert!(win.window().contains(1.0));
    assert!(!win.window().contains(4.0));
}

#[test]
fn produce_frame_premultiplies_by_resolved_opacity() {
    let el = SolidElement::new(canvas(), 0.0, 2.0, 0, [200, 100, 50, 255]).with_animation(
        Animation::tween(Property::Opacity, 0.0, 2.0, 1.0, 0.0),
    );

    let full = el.produce_frame_at(0.0).unwrap().unwrap();
    assert_eq!(&full.data[0..4], &[200, 100, 50, 255]);

    let half = el.produce_frame_at(1.0).unwrap().unwrap();
    let px = &half.data[0..4];
    assert_eq!(px[3], 128);
    assert!(px[0] < 200 && px[0] > 90);
}

#[test]
fn fully_transparent_elements_contribute_nothing() {
    let el = SolidElement::new(canvas(), 0.0, 2.0, 0, [10, 10, 10, 255]).with_animation(
        Animation::tween(Property::Opacity, 0.0, 2.0, 0.0, 0.0),
    );
    assert!(el.produce_frame_at(1.0).unwrap().is_none());
}

#[test]
fn appear_delay_hides_element_until_elapsed() {
    let el = SolidElement::new(canvas(), 0.0, 2.0, 0, [10, 10, 10, 255]).with_appear_delay(0.5);
    assert!(el.produce_frame_at(0.25).unwrap().is_none());
    assert!(el.produce_frame_at(0.5).unwrap().is_some());
}

#[test]
fn audio_streams_pass_through() {
    let stream = AudioStream {
        path: "/tmp/music.mp3".into(),
        start_offset: 2.0,
        volume: 0.8,
        looped: false,
    };
    let el = SolidElement::new(canvas(), 0.0, 2.0, 0, [0, 0, 0, 255]).with_audio(stream.clone());
    assert_eq!(el.audio_streams(), vec![stream]);
}
