use super::*;
use crate::animation::anim::{Animation, Fill, Property};

fn base() -> TransformState {
    TransformState::default()
}

#[test]
fn absolute_position_overwrites_base() {
    let start = TransformState {
        x: 100.0,
        ..TransformState::default()
    };
    let anims = vec![Animation::tween(Property::X, 0.0, 2.0, 0.0, 10.0)];
    let out = resolve_transform(&start, &anims, 1.0, 0.0);
    assert!((out.x - 5.0).abs() < 1e-12);
}

#[test]
fn offset_position_accumulates_on_top() {
    let start = TransformState {
        x: 100.0,
        ..TransformState::default()
    };
    let anims = vec![
        Animation::tween(Property::X, 0.0, 2.0, 0.0, 10.0).as_offset(),
        Animation::tween(Property::X, 0.0, 2.0, 0.0, 4.0).as_offset(),
    ];
    // Both offsets at t=1.0 contribute half their spans over the base.
    let out = resolve_transform(&start, &anims, 1.0, 0.0);
    assert!((out.x - 107.0).abs() < 1e-12);
}

#[test]
fn absolute_then_offset_combine() {
    let anims = vec![
        Animation::tween(Property::Y, 0.0, 2.0, 0.0, 20.0),
        Animation::tween(Property::Y, 0.0, 2.0, 0.0, 6.0).as_offset(),
    ];
    let out = resolve_transform(&base(), &anims, 1.0, 0.0);
    assert!((out.y - 13.0).abs() < 1e-12);
}

#[test]
fn concurrent_opacity_animations_multiply() {
    let a = Animation::tween(Property::Opacity, 0.0, 4.0, 1.0, 0.0);
    let b = Animation::tween(Property::Opacity, 0.0, 2.0, 1.0, 0.5);
    let anims = vec![a.clone(), b.clone()];

    for i in 0..=20 {
        let t = f64::from(i) * 0.1;
        let expect = a.value_at(t).unwrap() * b.value_at(t).unwrap();
        let out = resolve_transform(&base(), &anims, t, 0.0);
        assert!(
            (out.opacity - expect.clamp(0.0, 1.0)).abs() < 1e-12,
            "t={t}"
        );
    }
}

#[test]
fn concurrent_rotation_animations_sum() {
    let a = Animation::tween(Property::Rotation, 0.0, 4.0, 0.0, 90.0);
    let b = Animation::tween(Property::Rotation, 1.0, 2.0, 0.0, -30.0);
    let anims = vec![a.clone(), b.clone()];

    for i in 0..=20 {
        let t = f64::from(i) * 0.2;
        let expect = a.value_at(t).unwrap_or(0.0) + b.value_at(t).unwrap_or(0.0);
        let out = resolve_transform(&base(), &anims, t, 0.0);
        assert!((out.rotation - expect).abs() < 1e-12, "t={t}");
    }
}

#[test]
fn rotation_axes_resolve_separately_but_pool_in_2d() {
    let anims = vec![
        Animation::tween(Property::Rotation, 0.0, 2.0, 0.0, 10.0),
        Animation::tween(Property::RotationX, 0.0, 2.0, 0.0, 20.0),
        Animation::tween(Property::RotationY, 0.0, 2.0, 0.0, 30.0),
        Animation::tween(Property::RotationZ, 0.0, 2.0, 0.0, 40.0),
    ];
    let out = resolve_transform(&base(), &anims, 2.0, 0.0);
    assert!((out.rotation - 10.0).abs() < 1e-12);
    assert!((out.rotation_x - 20.0).abs() < 1e-12);
    assert!((out.rotation_y - 30.0).abs() < 1e-12);
    assert!((out.rotation_z - 40.0).abs() < 1e-12);
    // All four feed the single additive 2D pool.
    assert!((out.effective_rotation_2d() - 100.0).abs() < 1e-12);
}

#[test]
fn translate_z_last_writer_wins() {
    let anims = vec![
        Animation::tween(Property::TranslateZ, 0.0, 2.0, 0.0, 5.0),
        Animation::tween(Property::TranslateZ, 0.0, 2.0, 0.0, 9.0),
    ];
    let out = resolve_transform(&base(), &anims, 2.0, 0.0);
    assert!((out.translate_z - 9.0).abs() < 1e-12);
}

/// scaleX anim1 over [0,2) 0->1, anim2 over [1,3) 1->2: running beats
/// finished, latest start breaks ties, last window end supplies the terminal
/// value.
#[test]
fn sequential_scale_steps_scenario() {
    let anim1 = Animation::tween(Property::ScaleX, 0.0, 2.0, 0.0, 1.0);
    let anim2 = Animation::tween(Property::ScaleX, 1.0, 2.0, 1.0, 2.0);
    let anims = vec![anim1.clone(), anim2.clone()];

    let at = |t: f64| resolve_transform(&base(), &anims, t, 0.0).scale_x;

    assert!((at(0.5) - anim1.value_at(0.5).unwrap()).abs() < 1e-12);
    // anim2 is running and started later, so it wins while both run.
    assert!((at(1.5) - anim2.value_at(1.5).unwrap()).abs() < 1e-12);
    assert!((at(2.5) - anim2.value_at(2.5).unwrap()).abs() < 1e-12);
    // Both ended; anim2's window ended later, so its `to` holds.
    assert!((at(3.5) - 2.0).abs() < 1e-12);
}

#[test]
fn scale_before_any_start_uses_first_animation() {
    let anims = vec![Animation::tween(Property::ScaleX, 5.0, 1.0, 0.25, 1.0)];
    let out = resolve_transform(&base(), &anims, 1.0, 0.0);
    // fill=Both holds `from` before the window.
    assert!((out.scale_x - 0.25).abs() < 1e-12);

    let anims = vec![
        Animation::tween(Property::ScaleX, 5.0, 1.0, 0.25, 1.0).with_fill(Fill::None),
    ];
    let out = resolve_transform(&base(), &anims, 1.0, 0.0);
    // No value yet: fall back to the base scale.
    assert!((out.scale_x - 1.0).abs() < 1e-12);
}

#[test]
fn scale_without_contributors_keeps_base() {
    let start = TransformState {
        scale_y: 3.0,
        ..TransformState::default()
    };
    let out = resolve_transform(&start, &[], 1.0, 0.0);
    assert!((out.scale_y - 3.0).abs() < 1e-12);
}

#[test]
fn opacity_forced_zero_before_visibility_while_position_resolves() {
    let anims = vec![
        Animation::tween(Property::X, 0.0, 2.0, 0.0, 10.0),
        Animation::tween(Property::Opacity, 0.0, 2.0, 1.0, 1.0),
    ];
    let out = resolve_transform(&base(), &anims, 1.0, 1.5);
    assert_eq!(out.opacity, 0.0);
    // Offset/absolute animations still pre-stage position.
    assert!((out.x - 5.0).abs() < 1e-12);

    let after = resolve_transform(&base(), &anims, 1.5, 1.5);
    assert!(after.opacity > 0.0);
}
