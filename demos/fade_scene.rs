use scenecast::{
    Animation, Canvas, Ease, Fps, Property, RenderOpts, SolidElement, TimelineBuilder,
    TransitionSpec, encoder_available, render,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    if !encoder_available() {
        eprintln!("ffmpeg not found on PATH, nothing to do");
        return Ok(());
    }

    let canvas = Canvas {
        width: 640,
        height: 360,
    };
    let fps = Fps::new(30, 1)?;

    let title = SolidElement::new(canvas, 0.0, 3.0, 1, [220, 60, 60, 255]).with_animation(
        Animation::tween(Property::Opacity, 0.0, 1.0, 0.0, 1.0).with_ease(Ease::OutCubic),
    );
    let backdrop = SolidElement::new(canvas, 0.0, 6.0, 0, [24, 24, 32, 255]);

    let mut timeline = TimelineBuilder::new(canvas, fps, 6.0)
        .element(Box::new(title))
        .element(Box::new(backdrop))
        .transition(TransitionSpec::new("crossfade", 2.5, 1.0))
        .build()?;

    let out = render(&mut timeline, "fade_scene.mp4", &RenderOpts::default())?;
    println!("wrote {}", out.display());
    Ok(())
}
