use anyhow::{Context, Result};
use clap::Parser;
use imgframe_config::ImgframeConfig;
use imgframe_transform::animation::{AnimationEvent, Animator, EasingFunction, IntervalFrameClock};
use imgframe_transform::{
    AffineMatrix, ImageElement, StyleDescriptor, TransformStore, wait_for_ready,
};
use pollster::FutureExt;
use std::path::PathBuf;
use std::rc::Rc;

/// Animate an image transform headlessly, printing every committed style.
#[derive(Debug, Parser)]
#[command(name = "imgframe", version)]
struct Cli {
    /// Config file (defaults to ./imgframe.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Image to wait for before animating
    #[arg(long)]
    image: Option<PathBuf>,

    /// Target uniform scale
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Target rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotate: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    translate_x: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    translate_y: f64,

    /// Zoom about this point instead of the origin (requires --anchor-y)
    #[arg(long, requires = "anchor_y", allow_hyphen_values = true)]
    anchor_x: Option<f64>,

    #[arg(long, requires = "anchor_x", allow_hyphen_values = true)]
    anchor_y: Option<f64>,

    /// Animation duration in milliseconds (overrides config)
    #[arg(long)]
    duration_ms: Option<f64>,

    /// linear, ease-in-out or cubic-bezier(x1, y1, x2, y2) (overrides config)
    #[arg(long)]
    easing: Option<EasingFunction>,
}

impl Cli {
    fn target(&self) -> AffineMatrix {
        let pan = AffineMatrix::translate(self.translate_x, self.translate_y);
        match (self.anchor_x, self.anchor_y) {
            (Some(x), Some(y)) => AffineMatrix::rotate_deg(self.rotate)
                .zoom_about(x, y, self.scale)
                .pre_multiply(&pan),
            _ => pan
                .then(&AffineMatrix::rotate_deg(self.rotate))
                .then(&AffineMatrix::scale_uniform(self.scale)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ImgframeConfig::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ImgframeConfig::load_or_default(),
    };
    config.merge_with_env();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    let store = TransformStore::new();
    store.attach_surface(Box::new(|style: &StyleDescriptor| println!("{style}")));

    match cli.image.as_ref().or(config.demo.image.as_ref()) {
        Some(path) => {
            let element = Rc::new(ImageElement::new());
            let ready = wait_for_ready(Some(element.clone()));
            if let Ok((width, height)) = element.load_path(path) {
                log::info!("loaded {} ({width}x{height})", path.display());
            }
            ready.block_on();
        }
        None => log::debug!("no image given; animating without one"),
    }

    let duration_ms = cli.duration_ms.unwrap_or(config.animation.duration_ms);
    let easing = cli.easing.unwrap_or(config.animation.easing);
    let clock = IntervalFrameClock::from_millis(config.clock.frame_interval_ms);
    let animator = Animator::new(store.clone(), clock)
        .with_easing(easing)
        .with_default_duration(duration_ms);

    let target = cli.target();
    log::info!("animating to {target:?} over {duration_ms}ms ({easing})");
    let outcome = animator.animate_to(target).block_on();

    let frames = animator
        .drain_events()
        .iter()
        .filter(|e| matches!(e, AnimationEvent::Frame { .. }))
        .count();
    log::info!("{outcome:?} after {frames} frames");

    let d = store.decomposed();
    println!(
        "translate=({}, {}) scale={} rotation={}deg",
        d.translate_x, d.translate_y, d.scale, d.rotation_deg
    );

    Ok(())
}
