//! Example: responsive image selection on an in-memory document
//!
//! Run with `RUST_LOG=fos_picture=trace` to see every decision.

use std::time::Duration;

use fos_picture::dom::Document;
use fos_picture::{Config, Host, SelectionController};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut doc = Document::new("https://example.com/gallery/")?;
    doc.device_pixel_ratio = 2.0;
    doc.viewport_width = 1280.0;

    let picture = doc.append_element(doc.root(), "picture", &[]);
    doc.append_element(
        picture,
        "source",
        &[("srcset", "hero-800.webp 800w, hero-1600.webp 1600w"), ("type", "image/webp")],
    );
    doc.append_element(
        picture,
        "source",
        &[("srcset", "hero-800.jpg 800w, hero-1600.jpg 1600w, hero-3200.jpg 3200w")],
    );
    let hero = doc.append_element(picture, "img", &[("sizes", "(min-width: 60em) 50vw, 100vw")]);
    let thumb = doc.append_element(doc.root(), "img", &[("srcset", "thumb.jpg 1x, thumb@2x.jpg 2x")]);

    let config = Config::from_json(r#"{ "resize_debounce_ms": 100 }"#)?;
    let mut controller = SelectionController::new(config);

    println!("fOS Picture v{}", fos_picture::VERSION);

    let outcomes = controller.probe_outcomes();
    let report = controller.start(&mut doc);
    println!("Initial pass: {:?}", report);

    // Answer the WebP probe the way a decoder callback would
    for probe in doc.take_probes() {
        println!("Probing {} support", probe.mime);
        probe.resolver.resolve_with_width(1);
    }
    let outcome = smol::block_on(outcomes.recv())?;
    controller.apply_probe_outcome(&mut doc, outcome);

    println!("hero  -> {}", doc.current_src(hero).unwrap_or_default());
    println!("thumb -> {}", doc.current_src(thumb).unwrap_or_default());

    // Phone-sized viewport
    doc.viewport_width = 390.0;
    controller.notify_resize();
    controller.advance(&mut doc, Duration::from_millis(100));
    println!("hero after resize -> {}", doc.current_src(hero).unwrap_or_default());

    doc.finish_load(hero, 800);
    controller.advance(&mut doc, Duration::from_millis(50));
    println!("hero width attribute: {:?}", doc.get_attr(hero, "width"));

    Ok(())
}
