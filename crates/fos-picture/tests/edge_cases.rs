//! Edge case tests for fos-picture
//!
//! Degenerate documents, malformed attributes and configuration input.

use std::time::Duration;

use fos_picture::dom::Document;
use fos_picture::{Config, Host, PictureError, SelectionController};

fn doc() -> Document {
    Document::new("https://example.com/photos/").unwrap()
}

fn controller() -> SelectionController<Document> {
    SelectionController::new(Config::default())
}

// ============================================================================
// DOCUMENT SHAPES
// ============================================================================

#[test]
fn test_empty_document() {
    let mut doc = doc();
    let report = controller().start(&mut doc);

    assert_eq!(report.evaluated, 0);
    assert_eq!(report.deferred, 0);
}

#[test]
fn test_picture_without_candidates() {
    let mut doc = doc();
    let picture = doc.append_element(doc.root(), "picture", &[]);
    doc.append_element(picture, "source", &[("media", "(min-width: 1px)")]);
    let img = doc.append_element(picture, "img", &[]);
    let mut controller = controller();

    let report = controller.evaluate(&mut doc, None, false);

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.swapped, 0);
    assert!(controller.state(img).unwrap().evaluated);
    assert_eq!(doc.current_src(img), None);
}

#[test]
fn test_blank_srcset() {
    let mut doc = doc();
    let img = doc.append_element(doc.root(), "img", &[("srcset", " , ,")]);

    let report = controller().evaluate(&mut doc, None, false);

    assert_eq!(report.swapped, 0);
    assert_eq!(doc.current_src(img), None);
}

#[test]
fn test_trailing_comma_candidate() {
    let mut doc = doc();
    let img = doc.append_element(doc.root(), "img", &[("srcset", "b.jpg,")]);

    controller().evaluate(&mut doc, None, false);

    assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/photos/b.jpg"));
}

#[test]
fn test_explicit_targets_only() {
    let mut doc = doc();
    let first = doc.append_element(doc.root(), "img", &[("srcset", "a.jpg")]);
    let second = doc.append_element(doc.root(), "img", &[("srcset", "b.jpg")]);
    let mut controller = controller();

    let report = controller.evaluate(&mut doc, Some(&[second]), false);

    assert_eq!(report.evaluated, 1);
    assert!(controller.state(first).is_none());
    assert_eq!(doc.current_src(second).as_deref(), Some("https://example.com/photos/b.jpg"));
}

#[test]
fn test_non_image_targets_skipped() {
    let mut doc = doc();
    let div = doc.append_element(doc.root(), "div", &[("srcset", "a.jpg")]);
    let mut controller = controller();

    let report = controller.evaluate(&mut doc, Some(&[div]), true);

    assert_eq!(report.evaluated, 0);
    assert!(controller.state(div).is_none());
}

#[test]
fn test_nested_picture_content() {
    let mut doc = doc();
    let picture = doc.append_element(doc.root(), "picture", &[]);
    let wrapper = doc.append_element(picture, "span", &[]);
    let img = doc.append_element(wrapper, "img", &[("srcset", "a.jpg")]);

    controller().evaluate(&mut doc, None, false);

    // Parent is not the picture: a plain responsive image
    assert_eq!(doc.get_attr(img, "srcset"), Some("a.jpg"));
    assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/photos/a.jpg"));
}

// ============================================================================
// URLS
// ============================================================================

#[test]
fn test_relative_urls_resolved() {
    let mut doc = doc();
    let img = doc.append_element(doc.root(), "img", &[("srcset", "../shared/a.jpg")]);

    controller().evaluate(&mut doc, None, false);

    assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/shared/a.jpg"));
}

#[test]
fn test_data_uri_candidate() {
    let mut doc = doc();
    let img = doc.append_element(doc.root(), "img", &[("srcset", "data:image/gif;base64,R0lGOD 1x")]);

    controller().evaluate(&mut doc, None, false);

    assert_eq!(doc.current_src(img).as_deref(), Some("data:image/gif;base64,R0lGOD"));
}

#[test]
fn test_invalid_url_keeps_state() {
    let mut doc = doc();
    let img = doc.append_element(doc.root(), "img", &[("src", "old.jpg"), ("srcset", "http://[broken/x.jpg")]);
    let mut controller = controller();

    let report = controller.evaluate(&mut doc, None, false);

    assert_eq!(report.evaluated, 1);
    assert_eq!(report.swapped, 0);
    assert_eq!(report.blocked, 0);
    assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/photos/old.jpg"));
}

#[test]
fn test_uppercase_http_blocked() {
    let mut doc = doc();
    let img = doc.append_element(doc.root(), "img", &[("srcset", "HTTP://insecure.test/a.jpg")]);

    let report = controller().evaluate(&mut doc, None, false);

    assert_eq!(report.blocked, 1);
    assert_eq!(doc.current_src(img), None);
}

// ============================================================================
// SIZES
// ============================================================================

#[test]
fn test_unsupported_sizes_length_falls_back() {
    let mut doc = doc();
    doc.viewport_width = 800.0;
    let img = doc.append_element(
        doc.root(),
        "img",
        &[("srcset", "a.jpg 800w, b.jpg 1600w"), ("sizes", "calc(50vw - 10px)")],
    );

    controller().evaluate(&mut doc, None, false);

    // calc() is not measurable here, so the viewport width is used
    assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/photos/a.jpg"));
}

#[test]
fn test_unknown_media_uses_override() {
    let mut doc = doc();
    doc.media_overrides.insert("(orientation: portrait)".into(), true);
    let img = doc.append_element(
        doc.root(),
        "img",
        &[("srcset", "a.jpg 256w, b.jpg 1024w"), ("sizes", "(orientation: portrait) 256px, 100vw")],
    );

    controller().evaluate(&mut doc, None, false);

    assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/photos/a.jpg"));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_config_from_json() {
    let config = Config::from_json(r#"{"resize_debounce_ms": 10, "srcset_marker": null}"#).unwrap();

    assert_eq!(config.resize_debounce(), Duration::from_millis(10));
    assert_eq!(config.srcset_marker, None);
    assert!(config.intrinsic_size);
}

#[test]
fn test_config_rejects_garbage() {
    assert!(matches!(Config::from_json("{"), Err(PictureError::Config(_))));
}

#[test]
fn test_custom_debounce() {
    let mut doc = doc();
    doc.append_element(doc.root(), "img", &[("srcset", "a.jpg")]);
    let config = Config::from_json(r#"{"resize_debounce_ms": 10, "intrinsic_size": false}"#).unwrap();
    let mut controller = SelectionController::new(config);

    controller.start(&mut doc);
    controller.notify_resize();
    let report = controller.advance(&mut doc, Duration::from_millis(10));

    assert_eq!(report.evaluated, 1);
}
