//! Host capabilities
//!
//! Everything the selection core needs from the embedding document: tree
//! walking, attributes, media queries, length measurement and the image
//! element's live state.

use std::fmt::Debug;
use std::hash::Hash;

use url::Url;

use crate::mime::ProbeResolver;

/// Node classification as far as picture selection cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `<img>` placeholder
    Image,
    /// `<source>` declaration
    Source,
    /// `<picture>` container
    Picture,
    /// Any other element
    Element,
    /// Text, comments and other non-element nodes
    Other,
}

impl NodeKind {
    pub fn is_element(self) -> bool {
        !matches!(self, NodeKind::Other)
    }
}

/// What the host already does natively for responsive images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeSupport {
    /// Host reads `srcset` (at least `x` descriptors) by itself
    pub srcset: bool,
    /// Host honors `sizes` and `w` descriptors
    pub sizes: bool,
}

impl NativeSupport {
    pub const NONE: NativeSupport = NativeSupport { srcset: false, sizes: false };
    pub const FULL: NativeSupport = NativeSupport { srcset: true, sizes: true };
    /// `x` descriptors only
    pub const PARTIAL: NativeSupport = NativeSupport { srcset: true, sizes: false };
}

/// Document and environment access for the selection core
pub trait Host {
    /// Stable node identity, used as the side-table key
    type Node: Copy + Eq + Hash + Debug;

    // --- environment -----------------------------------------------------

    /// Does the media condition currently hold
    fn media_matches(&self, condition: &str) -> bool;

    /// Measure a CSS length in CSS pixels on a block at the top of the
    /// document. Must return the viewport width when the result is <= 0.
    fn measure_length(&self, css_length: &str) -> f64;

    fn device_pixel_ratio(&self) -> f64;

    /// Document was delivered over a secure transport
    fn is_secure_context(&self) -> bool;

    /// Base URL candidate URLs resolve against
    fn base_url(&self) -> Option<Url>;

    fn native_support(&self) -> NativeSupport;

    /// Synchronous SVG capability check
    fn supports_svg(&self) -> bool;

    /// Decode `data_uri` off-thread and report support through `resolver`.
    ///
    /// Called at most once per MIME type.
    fn probe_image(&mut self, mime: &str, data_uri: &str, resolver: ProbeResolver);

    /// Engine fails to repaint an image after a source swap
    fn has_zoom_repaint_defect(&self) -> bool {
        false
    }

    /// Document is still being parsed
    fn is_loading(&self) -> bool {
        false
    }

    // --- tree ------------------------------------------------------------

    /// Every image placeholder, in document order
    fn placeholders(&self) -> Vec<Self::Node>;

    fn kind(&self, node: Self::Node) -> NodeKind;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Child nodes, in document order
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    // --- attributes ------------------------------------------------------

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    // --- image state -----------------------------------------------------

    /// Absolute URL of the resource currently shown
    fn current_src(&self, node: Self::Node) -> Option<String>;

    fn set_src(&mut self, node: Self::Node, url: &str);

    /// Mirror of the effective source (`currentSrc`)
    fn set_current_src(&mut self, node: Self::Node, url: &str);

    fn natural_width(&self, node: Self::Node) -> u32;

    /// Image finished loading
    fn is_complete(&self, node: Self::Node) -> bool;

    fn style(&self, node: Self::Node, property: &str) -> Option<String>;

    fn set_style(&mut self, node: Self::Node, property: &str, value: Option<&str>);

    /// Force a synchronous layout of `node`
    fn flush_layout(&mut self, node: Self::Node);
}
