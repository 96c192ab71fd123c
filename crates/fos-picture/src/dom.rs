//! In-memory document
//!
//! Arena-backed element tree implementing [`Host`]. It carries just enough
//! environment (viewport, pixel ratio, native support flags) to drive the
//! selection core without a browser: the demo and the tests run on it.

use std::collections::HashMap;

use url::Url;

use crate::host::{Host, NativeSupport, NodeKind};
use crate::mime::ProbeResolver;
use crate::PictureError;

/// Root font size used for `em` lengths
const ROOT_FONT_SIZE: f64 = 16.0;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Load state of an `<img>`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageState {
    pub src: Option<String>,
    pub current_src: Option<String>,
    pub natural_width: u32,
    pub complete: bool,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug)]
enum NodeData {
    Document,
    Element(ElementData),
    Text,
}

#[derive(Debug)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    styles: HashMap<String, String>,
    image: ImageState,
}

/// Type probe waiting for the test or embedder to answer
#[derive(Debug)]
pub struct PendingProbe {
    pub mime: String,
    pub data_uri: String,
    pub resolver: ProbeResolver,
}

/// In-memory HTML document
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    url: Url,

    /// Layout viewport width in CSS pixels
    pub viewport_width: f64,
    pub device_pixel_ratio: f64,
    pub native: NativeSupport,
    pub svg: bool,
    /// Answer WebP probes on the spot instead of queueing them
    pub webp: Option<bool>,
    pub loading: bool,
    pub zoom_defect: bool,
    /// Fixed answers for media conditions the evaluator doesn't understand
    pub media_overrides: HashMap<String, bool>,

    probes: Vec<PendingProbe>,
    layout_flushes: usize,
}

impl Document {
    /// Create an empty document at `url`
    pub fn new(url: &str) -> Result<Self, PictureError> {
        let url = Url::parse(url).map_err(|source| PictureError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            nodes: vec![Node { parent: None, children: Vec::new(), data: NodeData::Document }],
            url,
            viewport_width: 1024.0,
            device_pixel_ratio: 1.0,
            native: NativeSupport::NONE,
            svg: true,
            webp: None,
            loading: false,
            zoom_defect: false,
            media_overrides: HashMap::new(),
            probes: Vec::new(),
            layout_flushes: 0,
        })
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element(ElementData {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            styles: HashMap::new(),
            image: ImageState::default(),
        }))
    }

    /// Create a detached text node
    pub fn create_text(&mut self) -> NodeId {
        self.push(NodeData::Text)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { parent: None, children: Vec::new(), data });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// Unlink `node` from its parent; the node stays in the arena
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != node);
        }
    }

    /// Create `<tag>` with attributes and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        let node = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attr(node, name, value);
        }
        self.append_child(parent, node);
        node
    }

    /// Set an attribute; `src` also restarts the image load
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let src = (name == "src").then(|| {
            self.url.join(value).map(String::from).unwrap_or_else(|_| value.to_string())
        });

        let Some(element) = self.element_mut(node) else {
            return;
        };
        if let Some(src) = src {
            element.image.src = Some(src);
            element.image.natural_width = 0;
            element.image.complete = false;
        }
        match element.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => element.attributes.push((name, value.to_string())),
        }
    }

    pub fn get_attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn image(&self, node: NodeId) -> Option<&ImageState> {
        self.element(node).map(|e| &e.image)
    }

    /// Simulate the image finishing its load
    pub fn finish_load(&mut self, node: NodeId, natural_width: u32) {
        if let Some(element) = self.element_mut(node) {
            element.image.complete = true;
            element.image.natural_width = natural_width;
        }
    }

    /// Probes queued by [`Host::probe_image`]
    pub fn take_probes(&mut self) -> Vec<PendingProbe> {
        std::mem::take(&mut self.probes)
    }

    /// Number of forced layouts so far
    pub fn layout_flushes(&self) -> usize {
        self.layout_flushes
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(node.index())?.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.index())?.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag.as_str())
    }

    fn collect_images(&self, node: NodeId, out: &mut Vec<NodeId>) {
        if self.tag(node) == Some("img") {
            let in_picture = self.nodes[node.index()]
                .parent
                .is_some_and(|p| self.tag(p) == Some("picture"));
            if in_picture || self.get_attr(node, "srcset").is_some() {
                out.push(node);
            }
        }
        for &child in &self.nodes[node.index()].children {
            self.collect_images(child, out);
        }
    }

    /// Evaluate `(min-width: ...)`/`(max-width: ...)` features joined by `and`
    fn evaluate_media(&self, condition: &str) -> bool {
        condition
            .split(" and ")
            .map(|feature| feature.trim().trim_start_matches('(').trim_end_matches(')'))
            .all(|feature| {
                let Some((name, value)) = feature.split_once(':') else {
                    return matches!(feature, "all" | "screen");
                };
                let Some(px) = self.css_pixels(value.trim()) else {
                    return false;
                };
                match name.trim() {
                    "min-width" => self.viewport_width >= px,
                    "max-width" => self.viewport_width <= px,
                    _ => false,
                }
            })
    }

    fn css_pixels(&self, length: &str) -> Option<f64> {
        if let Some(v) = length.strip_suffix("px") {
            return v.trim().parse().ok();
        }
        if let Some(v) = length.strip_suffix("em") {
            return v.trim().parse::<f64>().ok().map(|em| em * ROOT_FONT_SIZE);
        }
        if let Some(v) = length.strip_suffix('%') {
            return v.trim().parse::<f64>().ok().map(|p| self.viewport_width * p / 100.0);
        }
        None
    }
}

impl Host for Document {
    type Node = NodeId;

    fn media_matches(&self, condition: &str) -> bool {
        match self.media_overrides.get(condition) {
            Some(&matches) => matches,
            None => self.evaluate_media(condition),
        }
    }

    fn measure_length(&self, css_length: &str) -> f64 {
        // calc() is not evaluated here, which takes the viewport fallback
        match self.css_pixels(css_length.trim()) {
            Some(px) if px > 0.0 => px,
            _ => self.viewport_width,
        }
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    fn is_secure_context(&self) -> bool {
        self.url.scheme() == "https"
    }

    fn base_url(&self) -> Option<Url> {
        Some(self.url.clone())
    }

    fn native_support(&self) -> NativeSupport {
        self.native
    }

    fn supports_svg(&self) -> bool {
        self.svg
    }

    fn probe_image(&mut self, mime: &str, data_uri: &str, resolver: ProbeResolver) {
        match self.webp {
            Some(supported) => resolver.resolve_with_width(if supported { 1 } else { 0 }),
            None => self.probes.push(PendingProbe {
                mime: mime.to_string(),
                data_uri: data_uri.to_string(),
                resolver,
            }),
        }
    }

    fn has_zoom_repaint_defect(&self) -> bool {
        self.zoom_defect
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn placeholders(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_images(NodeId::ROOT, &mut out);
        out
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        match self.nodes.get(node.index()).map(|n| &n.data) {
            Some(NodeData::Element(e)) => match e.tag.as_str() {
                "img" => NodeKind::Image,
                "source" => NodeKind::Source,
                "picture" => NodeKind::Picture,
                _ => NodeKind::Element,
            },
            _ => NodeKind::Other,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index())?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.index())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.get_attr(node, name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.set_attr(node, name, value);
    }

    fn current_src(&self, node: NodeId) -> Option<String> {
        self.image(node)?.src.clone()
    }

    fn set_src(&mut self, node: NodeId, url: &str) {
        self.set_attr(node, "src", url);
    }

    fn set_current_src(&mut self, node: NodeId, url: &str) {
        if let Some(element) = self.element_mut(node) {
            element.image.current_src = Some(url.to_string());
        }
    }

    fn natural_width(&self, node: NodeId) -> u32 {
        self.image(node).map_or(0, |i| i.natural_width)
    }

    fn is_complete(&self, node: NodeId) -> bool {
        self.image(node).is_some_and(|i| i.complete)
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.element(node)?.styles.get(property).cloned()
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: Option<&str>) {
        if let Some(element) = self.element_mut(node) {
            match value {
                Some(v) => element.styles.insert(property.to_string(), v.to_string()),
                None => element.styles.remove(property),
            };
        }
    }

    fn flush_layout(&mut self, _node: NodeId) {
        self.layout_flushes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_building() {
        let mut doc = Document::new("https://example.com/").unwrap();
        let picture = doc.append_element(doc.root(), "picture", &[]);
        let source = doc.append_element(picture, "SOURCE", &[("srcset", "a.webp")]);
        let text = doc.create_text();
        doc.append_child(picture, text);
        let img = doc.append_element(picture, "img", &[]);

        assert_eq!(doc.children(picture), vec![source, text, img]);
        assert_eq!(doc.kind(source), NodeKind::Source);
        assert_eq!(doc.kind(text), NodeKind::Other);
        assert_eq!(doc.parent(img), Some(picture));
        assert_eq!(doc.placeholders(), vec![img]);
    }

    #[test]
    fn test_placeholders_need_picture_or_srcset() {
        let mut doc = Document::new("https://example.com/").unwrap();
        let plain = doc.append_element(doc.root(), "img", &[("src", "a.jpg")]);
        let responsive = doc.append_element(doc.root(), "img", &[("srcset", "a.jpg 1x")]);

        let found = doc.placeholders();
        assert!(!found.contains(&plain));
        assert_eq!(found, vec![responsive]);
    }

    #[test]
    fn test_detach() {
        let mut doc = Document::new("https://example.com/").unwrap();
        let img = doc.append_element(doc.root(), "img", &[("srcset", "a.jpg")]);

        doc.detach(img);
        assert!(doc.placeholders().is_empty());
        assert_eq!(doc.parent(img), None);
    }

    #[test]
    fn test_media_evaluation() {
        let mut doc = Document::new("https://example.com/").unwrap();
        doc.viewport_width = 800.0;

        assert!(doc.media_matches("(min-width: 600px)"));
        assert!(!doc.media_matches("(max-width: 600px)"));
        assert!(doc.media_matches("(min-width: 30em)"));
        assert!(doc.media_matches("(min-width: 400px) and (max-width: 900px)"));
        assert!(!doc.media_matches("(orientation: portrait)"));

        doc.media_overrides.insert("(orientation: portrait)".into(), true);
        assert!(doc.media_matches("(orientation: portrait)"));
    }

    #[test]
    fn test_measure_length() {
        let mut doc = Document::new("https://example.com/").unwrap();
        doc.viewport_width = 500.0;

        assert_eq!(doc.measure_length("50%"), 250.0);
        assert_eq!(doc.measure_length("120px"), 120.0);
        assert_eq!(doc.measure_length("2em"), 32.0);
        assert_eq!(doc.measure_length("calc(100% - 2em)"), 500.0);
        assert_eq!(doc.measure_length("0px"), 500.0);
    }

    #[test]
    fn test_secure_context_from_url() {
        assert!(Document::new("https://example.com/").unwrap().is_secure_context());
        assert!(!Document::new("http://example.com/").unwrap().is_secure_context());
        assert!(!Document::new("http://localhost:8080/").unwrap().is_secure_context());
        assert!(Document::new("not a url").is_err());
    }

    #[test]
    fn test_set_src_restarts_load() {
        let mut doc = Document::new("https://example.com/").unwrap();
        let img = doc.append_element(doc.root(), "img", &[]);

        doc.set_src(img, "https://example.com/a.jpg");
        doc.finish_load(img, 400);
        assert!(doc.is_complete(img));

        doc.set_src(img, "https://example.com/b.jpg");
        assert!(!doc.is_complete(img));
        assert_eq!(doc.natural_width(img), 0);
        assert_eq!(doc.get_attr(img, "src"), Some("https://example.com/b.jpg"));
    }

    #[test]
    fn test_src_attribute_resolves() {
        let mut doc = Document::new("https://example.com/gallery/").unwrap();
        let img = doc.append_element(doc.root(), "img", &[("src", "a.jpg")]);

        assert_eq!(doc.current_src(img).as_deref(), Some("https://example.com/gallery/a.jpg"));
    }
}
