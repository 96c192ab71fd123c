//! MIME type support registry
//!
//! Tri-state support per `<source type>`. Types that need a probe start as
//! [`MimeStatus::Unknown`]; the first lookup runs the probe exactly once.
//! Asynchronous probes report back through a channel drained by the
//! controller between passes.

use std::collections::HashMap;
use std::fmt;

use smol::channel::{self, Receiver, Sender};

use crate::host::Host;

/// 1x1 lossless WebP; decodes to width 1 where WebP is supported
pub const WEBP_PROBE_URI: &str =
    "data:image/webp;base64,UklGRh4AAABXRUJQVlA4TBEAAAAvAAAAAAfQ//73v/+BiOh/AAA=";

/// Types every host decodes
const BUILTIN_TYPES: &[&str] = &["image/jpeg", "image/gif", "image/png"];

/// Result of a finished probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub mime: String,
    pub supported: bool,
}

/// Handed to an asynchronous probe; resolving it schedules re-selection
#[derive(Debug)]
pub struct ProbeResolver {
    mime: String,
    sender: Sender<ProbeOutcome>,
}

impl ProbeResolver {
    /// MIME type being probed
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn resolve(self, supported: bool) {
        let outcome = ProbeOutcome { mime: self.mime, supported };
        if let Err(err) = self.sender.try_send(outcome) {
            tracing::debug!("Probe for {} resolved after registry dropped", err.into_inner().mime);
        }
    }

    /// Resolve from the decoded width of a 1x1 probe image
    pub fn resolve_with_width(self, width: u32) {
        self.resolve(width == 1);
    }
}

/// Support probe for a MIME type
pub enum Probe<H: Host> {
    /// Answered on the spot from a host capability
    Sync(Box<dyn FnOnce(&H) -> bool>),
    /// Fire-and-forget; answers later through the resolver
    Async(Box<dyn FnOnce(&mut H, ProbeResolver)>),
}

/// Registry entry
pub enum MimeStatus<H: Host> {
    Supported,
    Unsupported,
    /// Probe running
    Pending,
    /// Probe not run yet
    Unknown(Probe<H>),
}

impl<H: Host> fmt::Debug for MimeStatus<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MimeStatus::Supported => f.write_str("Supported"),
            MimeStatus::Unsupported => f.write_str("Unsupported"),
            MimeStatus::Pending => f.write_str("Pending"),
            MimeStatus::Unknown(Probe::Sync(_)) => f.write_str("Unknown(Sync)"),
            MimeStatus::Unknown(Probe::Async(_)) => f.write_str("Unknown(Async)"),
        }
    }
}

/// Answer to "can this `<source>` be used"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSupport {
    Supported,
    Unsupported,
    Pending,
}

impl From<bool> for TypeSupport {
    fn from(supported: bool) -> Self {
        if supported { TypeSupport::Supported } else { TypeSupport::Unsupported }
    }
}

/// MIME support registry, one per controller
pub struct MimeRegistry<H: Host> {
    types: HashMap<String, MimeStatus<H>>,
    sender: Sender<ProbeOutcome>,
    receiver: Receiver<ProbeOutcome>,
}

impl<H: Host> fmt::Debug for MimeRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MimeRegistry").field("types", &self.types).finish()
    }
}

impl<H: Host + 'static> Default for MimeRegistry<H> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<H: Host> MimeRegistry<H> {
    /// Registry with no known types; everything is unsupported
    pub fn empty() -> Self {
        let (sender, receiver) = channel::unbounded();
        Self { types: HashMap::new(), sender, receiver }
    }

    pub fn insert(&mut self, mime: &str, status: MimeStatus<H>) {
        self.types.insert(normalize(mime), status);
    }

    /// Current entry, without running any probe
    pub fn get(&self, mime: &str) -> Option<&MimeStatus<H>> {
        self.types.get(&normalize(mime))
    }

    /// Support for `mime`, running its probe on first use.
    ///
    /// Unlisted types are unsupported. A synchronous probe settles
    /// immediately; an asynchronous one leaves the type pending until its
    /// outcome is applied.
    pub fn support(&mut self, mime: &str, host: &mut H) -> TypeSupport {
        let key = normalize(mime);
        let Some(status) = self.types.get_mut(&key) else {
            return TypeSupport::Unsupported;
        };

        match std::mem::replace(status, MimeStatus::Pending) {
            MimeStatus::Supported => {
                *status = MimeStatus::Supported;
                TypeSupport::Supported
            }
            MimeStatus::Unsupported => {
                *status = MimeStatus::Unsupported;
                TypeSupport::Unsupported
            }
            MimeStatus::Pending => TypeSupport::Pending,
            MimeStatus::Unknown(Probe::Sync(check)) => {
                let supported = check(host);
                tracing::debug!("{} support: {}", key, supported);
                *status = settled(supported);
                supported.into()
            }
            MimeStatus::Unknown(Probe::Async(probe)) => {
                tracing::debug!("Probing {}", key);
                let resolver = ProbeResolver { mime: key, sender: self.sender.clone() };
                probe(host, resolver);
                TypeSupport::Pending
            }
        }
    }

    /// Record a probe outcome
    pub fn apply(&mut self, outcome: &ProbeOutcome) {
        tracing::debug!("{} support: {}", outcome.mime, outcome.supported);
        self.types.insert(normalize(&outcome.mime), settled(outcome.supported));
    }

    /// Apply every outcome received so far; returns how many were applied
    pub fn drain_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.receiver.try_recv() {
            self.apply(&outcome);
            applied += 1;
        }
        applied
    }

    /// Receiver side of the probe channel, for hosts that await outcomes
    pub fn outcomes(&self) -> Receiver<ProbeOutcome> {
        self.receiver.clone()
    }
}

impl<H: Host + 'static> MimeRegistry<H> {
    /// Built-in raster types, an SVG capability check and a WebP probe
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        for mime in BUILTIN_TYPES {
            registry.insert(mime, MimeStatus::Supported);
        }
        registry.insert(
            "image/svg+xml",
            MimeStatus::Unknown(Probe::Sync(Box::new(|host: &H| host.supports_svg()))),
        );
        registry.insert(
            "image/webp",
            MimeStatus::Unknown(Probe::Async(Box::new(|host: &mut H, resolver: ProbeResolver| {
                host.probe_image("image/webp", WEBP_PROBE_URI, resolver);
            }))),
        );

        registry
    }
}

fn settled<H: Host>(supported: bool) -> MimeStatus<H> {
    if supported { MimeStatus::Supported } else { MimeStatus::Unsupported }
}

fn normalize(mime: &str) -> String {
    mime.trim().to_ascii_lowercase()
}
