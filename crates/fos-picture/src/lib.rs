//! fOS Picture
//!
//! Responsive image selection for documents whose engine lacks (or only
//! partly has) native `picture`/`srcset`/`sizes` support.
//!
//! The [`SelectionController`] walks a [`Host`] document, matches
//! `<source>` declarations, picks the best candidate for the viewport and
//! pixel density and swaps the placeholder image to it. Parsing and
//! candidate selection live in [`fos_srcset`].

mod config;
mod controller;
mod host;
mod mime;
mod security;
mod source;
mod state;
mod timers;

pub mod dom;

pub use config::Config;
pub use controller::{PassReport, SelectionController};
pub use host::{Host, NativeSupport, NodeKind};
pub use mime::{
    MimeRegistry, MimeStatus, Probe, ProbeOutcome, ProbeResolver, TypeSupport, WEBP_PROBE_URI,
};
pub use security::{MixedContentGuard, resolve_url};
pub use source::{SourceMatch, match_source};
pub use state::{PlaceholderState, PlaceholderTable};
pub use timers::{Scheduler, TimerId};

/// Picture selection version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Picture selection error
#[derive(Debug, thiserror::Error)]
pub enum PictureError {
    #[error("Mixed content blocked: {0}")]
    MixedContentBlocked(String),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
