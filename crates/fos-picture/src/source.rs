//! `<source>` matching
//!
//! Walks a `<picture>`'s children in document order up to the placeholder
//! image. The first `<source>` whose media condition holds and whose type
//! is supported wins.

use crate::host::{Host, NodeKind};
use crate::mime::{MimeRegistry, TypeSupport};

/// Outcome of matching a picture's sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMatch<N> {
    /// Use this `<source>`'s srcset/sizes
    Found(N),
    /// Fall back to the image's own attributes
    NotFound,
    /// A type probe is still running; try again later
    Pending,
}

/// Find the `<source>` that applies to `placeholder` inside `picture`.
///
/// Only sources before the placeholder count. A pending type stops the
/// scan immediately: a later source must not win while an earlier one
/// might still turn out to be supported.
pub fn match_source<H: Host>(
    host: &mut H,
    registry: &mut MimeRegistry<H>,
    placeholder: H::Node,
    picture: H::Node,
) -> SourceMatch<H::Node> {
    let mut matched = None;

    for child in host.children(picture) {
        let kind = host.kind(child);
        if !kind.is_element() {
            continue;
        }
        if child == placeholder {
            break;
        }
        if kind != NodeKind::Source {
            continue;
        }

        if host.attribute(child, "src").is_some() {
            tracing::warn!(
                "The `src` attribute is invalid on `picture` `source` element; instead, use `srcset` ({:?})",
                child
            );
        }

        if !host.attribute(child, "srcset").is_some_and(|s| !s.is_empty()) {
            continue;
        }

        if let Some(media) = host.attribute(child, "media").filter(|m| !m.is_empty()) {
            if !host.media_matches(&media) {
                continue;
            }
        }

        let support = match host.attribute(child, "type") {
            Some(mime) if !mime.trim().is_empty() => registry.support(&mime, host),
            _ => TypeSupport::Supported,
        };

        match support {
            TypeSupport::Supported => {
                matched = Some(child);
                break;
            }
            TypeSupport::Pending => {
                tracing::trace!("Source {:?} waits on a type probe", child);
                return SourceMatch::Pending;
            }
            TypeSupport::Unsupported => {}
        }
    }

    matched.map_or(SourceMatch::NotFound, SourceMatch::Found)
}
