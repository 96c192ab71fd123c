//! Candidate selection
//!
//! Picks the cheapest candidate that still satisfies the display density.

use std::cmp::Ordering;

use crate::{DescriptorResolver, RawCandidate};

/// Candidate with a resolved pixel density
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCandidate {
    /// Image URL (may be relative)
    pub url: String,
    /// Device pixels per CSS pixel, always > 0
    pub resolution: f64,
}

impl ResolvedCandidate {
    pub fn new(url: &str, resolution: f64) -> Self {
        Self {
            url: url.to_string(),
            resolution,
        }
    }
}

/// Resolve every raw candidate against the layout width.
pub fn resolve_candidates(
    raw: Vec<RawCandidate>,
    width_px: f64,
    resolver: &DescriptorResolver,
) -> Vec<ResolvedCandidate> {
    raw.into_iter()
        .map(|candidate| ResolvedCandidate {
            resolution: resolver.resolve(candidate.descriptor.as_deref(), width_px),
            url: candidate.url,
        })
        .collect()
}

/// Select the best candidate for `device_pixel_ratio`.
///
/// The smallest resolution that is at least the device pixel ratio wins;
/// when none is large enough the highest resolution is used. Input order
/// only breaks ties between equal resolutions.
pub fn select_candidate(
    mut candidates: Vec<ResolvedCandidate>,
    device_pixel_ratio: f64,
) -> Option<ResolvedCandidate> {
    // Stable, so equal resolutions keep document order
    candidates.sort_by(|a, b| a.resolution.partial_cmp(&b.resolution).unwrap_or(Ordering::Equal));

    let highest = candidates.len().checked_sub(1)?;
    let index = candidates
        .iter()
        .position(|c| c.resolution >= device_pixel_ratio)
        .unwrap_or(highest);

    Some(candidates.swap_remove(index))
}
