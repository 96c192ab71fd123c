//! Descriptor resolution
//!
//! Converts one raw descriptor (`"2x"`, `"400w"`, `"400w 2x"`) into a
//! resolution in device pixels per CSS pixel.

use crate::{leading_float, leading_integer, DEFAULT_RESOLUTION};

/// Resolves raw descriptors against a layout width
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorResolver {
    /// Host honors `w`/`h` descriptors natively; they are then left alone
    pub sizes_supported: bool,
}

impl DescriptorResolver {
    pub fn new(sizes_supported: bool) -> Self {
        Self { sizes_supported }
    }

    /// Resolution for `descriptor` given the resolved layout width.
    ///
    /// Tokens are scanned from last to first and every match overwrites the
    /// running value, so the left-most matching token decides.
    pub fn resolve(&self, descriptor: Option<&str>, width_px: f64) -> f64 {
        let Some(descriptor) = descriptor.map(str::trim).filter(|d| !d.is_empty()) else {
            return DEFAULT_RESOLUTION;
        };

        let mut resolution = None;

        for token in descriptor.split_whitespace().rev() {
            match token.chars().last() {
                Some('w') | Some('h') if !self.sizes_supported => {
                    resolution = leading_integer(token).map(|px| px as f64 / width_px);
                }
                Some('x') => {
                    resolution = Some(leading_float(token).unwrap_or(DEFAULT_RESOLUTION));
                }
                _ => {}
            }
        }

        match resolution {
            Some(r) if r.is_finite() && r > 0.0 => r,
            _ => DEFAULT_RESOLUTION,
        }
    }
}

/// Whether a srcset value carries a width descriptor (`" 640w"`).
///
/// Hosts without native `sizes` support would misread such a list, so the
/// caller takes it away from them.
pub fn has_width_descriptor(srcset: &str) -> bool {
    let bytes = srcset.as_bytes();

    for (i, &b) in bytes.iter().enumerate() {
        if !b.is_ascii_whitespace() {
            continue;
        }

        let mut j = i + 1;
        if bytes.get(j) == Some(&b'+') {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == digits_start {
            continue;
        }

        if bytes.get(j) == Some(&b'e') {
            let exp_start = j + 1;
            let mut k = exp_start;
            while k < bytes.len() && bytes[k].is_ascii_digit() {
                k += 1;
            }
            if k > exp_start {
                j = k;
            }
        }

        if bytes.get(j) == Some(&b'w') {
            return true;
        }
    }

    false
}
