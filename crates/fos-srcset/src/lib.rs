//! fOS Srcset
//!
//! Responsive image microsyntaxes and candidate selection.
//!
//! Pipeline:
//! - [`parse_srcset`] splits a descriptor list into raw `(url, descriptor)` pairs
//! - [`resolve_width`] picks the layout width from a sizes list
//! - [`DescriptorResolver`] turns each descriptor into a resolution (dppx)
//! - [`select_candidate`] picks the candidate for the device pixel ratio
//!
//! Nothing here touches a document. Media queries and length measurement
//! are injected as closures.

mod tokenizer;
mod sizes;
mod descriptor;
mod candidate;

pub use tokenizer::{RawCandidate, parse_srcset};
pub use sizes::{SizeEntry, DEFAULT_SIZES, parse_sizes, select_length, normalize_length, resolve_width};
pub use descriptor::{DescriptorResolver, has_width_descriptor};
pub use candidate::{ResolvedCandidate, resolve_candidates, select_candidate};

/// Default resolution for candidates without a usable descriptor
pub const DEFAULT_RESOLUTION: f64 = 1.0;

/// Parse the leading decimal number of `s`, like a lenient float reader.
///
/// Accepts an optional sign, digits, a fractional part and an exponent.
/// Trailing garbage is ignored. Returns `None` when no digits lead.
pub(crate) fn leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    
    if digits == 0 {
        return None;
    }
    
    // Exponent only counts when followed by digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    
    s[..end].parse().ok()
}

/// Parse the leading base-10 integer of `s`.
pub(crate) fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    
    s[..end].parse().ok()
}
