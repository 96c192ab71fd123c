//! Sizes list evaluation
//!
//! `sizes="(max-width: 600px) 100vw, 50vw"` is read left to right; the first
//! entry whose media condition holds supplies the layout width. Media
//! matching and CSS length measurement belong to the host and are passed in.

use std::borrow::Cow;

use crate::leading_float;

/// Length used when no sizes entry applies
pub const DEFAULT_SIZES: &str = "100vw";

/// Parsed sizes entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeEntry {
    /// Media condition including its parentheses, e.g. "(max-width: 600px)"
    pub condition: Option<String>,
    /// Length expression, e.g. "100vw", "300px", "calc(100vw - 2em)"
    pub length: Option<String>,
}

impl SizeEntry {
    /// Parse one comma-separated entry.
    pub fn parse(entry: &str) -> Self {
        let entry = entry.trim();

        let (condition, rest) = match leading_group(entry) {
            Some(end) => (Some(entry[..end].to_string()), &entry[end..]),
            None => (None, entry),
        };

        let rest = rest.trim();
        Self {
            condition,
            length: (!rest.is_empty()).then(|| rest.to_string()),
        }
    }
}

/// Byte offset just past a balanced `( ... )` group that opens `s`.
fn leading_group(s: &str) -> Option<usize> {
    if !s.starts_with('(') {
        return None;
    }

    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }

    // Unbalanced: treat the whole entry as a condition with no length
    Some(s.len())
}

/// Parse a sizes attribute into its entries, in order.
pub fn parse_sizes(sizes: &str) -> Vec<SizeEntry> {
    sizes.trim().split(',').map(SizeEntry::parse).collect()
}

/// Pick the winning length expression from a sizes attribute.
///
/// Entries without a length are skipped. The first entry with no condition,
/// or whose condition `media_match` accepts, wins; later entries are never
/// evaluated. Falls back to [`DEFAULT_SIZES`].
pub fn select_length<'a, M>(sizes: Option<&'a str>, media_match: M) -> Cow<'a, str>
where
    M: Fn(&str) -> bool,
{
    let sizes = sizes.unwrap_or(DEFAULT_SIZES);

    for raw in sizes.trim().split(',') {
        let entry = SizeEntry::parse(raw);
        let Some(length) = entry.length else {
            continue;
        };

        let matches = match entry.condition.as_deref() {
            None => true,
            Some(condition) => media_match(condition),
        };
        if matches {
            return Cow::Owned(length);
        }
    }

    Cow::Borrowed(DEFAULT_SIZES)
}

/// Make a length expression safe to hand to the measuring element.
///
/// Percentages and non-positive values are replaced by [`DEFAULT_SIZES`]
/// unless the expression is a `calc()`. `vw` becomes `%`, since the
/// measuring element sits at the top of the document.
pub fn normalize_length(length: &str) -> String {
    let positive = leading_float(length).is_some_and(|v| v > 0.0);
    let usable = !length.contains('%') && (positive || length.contains("calc("));

    let length = if usable { length } else { DEFAULT_SIZES };
    length.replace("vw", "%")
}

/// Resolve a sizes attribute to a layout width in CSS pixels.
///
/// `measure` must fall back to the viewport width itself when it cannot
/// evaluate the expression (unsupported `calc()` measures as zero).
pub fn resolve_width<M, L>(sizes: Option<&str>, media_match: M, mut measure: L) -> f64
where
    M: Fn(&str) -> bool,
    L: FnMut(&str) -> f64,
{
    let length = select_length(sizes, media_match);
    let css = normalize_length(&length);
    let width = measure(&css);

    tracing::trace!("sizes {:?} -> {} -> {}px", sizes, css, width);
    width
}
