//! Descriptor list (srcset) tokenizer
//!
//! Splits `url [descriptor], ...` into raw candidates without interpreting
//! the descriptors. Malformed segments are dropped, never reported.

/// Raw srcset entry, descriptor still unparsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Image URL (may be relative)
    pub url: String,
    /// Descriptor text, `None` when nothing followed the URL
    pub descriptor: Option<String>,
}

impl RawCandidate {
    pub fn new(url: &str, descriptor: Option<&str>) -> Self {
        Self {
            url: url.to_string(),
            descriptor: descriptor.map(str::to_string),
        }
    }
}

/// Parse a srcset attribute value.
///
/// A URL immediately followed by a comma (`a.jpg, b.jpg 2x`) yields an empty
/// descriptor rather than an absent one. Descriptor text runs up to the next
/// comma.
pub fn parse_srcset(srcset: &str) -> Vec<RawCandidate> {
    let mut candidates = Vec::new();
    let mut rest = srcset;

    while !rest.is_empty() {
        rest = rest.trim_start();

        let (token, tail) = match rest.char_indices().find(|(_, c)| c.is_whitespace()) {
            Some((pos, ws)) => (&rest[..pos], Some(&rest[pos + ws.len_utf8()..])),
            None => (rest, None),
        };
        rest = tail.unwrap_or("");

        let mut descriptor = None;
        let url = if token.ends_with(',') || token.is_empty() {
            descriptor = Some(String::new());
            token.trim_end_matches(',').to_string()
        } else {
            token.to_string()
        };

        if descriptor.is_none() && tail.is_some() {
            match rest.find(',') {
                Some(comma) => {
                    descriptor = Some(rest[..comma].to_string());
                    rest = &rest[comma + 1..];
                }
                None => {
                    descriptor = Some(rest.to_string());
                    rest = "";
                }
            }
        }

        let has_descriptor = descriptor.as_deref().is_some_and(|d| !d.is_empty());
        if !url.is_empty() || has_descriptor {
            candidates.push(RawCandidate { url, descriptor });
        }
    }

    candidates
}
