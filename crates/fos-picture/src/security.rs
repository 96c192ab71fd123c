//! Secure contexts and mixed content
//!
//! A secure page must not swap an image to a plain `http:` resource.

use url::Url;

use crate::PictureError;

/// Resolve a candidate URL against the document base.
///
/// Without a base, absolute URLs are normalized and relative ones are kept
/// as written.
pub fn resolve_url(base: Option<&Url>, candidate: &str) -> Result<String, PictureError> {
    let parsed = match base {
        Some(base) => base.join(candidate),
        None => match Url::parse(candidate) {
            Err(url::ParseError::RelativeUrlWithoutBase) => return Ok(candidate.to_string()),
            other => other,
        },
    };

    parsed
        .map(String::from)
        .map_err(|source| PictureError::InvalidUrl {
            url: candidate.to_string(),
            source,
        })
}

/// Mixed content guard for image swaps
#[derive(Debug, Clone, Copy)]
pub struct MixedContentGuard {
    secure_context: bool,
}

impl MixedContentGuard {
    pub fn new(secure_context: bool) -> Self {
        Self { secure_context }
    }

    /// Refuse plain `http:` resources inside a secure context
    pub fn check(&self, url: &str) -> Result<(), PictureError> {
        let insecure = url
            .get(..5)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http:"));

        if self.secure_context && insecure {
            return Err(PictureError::MixedContentBlocked(url.to_string()));
        }
        Ok(())
    }
}
