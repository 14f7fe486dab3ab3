//! Pseudo-protocol syntax.

use percent_encoding::percent_decode_str;

/// Prefix and suffix around a site name forming a pseudo-protocol.
///
/// With the defaults, site `api` is addressed as `x-api://path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    /// Text before the site name.
    pub prefix: String,
    /// Text between the site name and the path.
    pub suffix: String,
}

impl Protocol {
    /// Create a protocol from its prefix and suffix.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Full pseudo-protocol for a site (`prefix + name + suffix`).
    #[must_use]
    pub fn scheme(&self, site_name: &str) -> String {
        format!("{}{site_name}{}", self.prefix, self.suffix)
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new("x-", "://")
    }
}

/// Split a link into its path and fragment (including the `#`).
pub(crate) fn split_fragment(link: &str) -> (&str, &str) {
    match link.find('#') {
        Some(pos) => link.split_at(pos),
        None => (link, ""),
    }
}

/// Strip `prefix` from a percent-encoded value.
///
/// The prefix is matched against the decoded text; the rest is returned with
/// its original encoding.
pub(crate) fn strip_encoded_prefix<'a>(raw: &'a str, prefix: &str) -> Option<&'a str> {
    raw.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(raw.len()))
        .find(|&i| percent_decode_str(&raw[..i]).decode_utf8_lossy() == prefix)
        .map(|i| &raw[i..])
}
