//! HTML link rewriting.
//!
//! Scans rendered HTML for `<a href>` and `<img src>` attribute values written
//! in pseudo-link syntax and replaces them with the URL of the file they resolve
//! to. The scan is regex-based rather than a full HTML parse so that minified
//! output with unquoted attribute values is handled too.

use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::protocol::{Protocol, split_fragment};
use crate::sites::{IndexedSites, Selection};
use crate::url::ERROR_ANCHOR;

/// Tag and attribute pairs that may carry a pseudo-link.
const LINK_ATTRIBUTES: [(&str, &str); 2] = [("a", "href"), ("img", "src")];

/// One pattern per tag/attribute pair and quoting style.
///
/// Group 1 captures the attribute value without its quotes.
static ATTRIBUTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LINK_ATTRIBUTES
        .iter()
        .flat_map(|(tag, attr)| {
            [
                // Unquoted, as left behind by HTML minifiers
                format!(r#"(?i)<{tag}\s+[^>]*{attr}\s*=\s*([^'"\s>][^\s>]*)"#),
                format!(r#"(?i)<{tag}\s+[^>]*{attr}\s*=\s*"([^"]*)""#),
                format!(r#"(?i)<{tag}\s+[^>]*{attr}\s*=\s*'([^']*)'"#),
            ]
        })
        .map(|pattern| Regex::new(&pattern).unwrap())
        .collect()
});

/// Rewrites pseudo-links in rendered HTML pages.
///
/// Holds only immutable state, so a single rewriter can be shared by threads
/// processing different pages.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    sites: Arc<IndexedSites>,
    protocol: Protocol,
}

impl LinkRewriter {
    /// Create a rewriter over indexed sites using the given pseudo-protocol.
    #[must_use]
    pub fn new(sites: Arc<IndexedSites>, protocol: Protocol) -> Self {
        Self { sites, protocol }
    }

    /// Sites links are resolved against.
    #[must_use]
    pub fn sites(&self) -> &IndexedSites {
        &self.sites
    }

    /// Rewrite every pseudo-link in `html`.
    ///
    /// `page` identifies the page in diagnostics. Links that match no site are
    /// left alone; links that match a site but cannot be resolved are replaced
    /// with [`ERROR_ANCHOR`]. HTML without pseudo-links is returned unchanged.
    #[must_use]
    pub fn rewrite(&self, page: &str, html: &str) -> String {
        let mut buffer = Cow::Borrowed(html);

        for pattern in ATTRIBUTE_PATTERNS.iter() {
            let mut cursor = 0;
            while cursor < buffer.len() {
                let Some((element_start, range)) = pattern
                    .captures_at(&buffer, cursor)
                    .and_then(|caps| Some((caps.get(0)?.start(), caps.get(1)?.range())))
                else {
                    break;
                };

                match self.rewrite_value(page, &buffer[range.clone()]) {
                    Some(replacement) => {
                        cursor = range.start + replacement.len();
                        buffer.to_mut().replace_range(range, &replacement);
                    }
                    None => cursor = element_start + 1,
                }
            }
        }

        buffer.into_owned()
    }

    /// New attribute value for a candidate, or `None` if it isn't a pseudo-link.
    fn rewrite_value(&self, page: &str, raw: &str) -> Option<String> {
        // Only the path is decoded: Markdown processors may percent-encode the
        // protocol delimiters, and the fragment goes back into the attribute as written
        let (raw_path, fragment) = split_fragment(raw);
        let path = percent_decode_str(raw_path).decode_utf8_lossy();
        if !path.starts_with(&self.protocol.prefix) {
            return None;
        }

        let url = match self.sites.select(page, &path, &self.protocol) {
            Selection::NotCrosslink => return None,
            Selection::Unresolved => ERROR_ANCHOR.to_owned(),
            Selection::Site { site, remainder } => match site.resolve(page, remainder) {
                Some(resolved) => {
                    let url = format!("{}{fragment}", site.url_for(&resolved));
                    tracing::debug!(
                        page = %page,
                        link = %raw,
                        site = %site.name(),
                        resolved = %resolved,
                        url = %url,
                        "Resolved crosslink"
                    );
                    url
                }
                None => ERROR_ANCHOR.to_owned(),
            },
        };

        Some(url)
    }
}
