//! Output URL construction.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Attribute value written for links that could not be resolved.
pub const ERROR_ANCHOR: &str = "#crosslink-error";

/// Characters left as-is when encoding the path part of a URL.
const PATH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'#')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Convert a resolved file path to the path the site publishes it under.
///
/// Only markdown files (`.md`, any case) change:
///
/// | Input | Directory URLs | File URLs |
/// |-------|----------------|-----------|
/// | `docs/page.md` | `docs/page/` | `docs/page.html` |
/// | `docs/index.md` | `docs/` | `docs/index.html` |
/// | `index.md` | `` | `index.html` |
///
/// Other paths are returned unchanged.
pub fn publish_path(path: &str, use_directory_urls: bool) -> Cow<'_, str> {
    let Some(stem) = strip_md_extension(path) else {
        return Cow::Borrowed(path);
    };

    if !use_directory_urls {
        return Cow::Owned(format!("{stem}.html"));
    }

    // Matched case-insensitively, like the extension
    let is_index = |name: &str| name.eq_ignore_ascii_case("index");
    match stem.rsplit_once('/') {
        Some((dir, name)) if is_index(name) => Cow::Owned(format!("{dir}/")),
        None if is_index(stem) => Cow::Borrowed(""),
        _ => Cow::Owned(format!("{stem}/")),
    }
}

fn strip_md_extension(path: &str) -> Option<&str> {
    let split = path.len().checked_sub(3)?;
    let ext = path.get(split..)?;
    ext.eq_ignore_ascii_case(".md").then(|| &path[..split])
}

/// Join a site's target URL with a published path.
///
/// The target URL always gets a trailing `/`, leading slashes of `path` are
/// dropped and the rest is percent-encoded except for `/` and `#`.
pub fn join_url(target_url: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    let mut url = String::with_capacity(target_url.len() + path.len() + 1);
    url.push_str(target_url);
    if !url.ends_with('/') {
        url.push('/');
    }
    url.extend(utf8_percent_encode(path, PATH_ENCODE_SET));
    url
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_publish_path_directory_urls() {
        assert_eq!(publish_path("docs/page.md", true), "docs/page/");
        assert_eq!(publish_path("docs/index.md", true), "docs/");
        assert_eq!(publish_path("index.md", true), "");
        assert_eq!(publish_path("/abs/index.md", true), "/abs/");
    }

    #[test]
    fn test_publish_path_file_urls() {
        assert_eq!(publish_path("docs/page.md", false), "docs/page.html");
        assert_eq!(publish_path("docs/index.md", false), "docs/index.html");
    }

    #[test]
    fn test_publish_path_extension_case_insensitive() {
        assert_eq!(publish_path("README.MD", true), "README/");
        assert_eq!(publish_path("Guide.Md", false), "Guide.html");
        assert_eq!(publish_path("docs/INDEX.md", true), "docs/");
        assert_eq!(publish_path("Index.MD", true), "");
        assert_eq!(publish_path("docs/INDEX.md", false), "docs/INDEX.html");
    }

    #[test]
    fn test_publish_path_non_markdown_unchanged() {
        assert_eq!(publish_path("img/logo.png", true), "img/logo.png");
        assert_eq!(publish_path("api/index.html", true), "api/index.html");
        assert_eq!(publish_path("md", true), "md");
        assert!(matches!(publish_path("a.txt", false), Cow::Borrowed(_)));
    }

    #[test]
    fn test_join_url_adds_slash() {
        assert_eq!(join_url("https://x.com", "docs/page/"), "https://x.com/docs/page/");
        assert_eq!(join_url("https://x.com/", "docs/page/"), "https://x.com/docs/page/");
    }

    #[test]
    fn test_join_url_strips_leading_slashes() {
        assert_eq!(
            join_url("https://x.com/", "//etc/banner.txt"),
            "https://x.com/etc/banner.txt"
        );
    }

    #[test]
    fn test_join_url_empty_path() {
        assert_eq!(join_url("/", ""), "/");
        assert_eq!(join_url("https://x.com/docs", ""), "https://x.com/docs/");
    }

    #[test]
    fn test_join_url_percent_encodes() {
        assert_eq!(
            join_url("https://x.com/", "my docs/ü page.html"),
            "https://x.com/my%20docs/%C3%BC%20page.html"
        );
        assert_eq!(
            join_url("https://x.com/", "a_b-c~d/e#f"),
            "https://x.com/a_b-c~d/e#f"
        );
    }
}
