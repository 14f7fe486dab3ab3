//! Migration of Markdown sources from the legacy `@name:path` link syntax.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::protocol::{Protocol, split_fragment, strip_encoded_prefix};
use crate::sites::{IndexedSites, Selection};

/// Inline Markdown link `[text](target "title")`; group 2 is the target.
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(\s*([^)\s]*)[^)]*\)").unwrap());

/// Rewrites legacy pseudo-links in Markdown sources to the current syntax.
#[derive(Debug, Clone)]
pub struct LinkMigrator {
    sites: Arc<IndexedSites>,
    legacy: Protocol,
    current: Protocol,
}

impl LinkMigrator {
    /// Create a migrator from the `legacy` link syntax to the `current` one.
    #[must_use]
    pub fn new(sites: Arc<IndexedSites>, legacy: Protocol, current: Protocol) -> Self {
        Self {
            sites,
            legacy,
            current,
        }
    }

    /// Rewrite every legacy link target in `markdown`.
    ///
    /// Only targets of inline links are touched; text elsewhere is left as is.
    /// A link whose path does not resolve is still migrated, with a warning.
    #[must_use]
    pub fn migrate(&self, page: &str, markdown: &str) -> String {
        let mut buffer = Cow::Borrowed(markdown);
        let mut cursor = 0;

        while cursor < buffer.len() {
            let Some((link_start, range)) = MARKDOWN_LINK
                .captures_at(&buffer, cursor)
                .and_then(|caps| Some((caps.get(0)?.start(), caps.get(2)?.range())))
            else {
                break;
            };

            match self.migrate_target(page, &buffer[range.clone()]) {
                Some(replacement) => {
                    cursor = range.start + replacement.len();
                    buffer.to_mut().replace_range(range, &replacement);
                }
                None => cursor = link_start + 1,
            }
        }

        buffer.into_owned()
    }

    fn migrate_target(&self, page: &str, raw: &str) -> Option<String> {
        let (raw_path, fragment) = split_fragment(raw);
        let path = percent_decode_str(raw_path).decode_utf8_lossy();
        if !path.starts_with(&self.legacy.prefix) {
            return None;
        }

        match self.sites.select(page, &path, &self.legacy) {
            Selection::NotCrosslink => None,
            Selection::Unresolved => {
                tracing::warn!(page = %page, link = %raw, "Leaving ambiguous link unchanged");
                None
            }
            Selection::Site { site, remainder } => {
                if !site.can_resolve(remainder) {
                    tracing::warn!(
                        page = %page,
                        site = %site.name(),
                        query = %remainder,
                        "Migrated link does not resolve"
                    );
                }
                // The target stays a valid link destination only with its encoding intact
                let raw_remainder =
                    strip_encoded_prefix(raw_path, &self.legacy.scheme(site.name()))?;
                let migrated = format!(
                    "{}{raw_remainder}{fragment}",
                    self.current.scheme(site.name())
                );
                tracing::debug!(page = %page, link = %raw, migrated = %migrated, "Migrated link");
                Some(migrated)
            }
        }
    }

    /// Migrate a Markdown file in place.
    ///
    /// The file is only written if its content changed; the new content
    /// replaces the old atomically via a temporary file in the same directory.
    /// Returns whether the file was written.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or replaced.
    pub fn migrate_file(&self, path: &Path) -> io::Result<bool> {
        let original = fs::read_to_string(path)?;
        let migrated = self.migrate(&path.display().to_string(), &original);
        if migrated == original {
            return Ok(false);
        }

        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut file = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))?;
        file.write_all(migrated.as_bytes())?;
        file.persist(path).map_err(|e| e.error)?;

        tracing::info!(path = %path.display(), "Migrated links");
        Ok(true)
    }
}
