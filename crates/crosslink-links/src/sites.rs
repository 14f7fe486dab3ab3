//! Indexed sites: site selection and path resolution.

use std::time::Instant;

use crosslink_config::{Site, SiteRegistry};
use crosslink_index::{IndexError, PathIndex};

use crate::protocol::Protocol;
use crate::url::{join_url, publish_path};

/// Error returned when a site's files cannot be indexed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to index site '{site}': {source}")]
pub struct SiteIndexError {
    /// Name of the site.
    pub site: String,
    /// Underlying index error.
    #[source]
    pub source: IndexError,
}

/// A site together with the index of its files.
#[derive(Debug)]
pub struct IndexedSite {
    /// Site configuration.
    pub site: Site,
    /// Index of the site's source directory.
    pub index: PathIndex,
}

impl IndexedSite {
    /// Name of the site.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.site.name
    }

    /// True if `remainder` would resolve without an error.
    ///
    /// Absolute paths always resolve since they bypass the index.
    #[must_use]
    pub fn can_resolve(&self, remainder: &str) -> bool {
        remainder.starts_with('/') || !self.index.lookup(remainder).is_empty()
    }

    /// Resolve the path part of a pseudo-link to a file path within the site.
    ///
    /// Absolute paths are taken literally. Everything else goes through the
    /// index; with several candidates the lexicographically first wins. Returns
    /// `None` (and logs a warning) if no file matches.
    pub fn resolve(&self, page: &str, remainder: &str) -> Option<String> {
        if remainder.starts_with('/') {
            return Some(remainder.to_owned());
        }

        let mut matches = self.index.lookup(remainder);
        match matches.len() {
            0 => {
                tracing::warn!(
                    page = %page,
                    site = %self.site.name,
                    query = %remainder,
                    "No file matches crosslink"
                );
                None
            }
            1 => Some(matches[0].to_owned()),
            _ => {
                matches.sort_unstable();
                tracing::warn!(
                    page = %page,
                    site = %self.site.name,
                    query = %remainder,
                    candidates = ?matches,
                    "Multiple files match crosslink, using the first"
                );
                Some(matches[0].to_owned())
            }
        }
    }

    /// Published URL of a resolved file path.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        join_url(
            &self.site.target_url,
            &publish_path(path, self.site.use_directory_urls),
        )
    }
}

/// Outcome of matching a link against the known sites.
#[derive(Debug)]
pub enum Selection<'s, 'p> {
    /// No site's pseudo-protocol matches; the link is not a crosslink.
    NotCrosslink,
    /// The link belongs to `site`; `remainder` is the path after the protocol.
    Site {
        /// Selected site.
        site: &'s IndexedSite,
        /// Link path with the pseudo-protocol stripped.
        remainder: &'p str,
    },
    /// Several sites match and none of them can resolve the link.
    Unresolved,
}

/// All configured sites with their file indexes.
///
/// Built once; read-only afterwards, so it can be shared between threads
/// rewriting different pages.
#[derive(Debug)]
pub struct IndexedSites {
    sites: Vec<IndexedSite>,
}

impl IndexedSites {
    /// Index every site of the registry.
    ///
    /// This walks each site's source directory once and is the only I/O
    /// performed by the link engine.
    ///
    /// # Errors
    ///
    /// Returns `SiteIndexError` for the first site whose directory cannot be indexed.
    pub fn build(registry: &SiteRegistry, max_depth: usize) -> Result<Self, SiteIndexError> {
        let start = Instant::now();
        let sites = registry
            .iter()
            .map(|site| {
                let index = PathIndex::with_max_depth(&site.source_dir, max_depth).map_err(
                    |source| SiteIndexError {
                        site: site.name.clone(),
                        source,
                    },
                )?;
                Ok(IndexedSite {
                    site: site.clone(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            site_count = sites.len(),
            file_count = sites.iter().map(|s| s.index.len()).sum::<usize>(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sites indexed"
        );

        Ok(Self { sites })
    }

    /// Look up a site by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&IndexedSite> {
        self.sites.iter().find(|s| s.site.name == name)
    }

    /// Iterate sites in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexedSite> {
        self.sites.iter()
    }

    /// Number of sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// True if there are no sites.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Find the site a link path (fragment already removed) refers to.
    ///
    /// Every site whose full pseudo-protocol is a prefix of `path` is a
    /// candidate. A single candidate is selected directly. With several, the
    /// candidates are sorted by name and the first one able to resolve its
    /// remainder wins; if none can, the link is [`Selection::Unresolved`].
    pub fn select<'s, 'p>(
        &'s self,
        page: &str,
        path: &'p str,
        protocol: &Protocol,
    ) -> Selection<'s, 'p> {
        let mut candidates: Vec<(&IndexedSite, &str)> = self
            .sites
            .iter()
            .filter_map(|site| {
                let remainder = path.strip_prefix(&protocol.scheme(site.name()))?;
                Some((site, remainder))
            })
            .collect();

        match candidates.len() {
            0 => Selection::NotCrosslink,
            1 => {
                let (site, remainder) = candidates[0];
                Selection::Site { site, remainder }
            }
            _ => {
                candidates.sort_by(|a, b| a.0.name().cmp(b.0.name()));
                let names: Vec<&str> = candidates.iter().map(|(s, _)| s.name()).collect();
                tracing::warn!(
                    page = %page,
                    link = %path,
                    candidates = ?names,
                    "Link matches multiple sites, using the first that resolves"
                );

                match candidates
                    .into_iter()
                    .find(|(site, remainder)| site.can_resolve(remainder))
                {
                    Some((site, remainder)) => Selection::Site { site, remainder },
                    None => {
                        tracing::warn!(
                            page = %page,
                            link = %path,
                            candidates = ?names,
                            "No matching site can resolve link"
                        );
                        Selection::Unresolved
                    }
                }
            }
        }
    }
}
