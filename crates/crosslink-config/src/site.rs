//! Site declarations and the site registry.
//!
//! Each `[[crosslinks]]` entry declares one site, or a family of sites when
//! `name`, `source_dir` and `target_url` each contain a single `*`:
//!
//! ```toml
//! [[crosslinks]]
//! name = "project-*"
//! source_dir = "../projects/*/docs"
//! target_url = "https://example.com/*/"
//! use_directory_urls = true
//! ```
//!
//! Wildcard entries expand to one site per matching directory. Their names may
//! collide with explicit entries, in which case the explicit entry wins.

use std::path::{Component, Path, PathBuf};

use crate::{Config, ConfigError, expand};

/// Name of the synthetic site describing the host site itself.
pub const LOCAL_SITE_NAME: &str = "local";

/// Fields allowed in a site declaration.
pub const SITE_FIELDS: [&str; 4] = ["name", "source_dir", "target_url", "use_directory_urls"];

/// Placeholder for wildcard site declarations.
const WILDCARD: char = '*';

/// A documentation site that pseudo-links can point at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Name used in pseudo-links (`x-NAME://page.md`).
    pub name: String,
    /// Canonical directory the site's files are indexed from.
    pub source_dir: PathBuf,
    /// Base URL the site is published under.
    pub target_url: String,
    /// Whether `page.md` is published as `page/` (true) or `page.html` (false).
    pub use_directory_urls: bool,
}

/// Ordered collection of sites, unique by name.
///
/// Built once at startup and never modified afterwards.
#[derive(Debug, Default)]
pub struct SiteRegistry {
    sites: Vec<Site>,
}

impl SiteRegistry {
    /// Build the registry from the `[[crosslinks]]` declarations and the local site.
    ///
    /// Explicit entries are registered first in declaration order, then the
    /// wildcard expansions, then the `local` site unless an entry already
    /// claims that name. Wildcard results whose name is taken are skipped with
    /// a warning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Entry` for malformed or conflicting declarations
    /// and `ConfigError::Validation` if the local docs directory is missing.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        let mut wildcards = Vec::new();

        for (index, data) in config.crosslinks.iter().enumerate() {
            let location = format!("crosslinks[{index}]");
            let entry = with_entry_data(&location, data, || {
                SiteEntry::parse(data, &location, &config.config_dir)
            })?;

            if entry.is_wildcard {
                wildcards.push((location, data, entry));
                continue;
            }

            with_entry_data(&location, data, || {
                if let Some(existing) = registry.get(&entry.name) {
                    return Err(ConfigError::Validation(format!(
                        "A crosslink named '{}' already exists: source_dir={}, target_url={}",
                        existing.name,
                        existing.source_dir.display(),
                        existing.target_url
                    )));
                }
                let source_dir = canonical_dir(&entry.source_dir)?;
                registry.sites.push(entry.into_site(source_dir));
                Ok(())
            })?;
        }

        for (location, data, entry) in wildcards {
            let sites = with_entry_data(&location, data, || entry.expand())?;
            for site in sites {
                if let Some(existing) = registry.get(&site.name) {
                    tracing::warn!(
                        name = %site.name,
                        location = %location,
                        existing_source_dir = %existing.source_dir.display(),
                        "Skipping wildcard site, name already registered"
                    );
                    continue;
                }
                tracing::debug!(name = %site.name, location = %location, "Wildcard site registered");
                registry.sites.push(site);
            }
        }

        if !registry.contains(LOCAL_SITE_NAME) {
            let local = &config.local_resolved;
            let source_dir = local.docs_dir.canonicalize().map_err(|e| {
                ConfigError::Validation(format!(
                    "local.docs_dir '{}' is not accessible: {e}",
                    local.docs_dir.display()
                ))
            })?;
            registry.sites.push(Site {
                name: LOCAL_SITE_NAME.to_owned(),
                source_dir,
                target_url: local.target_url()?,
                use_directory_urls: local.use_directory_urls,
            });
        }

        Ok(registry)
    }

    /// Build a registry from already resolved sites.
    ///
    /// No `local` site is synthesized and source directories are taken as given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if two sites share a name.
    pub fn from_sites(sites: impl IntoIterator<Item = Site>) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for site in sites {
            if registry.contains(&site.name) {
                return Err(ConfigError::Validation(format!(
                    "A crosslink named '{}' already exists",
                    site.name
                )));
            }
            registry.sites.push(site);
        }
        Ok(registry)
    }

    /// Look up a site by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|site| site.name == name)
    }

    /// True if a site with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate sites in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Site> {
        self.sites.iter()
    }

    /// Number of registered sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// True if no sites are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl<'a> IntoIterator for &'a SiteRegistry {
    type Item = &'a Site;
    type IntoIter = std::slice::Iter<'a, Site>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Run `f` and attach the entry's location and data to any error it returns.
///
/// Errors that already carry entry data are passed through unchanged, so
/// nested calls don't stack the same JSON dump twice.
fn with_entry_data<T>(
    location: &str,
    data: &toml::Value,
    f: impl FnOnce() -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    f().map_err(|err| match err {
        ConfigError::Entry { .. } => err,
        ConfigError::Validation(message) => entry_error(message, location, data),
        other => entry_error(other.to_string(), location, data),
    })
}

fn entry_error(message: String, location: &str, data: &toml::Value) -> ConfigError {
    ConfigError::Entry {
        message,
        location: location.to_owned(),
        data: serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string()),
    }
}

/// Validated but not yet resolved site declaration.
#[derive(Debug)]
struct SiteEntry {
    name: String,
    /// Source directory joined onto the config directory, possibly with `*`.
    source_dir: PathBuf,
    target_url: String,
    use_directory_urls: bool,
    is_wildcard: bool,
}

impl SiteEntry {
    fn parse(data: &toml::Value, location: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let Some(table) = data.as_table() else {
            return Err(invalid(format!(
                "Expected a table, but got a {}",
                data.type_str()
            )));
        };

        assert_no_unknown_fields(table)?;

        let name = get_string(table, "name")?;
        let source_dir = expand::expand_env(
            &get_string(table, "source_dir")?,
            &format!("{location}.source_dir"),
        )?;
        let target_url = expand::expand_env(
            &get_string(table, "target_url")?,
            &format!("{location}.target_url"),
        )?;
        let use_directory_urls = get_bool(table, "use_directory_urls")?;

        if !(target_url.starts_with("https://") || target_url.starts_with("http://")) {
            tracing::warn!(
                url = %target_url,
                location = %location,
                "Target URL should probably start with 'https://' (or 'http://')"
            );
        }

        let wildcard_counts = [&name, &source_dir, &target_url].map(|s| s.matches(WILDCARD).count());
        let is_wildcard = match wildcard_counts {
            [0, 0, 0] => false,
            [1, 1, 1] => true,
            _ => {
                return Err(invalid(format!(
                    "Wildcard entries need exactly one '{WILDCARD}' in each of name, source_dir and target_url"
                )));
            }
        };

        let source_dir = config_dir.join(source_dir);
        if !is_wildcard {
            require_directory(&source_dir)?;
        }

        Ok(Self {
            name,
            source_dir,
            target_url,
            use_directory_urls,
            is_wildcard,
        })
    }

    fn into_site(self, source_dir: PathBuf) -> Site {
        Site {
            name: self.name,
            source_dir,
            target_url: self.target_url,
            use_directory_urls: self.use_directory_urls,
        }
    }

    /// Expand a wildcard entry into one site per matching directory.
    ///
    /// The `*` only spans a single path segment. Matches are visited in
    /// sorted order.
    fn expand(&self) -> Result<Vec<Site>, ConfigError> {
        let pattern = self.source_dir.to_string_lossy();
        let Some((before, after)) = pattern.split_once(WILDCARD) else {
            return Ok(Vec::new());
        };
        let glob_pattern = format!(
            "{}{WILDCARD}{}",
            glob::Pattern::escape(before),
            glob::Pattern::escape(after)
        );

        let paths = glob::glob(&glob_pattern)
            .map_err(|e| invalid(format!("Invalid wildcard pattern '{pattern}': {e}")))?;

        let mut sites = Vec::new();
        for path in paths {
            let path = match path {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read wildcard match");
                    continue;
                }
            };
            if !path.is_dir() {
                continue;
            }

            let Some(captured) = wildcard_capture(&path, &self.source_dir) else {
                tracing::debug!(path = %path.display(), "Wildcard match does not fit pattern");
                continue;
            };

            sites.push(Site {
                name: self.name.replacen(WILDCARD, &captured, 1),
                source_dir: canonical_dir(&path)?,
                target_url: self.target_url.replacen(WILDCARD, &captured, 1),
                use_directory_urls: self.use_directory_urls,
            });
        }

        if sites.is_empty() {
            tracing::warn!(pattern = %pattern, "Wildcard entry matched no directories");
        }

        Ok(sites)
    }
}

/// Text matched by the `*` of `pattern` in `path`, compared segment by segment.
///
/// `.` segments are ignored on both sides since glob drops them from matches.
fn wildcard_capture(path: &Path, pattern: &Path) -> Option<String> {
    let segments = |p: &Path| -> Vec<String> {
        p.components()
            .filter(|c| *c != Component::CurDir)
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect()
    };
    let (path, pattern) = (segments(path), segments(pattern));
    if path.len() != pattern.len() {
        return None;
    }

    let mut captured = None;
    for (segment, pat) in path.iter().zip(&pattern) {
        match pat.split_once(WILDCARD) {
            Some((before, after)) => {
                let inner = segment.strip_prefix(before)?.strip_suffix(after)?;
                captured = Some(inner.to_owned());
            }
            None if pat == segment => {}
            None => return None,
        }
    }
    captured
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation(message)
}

fn assert_no_unknown_fields(table: &toml::Table) -> Result<(), ConfigError> {
    let mut unexpected: Vec<&str> = table
        .keys()
        .map(String::as_str)
        .filter(|key| !SITE_FIELDS.contains(key))
        .collect();
    if unexpected.is_empty() {
        return Ok(());
    }
    unexpected.sort_unstable();
    Err(invalid(format!(
        "Unexpected field(s): {}\n[Hint] Allowed fields are: {}",
        unexpected.join(", "),
        SITE_FIELDS.join(", ")
    )))
}

fn get_string(table: &toml::Table, field: &str) -> Result<String, ConfigError> {
    match table.get(field) {
        Some(toml::Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(toml::Value::String(_)) | None => Err(invalid(format!(
            "Field '{field}' should be set and needs to have a non-empty value"
        ))),
        Some(other) => Err(invalid(format!(
            "Field '{field}' should be a string, but has type {}",
            other.type_str()
        ))),
    }
}

fn get_bool(table: &toml::Table, field: &str) -> Result<bool, ConfigError> {
    match table.get(field) {
        Some(toml::Value::Boolean(value)) => Ok(*value),
        Some(other) => Err(invalid(format!(
            "Field '{field}' should be a boolean, but has type {}",
            other.type_str()
        ))),
        None => Err(invalid(format!("Field '{field}' does not exist"))),
    }
}

fn require_directory(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        return Err(invalid(format!("'{}' does not exist", path.display())));
    }
    if !path.is_dir() {
        return Err(invalid(format!(
            "'{}' needs to be a directory",
            path.display()
        )));
    }
    Ok(())
}

fn canonical_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    path.canonicalize()
        .map_err(|e| invalid(format!("Failed to resolve '{}': {e}", path.display())))
}
