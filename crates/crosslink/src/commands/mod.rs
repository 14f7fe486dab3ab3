//! CLI command implementations.

pub(crate) mod lookup;
pub(crate) mod migrate;
pub(crate) mod rewrite;
pub(crate) mod sites;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use crosslink_config::{CliSettings, Config, SiteRegistry};
use crosslink_links::{IndexedSites, Protocol};

use crate::error::CliError;

pub(crate) use lookup::LookupArgs;
pub(crate) use migrate::MigrateArgs;
pub(crate) use rewrite::RewriteArgs;
pub(crate) use sites::SitesArgs;

/// Configuration options shared by all commands.
#[derive(Args)]
pub(crate) struct ConfigArgs {
    /// Path to configuration file (default: auto-discover crosslink.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Docs directory of the local site (overrides config).
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Public URL of the local site (overrides config).
    #[arg(long)]
    site_url: Option<String>,

    /// Enable or disable link rewriting (overrides config).
    #[arg(long, env = "CROSSLINK_ENABLED")]
    enabled: Option<bool>,
}

impl ConfigArgs {
    /// Load the configuration with command-line overrides applied.
    pub(crate) fn load(&self) -> Result<Config, CliError> {
        let cli_settings = CliSettings {
            docs_dir: self.docs_dir.clone(),
            site_url: self.site_url.clone(),
            enabled: self.enabled,
        };
        Ok(Config::load(self.config.as_deref(), Some(&cli_settings))?)
    }
}

/// Build the site registry and index every site.
pub(crate) fn index_sites(config: &Config) -> Result<Arc<IndexedSites>, CliError> {
    let registry = SiteRegistry::from_config(config)?;
    let sites = IndexedSites::build(&registry, config.index.max_extension_depth)?;
    Ok(Arc::new(sites))
}

/// Pseudo-protocol configured for current links.
pub(crate) fn current_protocol(config: &Config) -> Protocol {
    Protocol::new(&config.prefix, &config.suffix)
}

/// Recursively collect files with the given extension, sorted by path.
///
/// A file path is returned as-is.
pub(crate) fn collect_files(path: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        collect_into(path, extension, &mut files)?;
    }
    files.sort();
    Ok(files)
}

fn collect_into(dir: &Path, extension: &str, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_into(&path, extension, files)?;
        } else if file_type.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Page identifier used in diagnostics: path relative to `root` with `/` separators.
pub(crate) fn page_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_collect_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/c")).unwrap();
        fs::write(dir.path().join("b/c/page.html"), "").unwrap();
        fs::write(dir.path().join("a.HTML"), "").unwrap();
        fs::write(dir.path().join("style.css"), "").unwrap();

        let files = collect_files(dir.path(), "html").unwrap();
        let ids: Vec<String> = files.iter().map(|f| page_id(dir.path(), f)).collect();

        assert_eq!(ids, vec!["a.HTML", "b/c/page.html"]);
    }

    #[test]
    fn test_collect_files_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "").unwrap();

        assert_eq!(collect_files(&file, "md").unwrap(), vec![file]);
    }

    #[test]
    fn test_collect_files_missing_dir() {
        let dir = tempfile::tempdir().unwrap();

        assert!(collect_files(&dir.path().join("missing"), "html").is_err());
    }

    #[test]
    fn test_page_id_outside_root() {
        assert_eq!(
            page_id(Path::new("/site"), Path::new("/other/page.html")),
            "/other/page.html"
        );
    }
}
