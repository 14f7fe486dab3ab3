//! `crosslink lookup` command implementation.

use clap::Args;
use crosslink_config::SiteRegistry;
use crosslink_index::PathIndex;
use crosslink_links::{IndexedSite, SiteIndexError};

use super::ConfigArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the lookup command.
#[derive(Args)]
pub(crate) struct LookupArgs {
    /// Name of the site to search.
    site: String,

    /// File name, path or directory to look up (e.g. `intro`, `guide/`).
    query: String,

    #[command(flatten)]
    config: ConfigArgs,
}

impl LookupArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let config = self.config.load()?;
        let registry = SiteRegistry::from_config(&config)?;
        let site = registry
            .get(&self.site)
            .cloned()
            .ok_or_else(|| CliError::Validation(format!("Unknown site '{}'", self.site)))?;

        // Only the requested site needs an index
        let index = PathIndex::with_max_depth(&site.source_dir, config.index.max_extension_depth)
            .map_err(|source| SiteIndexError {
                site: site.name.clone(),
                source,
            })?;
        let site = IndexedSite { site, index };
        output.info(&format!("Searching {}", site.index.root().display()));

        let mut matches = site.index.lookup(&self.query);
        if matches.is_empty() {
            output.warning(&format!(
                "No files in '{}' match '{}'",
                site.name(),
                self.query
            ));
            return Ok(());
        }

        matches.sort_unstable();
        output.highlight(&format!(
            "{} match(es) for '{}' in '{}'",
            matches.len(),
            self.query,
            site.name()
        ));
        for path in &matches {
            output.info(&format!("  {path} -> {}", site.url_for(path)));
        }
        if matches.len() > 1 {
            output.warning(&format!("Ambiguous: links resolve to {}", matches[0]));
        }
        Ok(())
    }
}
