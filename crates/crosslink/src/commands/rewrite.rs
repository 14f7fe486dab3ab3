//! `crosslink rewrite` command implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use crosslink_links::LinkRewriter;
use rayon::prelude::*;

use super::{ConfigArgs, collect_files, current_protocol, elapsed_ms, index_sites, page_id};
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the rewrite command.
#[derive(Args)]
pub(crate) struct RewriteArgs {
    /// Directory of the built site whose HTML pages are rewritten in place.
    site_dir: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

impl RewriteArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let start = Instant::now();

        let config = self.config.load()?;
        if !config.enabled {
            output.warning("Crosslinks are disabled, pages left unchanged.");
            return Ok(());
        }
        if !self.site_dir.is_dir() {
            return Err(CliError::Validation(format!(
                "Site directory '{}' does not exist",
                self.site_dir.display()
            )));
        }

        let rewriter = LinkRewriter::new(index_sites(&config)?, current_protocol(&config));
        let pages = collect_files(&self.site_dir, "html")?;
        output.info(&format!(
            "Rewriting {} pages in {} against {} site(s)",
            pages.len(),
            self.site_dir.display(),
            rewriter.sites().len()
        ));

        let changed = pages
            .par_iter()
            .map(|page| rewrite_page(&rewriter, &self.site_dir, page))
            .collect::<Result<Vec<bool>, CliError>>()?
            .into_iter()
            .filter(|changed| *changed)
            .count();

        let elapsed = elapsed_ms(start);
        tracing::info!(
            pages = pages.len(),
            changed,
            elapsed_ms = elapsed,
            "Rewrite finished"
        );
        output.success(&format!(
            "Updated {changed} of {} pages in {elapsed:.1}ms",
            pages.len()
        ));
        Ok(())
    }
}

/// Rewrite one page in place, returning whether it changed.
fn rewrite_page(rewriter: &LinkRewriter, root: &Path, path: &Path) -> Result<bool, CliError> {
    let page = page_id(root, path);
    let page_error = |source| CliError::Page {
        path: page.clone(),
        source,
    };

    let html = fs::read_to_string(path).map_err(page_error)?;
    let rewritten = rewriter.rewrite(&page, &html);
    if rewritten == html {
        return Ok(false);
    }

    fs::write(path, rewritten).map_err(page_error)?;
    tracing::debug!(page = %page, "Page rewritten");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crosslink_config::{Site, SiteRegistry};
    use crosslink_links::{IndexedSites, Protocol};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_rewrite_page_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let docs = dir.path().join("api");
        fs::create_dir_all(&docs).unwrap();
        fs::write(docs.join("intro.md"), "# Intro").unwrap();

        let registry = SiteRegistry::from_sites([Site {
            name: "api".to_owned(),
            source_dir: docs,
            target_url: "https://api.example.com/".to_owned(),
            use_directory_urls: true,
        }])
        .unwrap();
        let sites = IndexedSites::build(&registry, 5).unwrap();
        let rewriter = LinkRewriter::new(Arc::new(sites), Protocol::default());

        let site_dir = dir.path().join("site");
        fs::create_dir_all(&site_dir).unwrap();
        let linked = site_dir.join("linked.html");
        let plain = site_dir.join("plain.html");
        fs::write(&linked, r#"<a href="x-api://intro.md">Intro</a>"#).unwrap();
        fs::write(&plain, "<p>Nothing here</p>").unwrap();

        assert!(rewrite_page(&rewriter, &site_dir, &linked).unwrap());
        assert!(!rewrite_page(&rewriter, &site_dir, &plain).unwrap());
        assert_eq!(
            fs::read_to_string(&linked).unwrap(),
            r#"<a href="https://api.example.com/intro/">Intro</a>"#
        );
    }

    #[test]
    fn test_rewrite_page_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SiteRegistry::default();
        let sites = IndexedSites::build(&registry, 5).unwrap();
        let rewriter = LinkRewriter::new(Arc::new(sites), Protocol::default());

        let err = rewrite_page(&rewriter, dir.path(), &dir.path().join("gone.html")).unwrap_err();
        assert!(err.to_string().starts_with("gone.html: "));
    }
}
