//! Cross-site pseudo-link resolution.
//!
//! Pages link to other documentation sites with pseudo-protocol URLs such as
//! `x-api://getting-started.md#install`. This crate resolves those links
//! against an index of each site's source files and rewrites them to the
//! site's published URLs.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use crosslink_config::{Config, SiteRegistry};
//! use crosslink_links::{IndexedSites, LinkRewriter, Protocol};
//!
//! let config = Config::load(None, None)?;
//! let registry = SiteRegistry::from_config(&config)?;
//! let sites = IndexedSites::build(&registry, config.index.max_extension_depth)?;
//! let rewriter = LinkRewriter::new(Arc::new(sites), Protocol::default());
//!
//! let html = rewriter.rewrite("index.md", r#"<a href="x-api://intro.md">Intro</a>"#);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod migrate;
mod protocol;
mod rewriter;
mod sites;
mod url;

#[cfg(test)]
mod fixtures;

pub use migrate::LinkMigrator;
pub use protocol::Protocol;
pub use rewriter::LinkRewriter;
pub use sites::{IndexedSite, IndexedSites, Selection, SiteIndexError};
pub use url::{ERROR_ANCHOR, join_url, publish_path};
