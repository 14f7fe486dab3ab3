//! Extension-tolerant file lookup for crosslink sites.
//!
//! A [`PathIndex`] is built once from a full recursive scan of a site's source
//! directory and answers "which files could this name refer to?" queries:
//!
//! - exact file names (`jquery.min.js`)
//! - names with missing extensions (`jquery.min`, `jquery`)
//! - directory references (`guide/`) resolving to `guide/index.md` or `guide/index.html`
//! - directory-qualified names (`guide/intro.md`)
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use crosslink_index::PathIndex;
//!
//! let index = PathIndex::build(Path::new("docs"))?;
//! for path in index.lookup("getting-started") {
//!     println!("{path}");
//! }
//! # Ok::<(), crosslink_index::IndexError>(())
//! ```

mod index;
mod scanner;

use std::path::{Path, PathBuf};

pub use index::{DEFAULT_MAX_EXTENSION_DEPTH, PathIndex};

/// Error returned when a [`PathIndex`] cannot be built.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Root directory does not exist.
    #[error("Directory '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    /// Root exists but is not a directory.
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),
    /// Directory could not be read during the scan.
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl IndexError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
