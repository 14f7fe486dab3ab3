//! Multi-level name index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::IndexError;
use crate::scanner::scan_files;

/// Default number of extensions that may be stripped from a file name.
pub const DEFAULT_MAX_EXTENSION_DEPTH: usize = 5;

/// File names that make their directory addressable as `<dir>/`.
const DIRECTORY_INDEX_NAMES: [&str; 2] = ["index.md", "index.html"];

/// Key-to-paths multimap for a single level.
type Level = HashMap<String, Vec<String>>;

/// Extension-tolerant index of every file below a site root.
///
/// Level `i` maps a file name with its last `i` extensions stripped to the
/// relative paths of all files producing that name. For `jquery.min.js`:
///
/// | Level | Key |
/// |-------|-----|
/// | 0 | `jquery.min.js` |
/// | 1 | `jquery.min` |
/// | 2 | `jquery` |
///
/// Lookups search the levels from most to least literal and return the first
/// non-empty match. Directory index files (`index.md`, `index.html`) are also
/// registered at level 0 under `<parent-dir>/` (`/` for the root).
///
/// The index is immutable after [`build`](Self::build); rebuild it to pick up
/// file changes.
#[derive(Debug)]
pub struct PathIndex {
    root: PathBuf,
    levels: Vec<Level>,
    file_count: usize,
}

impl PathIndex {
    /// Build an index of `root` with [`DEFAULT_MAX_EXTENSION_DEPTH`].
    pub fn build(root: &Path) -> Result<Self, IndexError> {
        Self::with_max_depth(root, DEFAULT_MAX_EXTENSION_DEPTH)
    }

    /// Build an index of `root` stripping at most `max_depth` extensions.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::NotFound` or `IndexError::NotADirectory` if `root`
    /// is not an existing directory, and `IndexError::Io` if the scan fails.
    pub fn with_max_depth(root: &Path, max_depth: usize) -> Result<Self, IndexError> {
        let start = Instant::now();

        if !root.exists() {
            return Err(IndexError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(IndexError::NotADirectory(root.to_path_buf()));
        }

        let files = scan_files(root)?;
        let mut index = Self {
            root: root.to_path_buf(),
            levels: vec![Level::new(); max_depth + 1],
            file_count: files.len(),
        };
        for rel_path in files {
            index.insert(rel_path);
        }

        tracing::debug!(
            root = %root.display(),
            file_count = index.file_count,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Path index built"
        );

        Ok(index)
    }

    fn insert(&mut self, rel_path: String) {
        let (parent, file_name) = match rel_path.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", rel_path.as_str()),
        };

        if DIRECTORY_INDEX_NAMES.contains(&file_name) {
            let dir_key = match parent.rsplit_once('/') {
                Some((_, dir)) => format!("{dir}/"),
                None if parent.is_empty() => "/".to_owned(),
                None => format!("{parent}/"),
            };
            self.levels[0]
                .entry(dir_key)
                .or_default()
                .push(rel_path.clone());
        }

        let mut name = file_name;
        for level in &mut self.levels {
            level
                .entry(name.to_owned())
                .or_default()
                .push(rel_path.clone());
            match name.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => name = stem,
                _ => break,
            }
        }
    }

    /// Find the files a query may refer to.
    ///
    /// The query's base name is looked up level by level; the first level with
    /// a match wins. Directory components in the query (`guide/intro`) narrow
    /// the candidates to files below a matching directory. A query ending in
    /// `/` refers to a directory index, and an empty query to the root index.
    ///
    /// Paths within one level are returned in scan order; callers that need a
    /// particular order must sort.
    pub fn lookup(&self, query: &str) -> Vec<&str> {
        let query = Query::parse(query);

        for level in &self.levels {
            let Some(paths) = level.get(&query.name) else {
                continue;
            };
            let matches: Vec<&str> = paths
                .iter()
                .map(String::as_str)
                .filter(|path| query.matches_dirs(path))
                .collect();
            if !matches.is_empty() {
                return matches;
            }
        }

        Vec::new()
    }

    /// Site root this index was built from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.file_count
    }

    /// True if no files were found under the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Number of lookup levels (maximum extension depth + 1).
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

/// Normalized lookup query.
struct Query {
    /// Base name key, with trailing `/` for directory queries.
    name: String,
    /// Directory segments preceding the base name.
    dirs: Vec<String>,
    is_dir: bool,
}

impl Query {
    fn parse(raw: &str) -> Self {
        let normalized = raw.replace('\\', "/");
        let mut trimmed = normalized.as_str();
        loop {
            if let Some(rest) = trimmed.strip_prefix("./") {
                trimmed = rest;
            } else if let Some(rest) = trimmed.strip_prefix('/') {
                trimmed = rest;
            } else {
                break;
            }
        }

        let is_dir = trimmed.ends_with('/');
        let mut segments: Vec<String> = trimmed
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_owned)
            .collect();

        let Some(last) = segments.pop() else {
            return Self {
                name: "/".to_owned(),
                dirs: Vec::new(),
                is_dir: true,
            };
        };

        Self {
            name: if is_dir { format!("{last}/") } else { last },
            dirs: segments,
            is_dir,
        }
    }

    /// Check that the candidate lives below the query's directory segments.
    fn matches_dirs(&self, path: &str) -> bool {
        if self.dirs.is_empty() {
            return true;
        }
        let segments: Vec<&str> = path.split('/').collect();
        // Directory queries name the index file's parent, not its own directory
        let skip = if self.is_dir { 2 } else { 1 };
        let dirs = &segments[..segments.len().saturating_sub(skip)];
        dirs.len() >= self.dirs.len()
            && dirs[dirs.len() - self.dirs.len()..]
                .iter()
                .zip(&self.dirs)
                .all(|(a, b)| *a == b.as_str())
    }
}
