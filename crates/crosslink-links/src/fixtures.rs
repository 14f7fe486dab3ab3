//! Test fixtures: sites backed by temporary directories.

use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use crosslink_config::{Site, SiteRegistry};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

use crate::sites::IndexedSites;

pub(crate) struct SiteFixture {
    name: &'static str,
    files: &'static [&'static str],
    target_url: &'static str,
    use_directory_urls: bool,
}

impl SiteFixture {
    pub(crate) fn new(name: &'static str, files: &'static [&'static str]) -> Self {
        Self {
            name,
            files,
            target_url: "https://x.com/",
            use_directory_urls: true,
        }
    }

    pub(crate) fn target(mut self, target_url: &'static str) -> Self {
        self.target_url = target_url;
        self
    }

    pub(crate) fn file_urls(mut self) -> Self {
        self.use_directory_urls = false;
        self
    }
}

/// Create each site's files under a shared temporary directory and index them.
pub(crate) fn indexed_sites(fixtures: &[SiteFixture]) -> (TempDir, IndexedSites) {
    let dir = tempfile::tempdir().unwrap();
    let sites: Vec<Site> = fixtures
        .iter()
        .map(|fixture| {
            let root = dir.path().join(fixture.name);
            fs::create_dir_all(&root).unwrap();
            for file in fixture.files {
                let path = root.join(file);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, "# page").unwrap();
            }
            Site {
                name: fixture.name.to_owned(),
                source_dir: root,
                target_url: fixture.target_url.to_owned(),
                use_directory_urls: fixture.use_directory_urls,
            }
        })
        .collect();

    let registry = SiteRegistry::from_sites(sites).unwrap();
    let indexed = IndexedSites::build(&registry, 5).unwrap();
    (dir, indexed)
}

pub(crate) fn shared_sites(fixtures: &[SiteFixture]) -> (TempDir, Arc<IndexedSites>) {
    let (dir, sites) = indexed_sites(fixtures);
    (dir, Arc::new(sites))
}

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter(Arc::clone(&self.0))
    }
}

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` and return its result with the warnings it logged, one per line.
pub(crate) fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let sink = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(sink.clone())
        .with_ansi(false)
        .with_max_level(Level::WARN)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}
