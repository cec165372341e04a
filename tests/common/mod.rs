#![allow(dead_code)]

use std::ops::Deref;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tracing_subscriber::EnvFilter;

static TEST_UNIQUIFIER: AtomicU64 = AtomicU64::new(0);

/// Log through the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A temporary directory, removed with everything in it when dropped.
pub struct TestRoot {
    path: PathBuf,
}

impl Deref for TestRoot {
    type Target = Path;

    fn deref(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestRoot {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// A fresh, empty directory for a single test.
pub fn test_root(name: &str) -> TestRoot {
    let serial = TEST_UNIQUIFIER.fetch_add(1, Ordering::Relaxed);

    let mut path = std::env::temp_dir();
    path.push(format!("quadmap-{name}-{}-{serial}", std::process::id()));

    let _ = std::fs::remove_dir_all(&path);
    std::fs::create_dir_all(&path).expect("create test root");

    TestRoot { path }
}

/// Region file prefix inside `root`.
pub fn prefix(root: &Path, name: &str) -> String {
    root.join(name).to_string_lossy().into_owned()
}

/// Names of the files in `root`, sorted.
pub fn files_in(root: &Path) -> Vec<String> {
    let mut names: Vec<_> = std::fs::read_dir(root)
        .expect("read test root")
        .map(|entry| entry.expect("read entry").file_name().to_string_lossy().into_owned())
        .collect();

    names.sort();
    names
}
