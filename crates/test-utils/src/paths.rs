//! Path utilities for locating test data files.

use std::path::PathBuf;

/// Returns the workspace root directory.
///
/// This is determined by walking up from the test-utils manifest directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Searches for a test file in multiple locations.
///
/// This function checks the following locations in order:
/// 1. Environment variable `TEST_DATA_DIR` (if set)
/// 2. `testdata/` at the workspace root
/// 3. The renderer's bundled `assets/` (font and base map)
///
/// # Returns
///
/// `Some(PathBuf)` if the file is found, `None` otherwise.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(test_data_dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(test_data_dir).join(name));
    }

    let root = workspace_root();
    candidates.extend([
        root.join("testdata").join(name),
        root.join("crates").join("renderer").join("assets").join(name),
    ]);

    candidates.into_iter().find(|path| path.exists())
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}
