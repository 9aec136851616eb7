use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use walkdir::WalkDir;

/// Walks the directory referenced by `dir` recursively up to a depth of 3.
fn walk_dirs_for(p: &Path, dir: &Path) -> Option<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .max_depth(3)
        .into_iter()
        .filter_map(|e| e.ok().filter(|d| d.file_type().is_dir()))
        .map(|d| d.into_path().join(p))
        .find(|candidate| candidate.is_file())
}

/// A path that is either:
///   1. A valid absolute or relative path from the current working directory.
///   2. A valid path postfix in the crate's `benchmarks` directory of benchmark files.
///
/// This lets `--benchmark insert_all.yaml` work regardless of where the binary is run from.
pub fn benchmark_path(p: &Path) -> Result<PathBuf> {
    if p.is_absolute() || p.exists() {
        return Ok(p.to_owned());
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("benchmarks");
    if let Some(path) = walk_dirs_for(p, &manifest_dir) {
        return Ok(path);
    }

    bail!("Could not find the file: {:?}", p);
}
