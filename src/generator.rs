//! Reading the document, writing the generated tree, and check mode.

use similar::TextDiff;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::error::GenError;
use crate::openapi::{self, GeneratedTree};

/// A generated file whose on-disk contents differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path relative to the output root.
    pub path: PathBuf,
    /// Unified diff from the on-disk file to the generated one.
    pub diff: String,
}

/// Read an OpenAPI document and generate its client tree.
pub fn generate_from_file(spec_path: &Path, config: &GeneratorConfig) -> Result<GeneratedTree, GenError> {
    let spec_json = fs::read_to_string(spec_path).map_err(|err| GenError::io(spec_path, err))?;
    debug!(
        spec_path = %spec_path.display(),
        spec_len = spec_json.len(),
        "Read OpenAPI document."
    );
    openapi::generate(&spec_json, config)
}

/// Write every file of the tree under `out_dir`, creating directories as needed.
///
/// Files whose contents are already current are left untouched. Returns the
/// number of files written.
pub fn write_tree(tree: &GeneratedTree, out_dir: &Path) -> Result<usize, GenError> {
    let mut written = 0;
    for (relative, contents) in tree.files() {
        let path = out_dir.join(relative);
        if read_existing(&path)?.as_deref() == Some(contents.as_str()) {
            continue;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| GenError::io(parent, err))?;
        }
        fs::write(&path, contents).map_err(|err| GenError::io(&path, err))?;
        debug!(path = %path.display(), len = contents.len(), "Wrote file.");
        written += 1;
    }
    info!(
        out_dir = %out_dir.display(),
        written,
        total = tree.len(),
        "Generated tree written."
    );
    Ok(written)
}

/// Compare the tree with what is on disk without writing anything.
pub fn check_tree(tree: &GeneratedTree, out_dir: &Path) -> Result<Vec<FileDiff>, GenError> {
    let mut diffs = Vec::new();
    for (relative, contents) in tree.files() {
        let path = out_dir.join(relative);
        let existing = read_existing(&path)?.unwrap_or_default();
        if existing == *contents {
            continue;
        }
        let shown = relative.display().to_string();
        let diff = TextDiff::from_lines(existing.as_str(), contents.as_str())
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{shown}"), &format!("b/{shown}"))
            .to_string();
        diffs.push(FileDiff {
            path: relative.clone(),
            diff,
        });
    }
    Ok(diffs)
}

fn read_existing(path: &Path) -> Result<Option<String>, GenError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(GenError::io(path, err)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_tree() -> GeneratedTree {
        let mut tree = GeneratedTree::new();
        tree.insert("pkg/models/__init__.py", "__all__ = []\n".to_string());
        tree.insert("pkg.patch.json", "[]\n".to_string());
        tree
    }

    #[test]
    fn test_write_then_check_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let tree = sample_tree();
        assert_eq!(write_tree(&tree, dir.path()).unwrap(), 2);
        assert!(check_tree(&tree, dir.path()).unwrap().is_empty());
        // A second write finds nothing to do
        assert_eq!(write_tree(&tree, dir.path()).unwrap(), 0);
    }

    #[test]
    fn test_check_reports_unified_diff() {
        let dir = tempfile::tempdir().unwrap();
        let tree = sample_tree();
        write_tree(&tree, dir.path()).unwrap();
        fs::write(dir.path().join("pkg.patch.json"), "[1]\n").unwrap();

        let diffs = check_tree(&tree, dir.path()).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, PathBuf::from("pkg.patch.json"));
        assert!(diffs[0].diff.contains("--- a/pkg.patch.json"));
        assert!(diffs[0].diff.contains("-[1]"));
        assert!(diffs[0].diff.contains("+[]"));
    }

    #[test]
    fn test_missing_spec_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = generate_from_file(&dir.path().join("missing.json"), &GeneratorConfig::default())
            .unwrap_err();
        assert!(matches!(err, GenError::Io { .. }), "got {err:?}");
    }
}
