//! Source file enumeration.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Find all source files under `root` whose extension is in `extensions`,
/// skipping directories named in `exclude_dirs` (build outputs, vendored
/// dependencies). The result is sorted so runs are reproducible.
pub fn find_source_files(
    root: &Path,
    extensions: &[String],
    exclude_dirs: &[String],
) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry.path(), exclude_dirs))
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_matching_extension(path, extensions))
        .collect();
    files.sort();
    files
}

fn is_excluded_dir(path: &Path, exclude_dirs: &[String]) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| exclude_dirs.iter().any(|dir| dir == name))
            .unwrap_or(false)
}

/// Extensions are configured with a leading dot (".jsx").
fn has_matching_extension(path: &Path, extensions: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.') == ext),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "// source").unwrap();
    }

    #[test]
    fn test_finds_matching_files_sorted() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/Zeta.jsx");
        touch(dir.path(), "src/Alpha.jsx");
        touch(dir.path(), "pages/index.tsx");

        let files = find_source_files(
            dir.path(),
            &strings(&[".jsx", ".tsx"]),
            &strings(&["node_modules"]),
        );

        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("pages/index.tsx"));
        assert!(files[1].ends_with("src/Alpha.jsx"));
        assert!(files[2].ends_with("src/Zeta.jsx"));
    }

    #[test]
    fn test_skips_non_matching_extensions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/App.jsx");
        touch(dir.path(), "src/styles.css");
        touch(dir.path(), "README.md");

        let files = find_source_files(dir.path(), &strings(&[".jsx"]), &[]);
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("App.jsx"));
    }

    #[test]
    fn test_skips_excluded_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/App.jsx");
        touch(dir.path(), "node_modules/lib/index.jsx");
        touch(dir.path(), "dist/bundle.jsx");
        touch(dir.path(), "src/nested/node_modules/dep/a.jsx");

        let files = find_source_files(
            dir.path(),
            &strings(&[".jsx"]),
            &strings(&["node_modules", "dist"]),
        );

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/App.jsx"));
    }

    #[test]
    fn test_extension_match_tolerates_missing_dot() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.ts");

        let files = find_source_files(dir.path(), &strings(&["ts"]), &[]);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_empty_root_yields_no_files() {
        let dir = TempDir::new().unwrap();
        let files = find_source_files(dir.path(), &strings(&[".jsx"]), &[]);
        assert!(files.is_empty());
    }
}
