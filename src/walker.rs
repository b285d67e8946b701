use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions the catalog knows how to preview, lower-cased and without the dot.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["zip", "svg", "pdf", "png", "jpg", "jpeg"];

/// Lower-cased extension of `path` when it is one the catalog supports.
pub fn supported_extension(path: &Path) -> Option<String> {
    let ext = path.extension().and_then(|s| s.to_str())?.to_lowercase();
    SUPPORTED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Recursively collects every supported file below `root`, in walk order.
///
/// Symbolic links are followed, so a linked template is found under its link
/// path. Entries that cannot be read, including link loops, are logged and
/// skipped.
pub fn discover_files(root: &Path) -> Vec<PathBuf> {
    log::info!("Starting file discovery in {}", root.display());
    log::debug!("Supported extensions: {:?}", SUPPORTED_EXTENSIONS);

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            log::trace!("Skipping non-file entry: {:?}", entry.path());
            continue;
        }

        let path = entry.path();
        if supported_extension(path).is_some() {
            log::debug!("Discovered candidate file: {:?}", path);
            files.push(entry.into_path());
        } else {
            log::trace!("Skipping file due to unsupported extension: {:?}", path);
        }
    }

    log::info!("File discovery complete: {} candidate(s)", files.len());
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_supported_extension_ignores_case() {
        assert_eq!(supported_extension(Path::new("a/B.SVG")).as_deref(), Some("svg"));
        assert_eq!(supported_extension(Path::new("plan.JpEg")).as_deref(), Some("jpeg"));
        assert_eq!(supported_extension(Path::new("notes.txt")), None);
        assert_eq!(supported_extension(Path::new("Makefile")), None);
    }

    #[test]
    fn test_discover_files_recurses_and_filters() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("boxes").join("small");
        fs::create_dir_all(&nested).unwrap();

        fs::write(temp_dir.path().join("a.svg"), b"<svg/>").unwrap();
        fs::write(temp_dir.path().join("readme.txt"), b"hi").unwrap();
        fs::write(nested.join("lid.PDF"), b"%PDF").unwrap();
        fs::write(nested.join("pack.zip"), b"PK").unwrap();
        // A directory named like a supported file is not a candidate.
        fs::create_dir_all(temp_dir.path().join("fake.png")).unwrap();

        let mut found: Vec<_> = discover_files(temp_dir.path())
            .into_iter()
            .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![
                PathBuf::from("a.svg"),
                PathBuf::from("boxes/small/lid.PDF"),
                PathBuf::from("boxes/small/pack.zip"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_files_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("data");
        let shared = temp_dir.path().join("shared");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&shared).unwrap();
        fs::write(shared.join("real.svg"), b"<svg/>").unwrap();
        symlink(shared.join("real.svg"), root.join("linked.svg")).unwrap();
        symlink(&shared, root.join("shared_dir")).unwrap();
        // A loop back to the root is reported and skipped.
        symlink(&root, root.join("loop")).unwrap();

        let mut found: Vec<_> = discover_files(&root)
            .into_iter()
            .map(|p| p.strip_prefix(&root).unwrap().to_path_buf())
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![PathBuf::from("linked.svg"), PathBuf::from("shared_dir/real.svg")]
        );
    }

    #[test]
    fn test_discover_files_in_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_files(&temp_dir.path().join("missing")).is_empty());
    }
}
