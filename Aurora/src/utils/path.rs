//! Path utilities

use std::path::{Path, PathBuf};

/// Normalize path separators to forward slashes (KEY files use backslashes)
pub fn normalize_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

/// Find `name` inside `dir`, ignoring ASCII case.
///
/// Tries the exact name first so case-insensitive filesystems never pay
/// for a directory scan.
pub fn find_case_insensitive(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(std::result::Result::ok)
        .find(|entry| {
            entry.file_name().to_string_lossy().eq_ignore_ascii_case(name)
                && entry.file_type().is_ok_and(|t| t.is_file())
        })
        .map(|entry| entry.path())
}

/// Resolve a relative path, possibly with backslashes, one component at a
/// time with case-insensitive matching.
pub fn resolve_relative_path(base: &Path, relative: &str) -> Option<PathBuf> {
    let normalized = normalize_path(relative);
    let mut components: Vec<&str> = normalized.split('/').filter(|c| !c.is_empty()).collect();
    let file = components.pop()?;

    let mut dir = base.to_path_buf();
    for component in components {
        let exact = dir.join(component);
        dir = if exact.is_dir() {
            exact
        } else {
            std::fs::read_dir(&dir)
                .ok()?
                .filter_map(std::result::Result::ok)
                .find(|e| {
                    e.file_name().to_string_lossy().eq_ignore_ascii_case(component)
                        && e.file_type().is_ok_and(|t| t.is_dir())
                })?
                .path()
        };
    }
    find_case_insensitive(&dir, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_case_insensitive() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("NW_Chicken.UTC"), b"x").unwrap();

        let found = find_case_insensitive(temp.path(), "nw_chicken.utc").unwrap();
        assert_eq!(found.file_name().unwrap(), "NW_Chicken.UTC");
        assert!(find_case_insensitive(temp.path(), "nw_cow.utc").is_none());
    }

    #[test]
    fn test_resolve_relative_path() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("Data")).unwrap();
        std::fs::write(temp.path().join("Data").join("2DA.bif"), b"x").unwrap();

        let found = resolve_relative_path(temp.path(), "data\\2da.bif").unwrap();
        assert!(found.ends_with("Data/2DA.bif"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("data\\models_01.bif"), "data/models_01.bif");
    }
}
