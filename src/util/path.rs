use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Case-insensitive extension check; `ext` is given without the dot.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Sidecar belonging to `primary`: same stem and directory, sidecar extension.
pub fn sidecar_path(primary: &Path, sidecar_ext: &str) -> PathBuf {
    primary.with_extension(sidecar_ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_ignores_case() {
        assert!(has_extension(Path::new("a/map.MM"), "mm"));
        assert!(!has_extension(Path::new("a/map.mmx"), "mm"));
        assert!(!has_extension(Path::new("a/mm"), "mm"));
    }

    #[test]
    fn test_sidecar_path_replaces_extension() {
        assert_eq!(
            sidecar_path(Path::new("/tmp/maps/plan.mm"), "mmx"),
            PathBuf::from("/tmp/maps/plan.mmx")
        );
    }
}
