use std::path::Path;

/// Whether two paths name the same file. Spellings are compared after
/// canonicalisation, so `./in.mp4` and an absolute path to it match.
/// Paths that do not exist yet only match textually.
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_spelling_matches_without_file() {
        assert!(same_file(Path::new("in.mp4"), Path::new("in.mp4")));
        assert!(!same_file(Path::new("in.mp4"), Path::new("out.mp4")));
    }

    #[test]
    fn test_dotted_and_absolute_spellings_match() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("in.mp4");
        std::fs::write(&file, b"x").unwrap();
        let dotted = dir.path().join(".").join("in.mp4");
        let detour = dir.path().join("sub").join("..").join("in.mp4");
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        assert!(same_file(&file, &dotted));
        assert!(same_file(&dotted, &detour));
        assert!(!same_file(&file, &dir.path().join("missing.mp4")));
    }
}
