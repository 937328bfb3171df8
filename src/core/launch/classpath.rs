use std::path::Path;

/// Separator between entries of a JVM classpath on this host.
pub fn get_classpath_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}

/// Join paths with the host classpath separator.
pub fn join_classpath<P: AsRef<Path>>(paths: &[P]) -> String {
    paths
        .iter()
        .map(|p| safe_path_str(p.as_ref()))
        .collect::<Vec<_>>()
        .join(get_classpath_separator())
}

/// Absolute, display-ready form of `path` for JVM arguments and hand-off files.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // The JVM rejects extended-length paths (`\\?\C:\...`) on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_and_split_agree() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.jar");
        let b = dir.path().join("b c.jar");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        let joined = join_classpath(&[&a, &b]);
        assert_eq!(
            joined.split(get_classpath_separator()).collect::<Vec<_>>(),
            vec![safe_path_str(&a), safe_path_str(&b)]
        );
        assert_eq!(join_classpath::<&Path>(&[]), "");
    }

    #[test]
    fn missing_paths_are_made_absolute() {
        let text = safe_path_str(Path::new("does/not/exist.jar"));
        assert!(Path::new(&text).is_absolute());
    }
}
