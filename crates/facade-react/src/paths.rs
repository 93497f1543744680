//! Lexical path handling for generated import specifiers.
//!
//! Nothing here touches the file system.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` segments without consulting the file system.
///
/// Leading `..` segments of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}

/// Import specifier for `target` as seen from a module in `from_dir`.
///
/// Both paths should be absolute. Relative inputs work only while the part of
/// `from_dir` below the common prefix is made of plain names; when it climbs
/// with `..` (or the two paths have different roots) the directory names to
/// walk back through are unknown and `None` is returned. The result uses `/`
/// separators and always starts with `./` or `../`.
pub fn relative_specifier(from_dir: &Path, target: &Path) -> Option<String> {
    let from = normalize(from_dir);
    let target = normalize(target);

    let from_parts: Vec<Component<'_>> = from.components().collect();
    let target_parts: Vec<Component<'_>> = target.components().collect();

    let common = from_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let climbs_by_name = from_parts[common..]
        .iter()
        .all(|c| matches!(c, Component::Normal(_)));
    let descends_by_path = target_parts[common..]
        .iter()
        .all(|c| matches!(c, Component::Normal(_) | Component::ParentDir));
    if !climbs_by_name || !descends_by_path {
        return None;
    }

    let mut segments: Vec<String> = Vec::new();
    segments.extend(std::iter::repeat("..".to_string()).take(from_parts.len() - common));
    segments.extend(
        target_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().to_string()),
    );

    let joined = segments.join("/");
    if segments.first().is_some_and(|s| s == "..") {
        Some(joined)
    } else {
        Some(format!("./{}", joined))
    }
}

/// Drop the final extension of a module path (`button.ts` to `button`).
pub fn strip_extension(path: &Path) -> PathBuf {
    match path.extension() {
        Some(_) => path.with_extension(""),
        None => path.to_path_buf(),
    }
}

/// Whether `path` lies inside `dir`, compared lexically.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    normalize(path).starts_with(normalize(dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_dot_segments() {
        assert_eq!(
            normalize(Path::new("/repo/src/react/../button/./button.ts")),
            PathBuf::from("/repo/src/button/button.ts")
        );
        assert_eq!(
            normalize(Path::new("../components/src/../dist")),
            PathBuf::from("../components/dist")
        );
        assert_eq!(normalize(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn builds_relative_specifiers() {
        assert_eq!(
            relative_specifier(Path::new("/repo/src/react"), Path::new("/repo/src/button/button")),
            Some("../button/button".to_string())
        );
        assert_eq!(
            relative_specifier(Path::new("/repo/src"), Path::new("/repo/src/card")),
            Some("./card".to_string())
        );
        assert_eq!(
            relative_specifier(Path::new("dist"), Path::new("src/button/button")),
            Some("../src/button/button".to_string())
        );
        assert_eq!(
            relative_specifier(Path::new("/repo/src"), Path::new("/repo/src/..button/x")),
            Some("./..button/x".to_string())
        );
    }

    #[test]
    fn climbs_out_of_relative_base() {
        assert_eq!(
            relative_specifier(Path::new("src/react"), Path::new("../lib/button")),
            Some("../../../lib/button".to_string())
        );
    }

    #[test]
    fn refuses_to_climb_back_through_unknown_directories() {
        // From `../types`, reaching `src/x` means re-entering the current
        // directory, whose name is unknown
        assert_eq!(relative_specifier(Path::new("../types"), Path::new("src/x")), None);
        assert_eq!(relative_specifier(Path::new("../../out"), Path::new("../src/x")), None);
        assert_eq!(relative_specifier(Path::new("/repo/dist"), Path::new("src/x")), None);
    }

    #[test]
    fn resolves_outside_directories_when_absolute() {
        assert_eq!(
            relative_specifier(Path::new("/work/types"), Path::new("/work/repo/src/x")),
            Some("../repo/src/x".to_string())
        );
    }

    #[test]
    fn strips_only_final_extension() {
        assert_eq!(
            strip_extension(Path::new("src/button.element.ts")),
            PathBuf::from("src/button.element")
        );
        assert_eq!(strip_extension(Path::new("src/button")), PathBuf::from("src/button"));
    }

    #[test]
    fn checks_containment() {
        assert!(is_within(Path::new("/repo/src/a/../b.ts"), Path::new("/repo/src")));
        assert!(!is_within(Path::new("/repo/src/../lib/b.ts"), Path::new("/repo/src")));
    }
}
