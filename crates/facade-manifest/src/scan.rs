//! Source scanning.
//!
//! Resolves a component glob such as `src/**/!(*.stories|*.test).ts` to a
//! sorted list of files. Story, test and spec files are excluded by pattern,
//! so they never reach the manifest builder.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::Regex;
use walkdir::WalkDir;

/// Patterns excluded from every scan.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/*.stories.*", "**/*.test.*", "**/*.spec.*"];

/// Errors that can occur while scanning for sources.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("No component sources match {pattern}")]
    NoMatch { pattern: String },

    #[error("Invalid glob pattern {pattern}: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A compiled source glob.
#[derive(Debug, Clone)]
pub struct SourceGlob {
    pattern: String,

    /// Literal directory prefix of the pattern; the walk starts here
    base: PathBuf,

    include: GlobSet,
    exclude: GlobSet,
}

static EXTGLOB_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Match: !(*.stories|*.test).ts
    Regex::new(r"^!\(([^)]*)\)(.*)$").expect("Invalid extglob regex")
});

impl SourceGlob {
    /// Compile a glob pattern.
    pub fn new(pattern: &str) -> Result<Self, ScanError> {
        let segments: Vec<&str> = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        if segments.is_empty() {
            return Err(ScanError::InvalidPattern {
                pattern: pattern.to_string(),
                message: "pattern is empty".to_string(),
            });
        }

        // The last segment always belongs to the glob, even when it is literal
        let literal_len = segments[..segments.len() - 1]
            .iter()
            .take_while(|s| !has_glob_meta(s))
            .count();

        let mut base = PathBuf::new();
        if pattern.starts_with('/') {
            base.push("/");
        }
        for segment in &segments[..literal_len] {
            base.push(segment);
        }

        let mut rest: Vec<String> = segments[literal_len..]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut excludes: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();

        // Rewrite a trailing negated extglob into include + exclude patterns
        if let Some(last) = rest.last_mut() {
            if let Some(cap) = EXTGLOB_RE.captures(last) {
                let suffix = cap.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
                for alternative in cap[1].split('|').filter(|a| !a.is_empty()) {
                    excludes.push(format!("**/{}{}", alternative, suffix));
                }
                *last = format!("*{}", suffix);
            }
        }

        let include = build_set(pattern, &[rest.join("/")])?;
        let exclude = build_set(pattern, &excludes)?;

        Ok(Self {
            pattern: pattern.to_string(),
            base,
            include,
            exclude,
        })
    }

    /// The original pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Directory the walk starts from, relative to the scan root.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Check a path relative to [`SourceGlob::base`].
    pub fn is_match(&self, relative: &Path) -> bool {
        let normalized = relative.to_string_lossy().replace('\\', "/");
        self.include.is_match(&normalized) && !self.exclude.is_match(&normalized)
    }

    /// Resolve the glob against `root`, returning matching files in sorted order.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        let base_dir = root.join(&self.base);

        if !base_dir.is_dir() {
            return Err(ScanError::NoMatch {
                pattern: self.pattern.clone(),
            });
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&base_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .strip_prefix(&base_dir)
                    .map(|relative| self.is_match(relative))
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();

        files.sort();

        if files.is_empty() {
            return Err(ScanError::NoMatch {
                pattern: self.pattern.clone(),
            });
        }

        tracing::debug!("{} matched {} files", self.pattern, files.len());

        Ok(files)
    }
}

/// Resolve `pattern` against `root`.
pub fn scan(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, ScanError> {
    SourceGlob::new(pattern)?.scan(root)
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{', '!', '('])
}

fn build_set(pattern: &str, globs: &[String]) -> Result<GlobSet, ScanError> {
    let invalid = |message: String| ScanError::InvalidPattern {
        pattern: pattern.to_string(),
        message,
    };

    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let compiled = GlobBuilder::new(glob)
            .literal_separator(true)
            .build()
            .map_err(|e| invalid(e.to_string()))?;
        builder.add(compiled);
    }
    builder.build().map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn splits_literal_base() {
        let glob = SourceGlob::new("../components/src/**/*.ts").unwrap();
        assert_eq!(glob.base(), Path::new("../components/src"));
        assert!(glob.is_match(Path::new("button/button.ts")));
        assert!(glob.is_match(Path::new("card.ts")));
        assert!(!glob.is_match(Path::new("card.tsx")));
    }

    #[test]
    fn excludes_stories_and_tests() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/button/button.ts");
        touch(temp.path(), "src/button/button.stories.ts");
        touch(temp.path(), "src/button/button.test.ts");
        touch(temp.path(), "src/card.spec.ts");

        let files = scan(temp.path(), "src/**/*.ts").unwrap();

        assert_eq!(names(temp.path(), &files), vec!["src/button/button.ts"]);
    }

    #[test]
    fn rewrites_negated_extglob() {
        let glob = SourceGlob::new("src/**/!(*.stories|*.types).ts").unwrap();

        assert!(glob.is_match(Path::new("button/button.ts")));
        assert!(!glob.is_match(Path::new("button/button.types.ts")));
        assert!(!glob.is_match(Path::new("button/button.stories.ts")));
        assert!(!glob.is_match(Path::new("button/button.js")));
    }

    #[test]
    fn returns_sorted_paths() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/tabs/tabs.ts");
        touch(temp.path(), "src/alert.ts");
        touch(temp.path(), "src/button/button.ts");

        let first = scan(temp.path(), "src/**/*.ts").unwrap();
        let second = scan(temp.path(), "src/**/*.ts").unwrap();

        assert_eq!(
            names(temp.path(), &first),
            vec!["src/alert.ts", "src/button/button.ts", "src/tabs/tabs.ts"]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn errors_when_nothing_matches() {
        let temp = tempdir().unwrap();
        touch(temp.path(), "src/readme.md");

        let result = scan(temp.path(), "src/**/*.ts");

        assert!(matches!(result, Err(ScanError::NoMatch { .. })));
    }

    #[test]
    fn errors_when_base_is_missing() {
        let temp = tempdir().unwrap();

        let result = scan(temp.path(), "missing/**/*.ts");

        assert!(matches!(result, Err(ScanError::NoMatch { .. })));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let result = SourceGlob::new("src/**/[.ts");
        assert!(matches!(result, Err(ScanError::InvalidPattern { .. })));
    }
}
