//! Compiled exclusion rules.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use sortwise_core::{ConfigError, ScanConfig};

/// Exclusion rules compiled from a [`ScanConfig`].
///
/// File patterns containing glob metacharacters (`*?[{`) are matched as
/// globs against the file name; anything else is a plain substring.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    directories: HashSet<String>,
    substrings: Vec<String>,
    globs: GlobSet,
    extensions: HashSet<String>,
    include_hidden: bool,
    prune_paths: Vec<PathBuf>,
}

impl ExclusionRules {
    /// Compile the exclusions of a scan config.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ConfigError> {
        let mut substrings = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in &config.exclude_files {
            if pattern.is_empty() {
                continue;
            }
            if is_glob(pattern) {
                let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                builder.add(glob);
            } else {
                substrings.push(pattern.clone());
            }
        }

        let globs = builder.build().map_err(|e| ConfigError::InvalidPattern {
            pattern: config.exclude_files.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            directories: config.exclude_directories.iter().cloned().collect(),
            substrings,
            globs,
            extensions: config
                .exclude_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            include_hidden: config.include_hidden,
            prune_paths: config.prune_paths.iter().map(|p| normalize(p)).collect(),
        })
    }

    /// Check if a directory (and its whole subtree) should be skipped.
    pub fn excludes_dir(&self, name: &str, path: &Path) -> bool {
        self.is_hidden(name)
            || self.directories.contains(name)
            || self.prune_paths.iter().any(|p| path.starts_with(p))
    }

    /// Check if a file should be skipped.
    pub fn excludes_file(&self, name: &str) -> bool {
        if self.is_hidden(name) {
            return true;
        }
        if self.substrings.iter().any(|s| name.contains(s.as_str())) {
            return true;
        }
        if self.globs.is_match(name) {
            return true;
        }
        match Path::new(name).extension() {
            Some(ext) => self
                .extensions
                .contains(&ext.to_string_lossy().to_lowercase()),
            None => false,
        }
    }

    fn is_hidden(&self, name: &str) -> bool {
        !self.include_hidden && name.starts_with('.')
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}

/// Make a path absolute and canonical as far as it exists on disk.
///
/// The missing tail is appended verbatim, so a destination that will only
/// be created during the run still compares equal to walked paths.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut missing = Vec::new();
    let mut current = absolute.as_path();
    loop {
        if let Ok(canonical) = current.canonicalize() {
            let mut result = canonical;
            for part in missing.iter().rev() {
                result.push(part);
            }
            return result;
        }
        match (current.parent(), current.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                current = parent;
            }
            _ => return absolute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(config: ScanConfig) -> ExclusionRules {
        ExclusionRules::from_config(&config).unwrap()
    }

    #[test]
    fn test_substring_and_glob_patterns() {
        let rules = rules(
            ScanConfig::builder()
                .root("/test")
                .exclude_files(vec!["~$".to_string(), "*.tmp".to_string()])
                .build()
                .unwrap(),
        );

        assert!(rules.excludes_file("~$report.docx"));
        assert!(rules.excludes_file("download.tmp"));
        assert!(!rules.excludes_file("report.docx"));
    }

    #[test]
    fn test_extension_exclusion_ignores_case_and_dot() {
        let rules = rules(
            ScanConfig::builder()
                .root("/test")
                .exclude_extensions(vec![".PART".to_string()])
                .build()
                .unwrap(),
        );

        assert!(rules.excludes_file("movie.part"));
        assert!(rules.excludes_file("movie.Part"));
        assert!(!rules.excludes_file("part"));
    }

    #[test]
    fn test_directory_and_hidden_exclusion() {
        let rules = rules(
            ScanConfig::builder()
                .root("/test")
                .exclude_directories(vec!["node_modules".to_string()])
                .include_hidden(false)
                .build()
                .unwrap(),
        );

        assert!(rules.excludes_dir("node_modules", Path::new("/test/node_modules")));
        assert!(rules.excludes_dir(".git", Path::new("/test/.git")));
        assert!(rules.excludes_file(".DS_Store"));
        assert!(!rules.excludes_dir("src", Path::new("/test/src")));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let config = ScanConfig::builder()
            .root("/test")
            .exclude_files(vec!["[".to_string()])
            .build()
            .unwrap();
        assert!(matches!(
            ExclusionRules::from_config(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_normalize_missing_tail() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("not/yet/created");
        let normalized = normalize(&missing);
        assert!(normalized.ends_with("not/yet/created"));
        assert!(normalized.starts_with(temp.path().canonicalize().unwrap()));
    }
}
