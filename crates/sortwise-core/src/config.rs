//! Organizer and scan configuration types.

use std::path::{Path, PathBuf};

use ::config::{Config, File, FileFormat};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;
use crate::rule::{RuleConfig, RuleSet};

/// Complete configuration for an organizer run, loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Directory tree to organize.
    #[serde(default)]
    pub source_directory: PathBuf,

    /// Destination layout and policies.
    #[serde(default)]
    pub organization: OrganizationConfig,

    /// Scoring thresholds.
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Category rules, in priority-for-ties order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    /// Exclusions applied while scanning.
    #[serde(default)]
    pub filtering: FilterConfig,

    /// Log level and optional log file.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Final report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// What to do when the destination path already exists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the source untouched.
    Skip,
    /// Append a numeric suffix until a free name is found.
    #[default]
    Rename,
    /// Replace the existing file.
    Overwrite,
}

/// What to do with files whose content was already seen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Leave duplicates where they are.
    #[default]
    Skip,
    /// Move duplicates into the duplicates folder.
    Move,
}

/// Whether files are moved or copied into place.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

/// Optional extra folder level below the category folder.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubBucket {
    #[default]
    None,
    /// `high`, `medium` or `low` confidence.
    Confidence,
    /// `YYYY/MM` of the modification time.
    ModifiedDate,
    /// Lowercase file extension.
    Extension,
}

/// Report output format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Log file rotation period.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogRotation {
    Never,
    Hourly,
    #[default]
    Daily,
}

/// Destination layout and policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationConfig {
    /// Root of the organized tree.
    pub destination_directory: PathBuf,
    /// Folder for files that reach no category.
    pub unclassified_folder: String,
    /// Folder for duplicates when `duplicate_policy` is `move`.
    pub duplicates_folder: String,
    pub conflict_policy: ConflictPolicy,
    pub duplicate_policy: DuplicatePolicy,
    /// Hash file contents to find exact duplicates.
    pub detect_duplicates: bool,
    pub operation: TransferMode,
    pub sub_bucket: SubBucket,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            destination_directory: PathBuf::new(),
            unclassified_folder: "Unsorted".to_string(),
            duplicates_folder: "Duplicates".to_string(),
            conflict_policy: ConflictPolicy::default(),
            duplicate_policy: DuplicatePolicy::default(),
            detect_duplicates: true,
            operation: TransferMode::default(),
            sub_bucket: SubBucket::default(),
        }
    }
}

/// Scoring thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Minimum score a category needs to be selected.
    pub min_score: f64,
    /// Content signals only read files up to this size.
    pub content_max_bytes: u64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            content_max_bytes: 1024 * 1024,
        }
    }
}

/// Exclusions applied while scanning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Directory names whose subtrees are skipped.
    pub exclude_directories: Vec<String>,
    /// File name substrings or glob patterns to skip.
    pub exclude_files: Vec<String>,
    /// Extensions to skip (with or without the dot).
    pub exclude_extensions: Vec<String>,
    /// Include entries starting with `.`.
    pub include_hidden: bool,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Maximum depth below the source root (None = unlimited).
    pub max_depth: Option<u32>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_directories: Vec::new(),
            exclude_files: Vec::new(),
            exclude_extensions: Vec::new(),
            include_hidden: true,
            follow_symlinks: false,
            max_depth: None,
        }
    }
}

/// Log level and optional rotating log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `sortwise=debug`.
    pub level: String,
    /// Log file path; stderr only when unset.
    pub file: Option<PathBuf>,
    pub rotation: LogRotation,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            rotation: LogRotation::default(),
        }
    }
}

/// Final report settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// Write the report here in addition to stdout.
    pub file: Option<PathBuf>,
    /// List every file outcome in text reports.
    pub include_files: bool,
}

impl OrganizerConfig {
    /// Parse a YAML configuration file without validating it.
    ///
    /// Use this when values will be overridden (e.g. from the command line)
    /// before [`validate`](Self::validate) runs.
    pub fn parse(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml).required(true))
            .build()?;
        let mut config: Self = settings.try_deserialize()?;
        config.expand_paths();
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::parse(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML from a string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;
        let mut config: Self = settings.try_deserialize()?;
        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    /// Check required keys and compile rules.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey {
                key: "source_directory",
            });
        }
        if self.organization.destination_directory.as_os_str().is_empty() {
            return Err(ConfigError::MissingKey {
                key: "organization.destination_directory",
            });
        }

        for (key, folder) in [
            ("organization.unclassified_folder", &self.organization.unclassified_folder),
            ("organization.duplicates_folder", &self.organization.duplicates_folder),
        ] {
            if folder.trim().is_empty() || folder.contains(['/', '\\']) || folder == ".." {
                return Err(ConfigError::invalid(format!(
                    "{key} must be a plain folder name, got '{folder}'"
                )));
            }
        }

        let min_score = self.classification.min_score;
        if !min_score.is_finite() || min_score < 0.0 {
            return Err(ConfigError::invalid(format!(
                "classification.min_score must be a non-negative number, got {min_score}"
            )));
        }
        if self.classification.content_max_bytes == 0 {
            return Err(ConfigError::invalid(
                "classification.content_max_bytes must be greater than zero",
            ));
        }

        self.rule_set()?;
        Ok(())
    }

    /// Compile the configured rules.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        RuleSet::compile(&self.rules)
    }

    /// Build the scan configuration for the source tree.
    ///
    /// The destination root is pruned so organized files are never rescanned.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            root: self.source_directory.clone(),
            exclude_directories: self.filtering.exclude_directories.clone(),
            exclude_files: self.filtering.exclude_files.clone(),
            exclude_extensions: self.filtering.exclude_extensions.clone(),
            include_hidden: self.filtering.include_hidden,
            follow_symlinks: self.filtering.follow_symlinks,
            max_depth: self.filtering.max_depth,
            prune_paths: vec![self.organization.destination_directory.clone()],
        }
    }

    /// Expand a leading `~` in every configured path.
    ///
    /// Loading does this already; call it again after overriding paths
    /// from another source such as the command line.
    pub fn expand_paths(&mut self) {
        self.source_directory = expand_home(&self.source_directory);
        self.organization.destination_directory =
            expand_home(&self.organization.destination_directory);
        self.logging.file = self.logging.file.as_deref().map(expand_home);
        self.report.file = self.report.file.as_deref().map(expand_home);
    }
}

/// Expand a leading `~` to the user's home directory.
pub(crate) fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Configuration for a single directory walk.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Directory names to prune.
    #[builder(default)]
    #[serde(default)]
    pub exclude_directories: Vec<String>,

    /// File name substrings or glob patterns to skip.
    #[builder(default)]
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// Extensions to skip.
    #[builder(default)]
    #[serde(default)]
    pub exclude_extensions: Vec<String>,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,

    /// Follow symbolic links.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Maximum depth to traverse (None = unlimited).
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Absolute paths whose subtrees are never entered.
    #[builder(default)]
    #[serde(default)]
    pub prune_paths: Vec<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for scanning a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude_directories: Vec::new(),
            exclude_files: Vec::new(),
            exclude_extensions: Vec::new(),
            include_hidden: true,
            follow_symlinks: false,
            max_depth: None,
            prune_paths: Vec::new(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::SignalConfig;

    const SAMPLE: &str = r#"
source_directory: /data/inbox
organization:
  destination_directory: /data/organized
  conflict_policy: overwrite
  duplicate_policy: move
  sub_bucket: confidence
classification:
  min_score: 2
rules:
  - category: Financial
    priority: 5
    signals:
      - type: filename
        patterns: [invoice, receipt]
        weight: 3
      - type: size
        max_bytes: 1048576
  - category: Temporary
    signals:
      - type: path
        keywords: [Downloads]
        weight: 1
filtering:
  exclude_directories: [.git]
  exclude_extensions: [tmp]
  include_hidden: false
logging:
  level: debug
report:
  format: json
"#;

    #[test]
    fn test_parse_yaml() {
        let config = OrganizerConfig::from_yaml_str(SAMPLE).unwrap();

        assert_eq!(config.source_directory, PathBuf::from("/data/inbox"));
        assert_eq!(config.organization.conflict_policy, ConflictPolicy::Overwrite);
        assert_eq!(config.organization.duplicate_policy, DuplicatePolicy::Move);
        assert_eq!(config.organization.sub_bucket, SubBucket::Confidence);
        assert_eq!(config.organization.unclassified_folder, "Unsorted");
        assert!(config.organization.detect_duplicates);
        assert_eq!(config.classification.min_score, 2.0);
        assert_eq!(config.report.format, ReportFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].priority, 5);
        assert!(matches!(config.rules[1].signals[0], SignalConfig::Path { .. }));
        assert!(!config.filtering.include_hidden);
    }

    #[test]
    fn test_missing_source_directory() {
        let err = OrganizerConfig::from_yaml_str(
            "organization:\n  destination_directory: /out\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey {
                key: "source_directory"
            }
        ));
    }

    #[test]
    fn test_missing_destination_directory() {
        let err = OrganizerConfig::from_yaml_str("source_directory: /in\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { .. }));
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        let err = OrganizerConfig::from_yaml_str(
            "source_directory: /in\norganization:\n  destination_directory: /out\n  conflict_policy: explode\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_malformed_rule_is_rejected_at_load() {
        let err = OrganizerConfig::from_yaml_str(
            r#"
source_directory: /in
organization:
  destination_directory: /out
rules:
  - category: Broken
    signals:
      - type: filename_regex
        patterns: ["[unclosed"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = OrganizerConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("organizer.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = OrganizerConfig::load(&path).unwrap();
        assert_eq!(config.rule_set().unwrap().len(), 2);
    }

    #[test]
    fn test_scan_config_prunes_destination() {
        let config = OrganizerConfig::from_yaml_str(SAMPLE).unwrap();
        let scan = config.scan_config();
        assert_eq!(scan.root, PathBuf::from("/data/inbox"));
        assert_eq!(scan.prune_paths, vec![PathBuf::from("/data/organized")]);
        assert!(scan.exclude_directories.iter().any(|d| d == ".git"));
    }

    #[test]
    fn test_scan_config_builder() {
        let config = ScanConfig::builder()
            .root("/home/user")
            .follow_symlinks(true)
            .exclude_extensions(vec![".log".to_string()])
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/home/user"));
        assert!(config.follow_symlinks);
        assert_eq!(config.exclude_extensions, vec![".log".to_string()]);
        assert!(ScanConfig::builder().build().is_err());
    }

    #[test]
    fn test_expand_paths_after_override() {
        let Some(home) = std::env::var_os("HOME") else {
            return;
        };
        let mut config = OrganizerConfig::from_yaml_str(SAMPLE).unwrap();
        config.source_directory = PathBuf::from("~/inbox");
        config.organization.destination_directory = PathBuf::from("~");
        config.expand_paths();

        assert_eq!(config.source_directory, PathBuf::from(&home).join("inbox"));
        assert_eq!(config.organization.destination_directory, PathBuf::from(&home));
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
    }

    #[test]
    fn test_policy_from_str() {
        use std::str::FromStr;
        assert_eq!(ConflictPolicy::from_str("skip").unwrap(), ConflictPolicy::Skip);
        assert_eq!(SubBucket::ModifiedDate.to_string(), "modified_date");
    }
}
