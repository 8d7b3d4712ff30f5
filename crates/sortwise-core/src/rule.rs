//! Classification rules.
//!
//! Rules are declared in configuration as [`RuleConfig`] values whose signals
//! form a tagged union keyed by `type`. They are compiled once into a
//! [`RuleSet`] at startup, so malformed rules fail the load instead of
//! failing per file during evaluation.

use std::collections::HashSet;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

const SECS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

fn default_weight() -> f64 {
    1.0
}

/// A category as declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Category name; also the destination folder name.
    pub category: String,

    /// Tie-break priority (higher wins).
    #[serde(default)]
    pub priority: i32,

    /// Signals contributing to this category's score.
    #[serde(default)]
    pub signals: Vec<SignalConfig>,
}

/// A single scoring signal as declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalConfig {
    /// Case-insensitive substring of the file name; scores per matching pattern.
    Filename {
        patterns: Vec<String>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Regular expression on the file name; scores per matching pattern.
    FilenameRegex {
        patterns: Vec<String>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// File extension, with or without the leading dot.
    Extension {
        extensions: Vec<String>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Keyword contained in any parent directory name.
    Path {
        keywords: Vec<String>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Keyword found in text content; scores per keyword.
    Content {
        keywords: Vec<String>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Days since modification or access, in `[min_days, max_days)`.
    Age {
        #[serde(default)]
        min_days: Option<f64>,
        #[serde(default)]
        max_days: Option<f64>,
        #[serde(default)]
        basis: AgeBasis,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// File size in bytes, in `[min_bytes, max_bytes]`.
    Size {
        #[serde(default)]
        min_bytes: Option<u64>,
        #[serde(default)]
        max_bytes: Option<u64>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
}

/// Which timestamp an age signal measures from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AgeBasis {
    #[default]
    Modified,
    Accessed,
}

/// Discriminant of a signal, for logging and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SignalKind {
    Filename,
    FilenameRegex,
    Extension,
    Path,
    Content,
    Age,
    Size,
}

/// Compiled matcher for one signal.
#[derive(Debug, Clone)]
pub enum SignalMatcher {
    /// Lowercased substrings.
    Filename(Vec<String>),
    FilenameRegex(Vec<Regex>),
    /// Lowercased extensions without dots.
    Extension(Vec<String>),
    /// Lowercased keywords.
    Path(Vec<String>),
    /// Lowercased keywords.
    Content(Vec<String>),
    Age {
        min: Option<Duration>,
        max: Option<Duration>,
        basis: AgeBasis,
    },
    Size {
        min: Option<u64>,
        max: Option<u64>,
    },
}

/// A compiled signal with its weight.
#[derive(Debug, Clone)]
pub struct Signal {
    pub weight: f64,
    pub matcher: SignalMatcher,
}

impl Signal {
    /// The kind of this signal.
    pub fn kind(&self) -> SignalKind {
        match self.matcher {
            SignalMatcher::Filename(_) => SignalKind::Filename,
            SignalMatcher::FilenameRegex(_) => SignalKind::FilenameRegex,
            SignalMatcher::Extension(_) => SignalKind::Extension,
            SignalMatcher::Path(_) => SignalKind::Path,
            SignalMatcher::Content(_) => SignalKind::Content,
            SignalMatcher::Age { .. } => SignalKind::Age,
            SignalMatcher::Size { .. } => SignalKind::Size,
        }
    }

    /// Highest score this signal can contribute.
    pub fn max_score(&self) -> f64 {
        match &self.matcher {
            SignalMatcher::Filename(p) | SignalMatcher::Content(p) => self.weight * p.len() as f64,
            SignalMatcher::FilenameRegex(p) => self.weight * p.len() as f64,
            _ => self.weight,
        }
    }

    fn compile(category: &str, decl: &SignalConfig) -> Result<Self, ConfigError> {
        let (weight, matcher) = match decl {
            SignalConfig::Filename { patterns, weight } => (
                *weight,
                SignalMatcher::Filename(lowercase_list(category, "filename", patterns)?),
            ),
            SignalConfig::FilenameRegex { patterns, weight } => {
                non_empty(category, "filename_regex", patterns)?;
                let compiled = patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| {
                            ConfigError::invalid_rule(category, format!("bad regex '{p}': {e}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (*weight, SignalMatcher::FilenameRegex(compiled))
            }
            SignalConfig::Extension { extensions, weight } => {
                let list = lowercase_list(category, "extension", extensions)?
                    .into_iter()
                    .map(|e| e.trim_start_matches('.').to_string())
                    .collect();
                (*weight, SignalMatcher::Extension(list))
            }
            SignalConfig::Path { keywords, weight } => (
                *weight,
                SignalMatcher::Path(lowercase_list(category, "path", keywords)?),
            ),
            SignalConfig::Content { keywords, weight } => (
                *weight,
                SignalMatcher::Content(lowercase_list(category, "content", keywords)?),
            ),
            SignalConfig::Age {
                min_days,
                max_days,
                basis,
                weight,
            } => {
                let min = days_to_duration(category, "min_days", *min_days)?;
                let max = days_to_duration(category, "max_days", *max_days)?;
                if min.is_none() && max.is_none() {
                    return Err(ConfigError::invalid_rule(
                        category,
                        "age signal needs min_days or max_days",
                    ));
                }
                if let (Some(lo), Some(hi)) = (min, max) {
                    if lo >= hi {
                        return Err(ConfigError::invalid_rule(
                            category,
                            "age signal min_days must be below max_days",
                        ));
                    }
                }
                (
                    *weight,
                    SignalMatcher::Age {
                        min,
                        max,
                        basis: *basis,
                    },
                )
            }
            SignalConfig::Size {
                min_bytes,
                max_bytes,
                weight,
            } => {
                if min_bytes.is_none() && max_bytes.is_none() {
                    return Err(ConfigError::invalid_rule(
                        category,
                        "size signal needs min_bytes or max_bytes",
                    ));
                }
                if let (Some(lo), Some(hi)) = (min_bytes, max_bytes) {
                    if lo > hi {
                        return Err(ConfigError::invalid_rule(
                            category,
                            "size signal min_bytes exceeds max_bytes",
                        ));
                    }
                }
                (
                    *weight,
                    SignalMatcher::Size {
                        min: *min_bytes,
                        max: *max_bytes,
                    },
                )
            }
        };

        if !weight.is_finite() || weight < 0.0 {
            return Err(ConfigError::invalid_rule(
                category,
                format!("weight must be a non-negative number, got {weight}"),
            ));
        }

        Ok(Self { weight, matcher })
    }
}

/// A compiled, immutable category rule.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    /// Category name.
    pub category: String,
    /// Tie-break priority (higher wins).
    pub priority: i32,
    /// Position in the configuration, used as the final tie-break.
    pub order: usize,
    /// Compiled signals in declaration order.
    pub signals: Vec<Signal>,
}

impl ClassificationRule {
    /// Highest score this rule can accumulate.
    pub fn max_score(&self) -> f64 {
        self.signals.iter().map(Signal::max_score).sum()
    }

    /// Whether any signal needs the file's content.
    pub fn uses_content(&self) -> bool {
        self.signals
            .iter()
            .any(|s| matches!(s.matcher, SignalMatcher::Content(_)))
    }
}

/// All compiled rules, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<ClassificationRule>,
}

impl RuleSet {
    /// Compile declared rules, rejecting anything malformed.
    pub fn compile(decls: &[RuleConfig]) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(decls.len());

        for (order, decl) in decls.iter().enumerate() {
            let category = decl.category.trim();
            if category.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "rule #{} has an empty category name",
                    order + 1
                )));
            }
            if category.contains(['/', '\\']) || category == "." || category == ".." {
                return Err(ConfigError::invalid_rule(
                    category,
                    "category name must be a plain folder name",
                ));
            }
            if !seen.insert(category.to_string()) {
                return Err(ConfigError::invalid_rule(category, "declared more than once"));
            }

            let signals = decl
                .signals
                .iter()
                .map(|s| Signal::compile(category, s))
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(ClassificationRule {
                category: category.to_string(),
                priority: decl.priority,
                order,
                signals,
            });
        }

        Ok(Self { rules })
    }

    /// Iterate rules in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ClassificationRule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Category names in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.category.as_str())
    }

    /// Whether any rule needs file content.
    pub fn uses_content(&self) -> bool {
        self.rules.iter().any(ClassificationRule::uses_content)
    }

    /// Look up a rule by category.
    pub fn get(&self, category: &str) -> Option<&ClassificationRule> {
        self.rules.iter().find(|r| r.category == category)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a ClassificationRule;
    type IntoIter = std::slice::Iter<'a, ClassificationRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

fn non_empty(category: &str, kind: &str, items: &[String]) -> Result<(), ConfigError> {
    if items.is_empty() || items.iter().any(|s| s.trim().is_empty()) {
        return Err(ConfigError::invalid_rule(
            category,
            format!("{kind} signal needs at least one non-empty entry"),
        ));
    }
    Ok(())
}

fn lowercase_list(
    category: &str,
    kind: &str,
    items: &[String],
) -> Result<Vec<String>, ConfigError> {
    non_empty(category, kind, items)?;
    Ok(items.iter().map(|s| s.trim().to_lowercase()).collect())
}

fn days_to_duration(
    category: &str,
    field: &str,
    days: Option<f64>,
) -> Result<Option<Duration>, ConfigError> {
    let Some(d) = days else {
        return Ok(None);
    };
    if !(d.is_finite() && d >= 0.0) {
        return Err(ConfigError::invalid_rule(
            category,
            format!("{field} must be a non-negative number, got {d}"),
        ));
    }
    Duration::try_from_secs_f64(d * SECS_PER_DAY)
        .map(Some)
        .map_err(|_| ConfigError::invalid_rule(category, format!("{field} is too large, got {d}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filename_rule(category: &str, patterns: &[&str], weight: f64) -> RuleConfig {
        RuleConfig {
            category: category.to_string(),
            priority: 0,
            signals: vec![SignalConfig::Filename {
                patterns: patterns.iter().map(|s| s.to_string()).collect(),
                weight,
            }],
        }
    }

    #[test]
    fn test_compile_preserves_order() {
        let rules = RuleSet::compile(&[
            filename_rule("B", &["b"], 1.0),
            filename_rule("A", &["a"], 1.0),
        ])
        .unwrap();

        let categories: Vec<&str> = rules.categories().collect();
        assert_eq!(categories, vec!["B", "A"]);
        assert_eq!(rules.get("A").unwrap().order, 1);
    }

    #[test]
    fn test_max_score_counts_patterns() {
        let rules = RuleSet::compile(&[filename_rule("Docs", &["report", "memo"], 2.5)]).unwrap();
        assert_eq!(rules.get("Docs").unwrap().max_score(), 5.0);
    }

    #[test]
    fn test_rejects_duplicate_category() {
        let err = RuleSet::compile(&[
            filename_rule("Same", &["a"], 1.0),
            filename_rule("Same", &["b"], 1.0),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { .. }));
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = RuleSet::compile(&[filename_rule("Neg", &["a"], -1.0)]).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn test_rejects_bad_regex() {
        let decl = RuleConfig {
            category: "Broken".to_string(),
            priority: 0,
            signals: vec![SignalConfig::FilenameRegex {
                patterns: vec!["(unclosed".to_string()],
                weight: 1.0,
            }],
        };
        let err = RuleSet::compile(&[decl]).unwrap_err();
        assert!(err.to_string().contains("bad regex"));
    }

    #[test]
    fn test_rejects_inverted_age_range() {
        let decl = RuleConfig {
            category: "Old".to_string(),
            priority: 0,
            signals: vec![SignalConfig::Age {
                min_days: Some(30.0),
                max_days: Some(7.0),
                basis: AgeBasis::Modified,
                weight: 1.0,
            }],
        };
        assert!(RuleSet::compile(&[decl]).is_err());
    }

    #[test]
    fn test_rejects_path_like_category() {
        assert!(RuleSet::compile(&[filename_rule("../escape", &["a"], 1.0)]).is_err());
    }

    #[test]
    fn test_extension_dots_are_stripped() {
        let decl = RuleConfig {
            category: "Images".to_string(),
            priority: 0,
            signals: vec![SignalConfig::Extension {
                extensions: vec![".JPG".to_string(), "png".to_string()],
                weight: 1.0,
            }],
        };
        let rules = RuleSet::compile(&[decl]).unwrap();
        match &rules.get("Images").unwrap().signals[0].matcher {
            SignalMatcher::Extension(list) => assert_eq!(list, &vec!["jpg", "png"]),
            other => panic!("unexpected matcher {other:?}"),
        }
    }

    #[test]
    fn test_signal_spec_from_json() {
        let decl: RuleConfig = serde_json::from_str(
            r#"{"category": "Financial", "signals": [{"type": "filename", "patterns": ["invoice"], "weight": 3}]}"#,
        )
        .unwrap();
        assert_eq!(decl.priority, 0);
        assert!(matches!(
            decl.signals[0],
            SignalConfig::Filename { weight, .. } if weight == 3.0
        ));
    }
}
