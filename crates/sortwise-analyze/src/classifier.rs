//! Multi-signal category scoring.

use std::cell::OnceCell;
use std::time::{Duration, SystemTime};

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use sortwise_core::{
    AgeBasis, ClassificationConfig, ClassificationRule, FileCandidate, RuleSet, Signal,
    SignalKind, SignalMatcher,
};

use crate::content::read_text_sample;

/// Configuration for the classifier.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct ClassifierConfig {
    /// Minimum score a category needs to be selected.
    #[builder(default = "1.0")]
    pub min_score: f64,

    /// Content signals only read files up to this size.
    #[builder(default = "1024 * 1024")]
    pub content_max_bytes: u64,

    /// Reference time for age signals (default: now).
    #[builder(default = "SystemTime::now()")]
    pub reference_time: SystemTime,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            content_max_bytes: 1024 * 1024,
            reference_time: SystemTime::now(),
        }
    }
}

impl ClassifierConfig {
    /// Create a new config builder.
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder::default()
    }
}

impl From<&ClassificationConfig> for ClassifierConfig {
    fn from(config: &ClassificationConfig) -> Self {
        Self {
            min_score: config.min_score,
            content_max_bytes: config.content_max_bytes,
            reference_time: SystemTime::now(),
        }
    }
}

/// Coarse confidence level, usable as a folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// Bucket a confidence value.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.75 {
            Self::High
        } else if confidence >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Folder name for this tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// One signal that contributed to a category score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalHit {
    pub category: String,
    pub signal: String,
    pub contribution: f64,
}

/// Outcome of classifying one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Accumulated score per category, in declaration order.
    pub scores: IndexMap<String, f64>,
    /// Selected category, or `None` when unclassified.
    pub category: Option<String>,
    /// Score of the selected category (0 when unclassified).
    pub score: f64,
    /// Score relative to the category's maximum, in [0, 1].
    pub confidence: f64,
    /// Signals that matched, in evaluation order.
    pub hits: Vec<SignalHit>,
}

impl ClassificationResult {
    /// A result with no category.
    pub fn unclassified(scores: IndexMap<String, f64>, hits: Vec<SignalHit>) -> Self {
        Self {
            scores,
            category: None,
            score: 0.0,
            confidence: 0.0,
            hits,
        }
    }

    /// Check if a category was selected.
    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }

    /// Confidence bucket of this result.
    pub fn tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

/// Scores files against a compiled rule set.
pub struct Classifier {
    rules: RuleSet,
    config: ClassifierConfig,
}

impl Classifier {
    /// Create a classifier with default config.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            config: ClassifierConfig::default(),
        }
    }

    /// Create a classifier with custom config.
    pub fn with_config(rules: RuleSet, config: ClassifierConfig) -> Self {
        Self { rules, config }
    }

    /// The rules being evaluated.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify a single file.
    pub fn classify(&self, candidate: &FileCandidate) -> ClassificationResult {
        let file = FileView::new(candidate, &self.config);

        let mut scores = IndexMap::with_capacity(self.rules.len());
        let mut hits = Vec::new();
        let mut best: Option<(&ClassificationRule, f64)> = None;

        for rule in &self.rules {
            let mut score = 0.0;
            for signal in &rule.signals {
                let contribution = file.evaluate(signal);
                if contribution > 0.0 {
                    hits.push(SignalHit {
                        category: rule.category.clone(),
                        signal: signal.kind().to_string(),
                        contribution,
                    });
                    score += contribution;
                }
            }
            scores.insert(rule.category.clone(), score);

            let better = match best {
                None => true,
                Some((current, current_score)) => {
                    score > current_score
                        || (score == current_score && rule.priority > current.priority)
                }
            };
            if better {
                best = Some((rule, score));
            }
        }

        let result = match best {
            Some((rule, score)) if score > 0.0 && score >= self.config.min_score => {
                let max = rule.max_score();
                let confidence = if max > 0.0 {
                    (score / max).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                ClassificationResult {
                    scores,
                    category: Some(rule.category.clone()),
                    score,
                    confidence,
                    hits,
                }
            }
            _ => ClassificationResult::unclassified(scores, hits),
        };

        trace!(
            path = %candidate.path.display(),
            category = ?result.category,
            score = result.score,
            "classified"
        );

        result
    }
}

/// Per-file evaluation state; content is read at most once.
struct FileView<'a> {
    candidate: &'a FileCandidate,
    config: &'a ClassifierConfig,
    name: String,
    parents: Vec<String>,
    content: OnceCell<Option<String>>,
}

impl<'a> FileView<'a> {
    fn new(candidate: &'a FileCandidate, config: &'a ClassifierConfig) -> Self {
        Self {
            candidate,
            config,
            name: candidate.name.as_str().to_lowercase(),
            parents: candidate
                .parent_components()
                .map(|c| c.to_lowercase())
                .collect(),
            content: OnceCell::new(),
        }
    }

    fn content(&self) -> Option<&str> {
        self.content
            .get_or_init(|| {
                read_text_sample(
                    &self.candidate.path,
                    self.candidate.size,
                    self.config.content_max_bytes,
                )
            })
            .as_deref()
    }

    fn age(&self, basis: AgeBasis) -> Option<Duration> {
        let now = self.config.reference_time;
        match basis {
            AgeBasis::Modified => Some(self.candidate.age_since_modified(now)),
            AgeBasis::Accessed => self.candidate.age_since_accessed(now),
        }
    }

    /// Score contributed by one signal (0 when it does not match).
    fn evaluate(&self, signal: &Signal) -> f64 {
        let matches = match &signal.matcher {
            SignalMatcher::Filename(patterns) => patterns
                .iter()
                .filter(|p| self.name.contains(p.as_str()))
                .count(),
            SignalMatcher::FilenameRegex(patterns) => patterns
                .iter()
                .filter(|re| re.is_match(&self.candidate.name))
                .count(),
            SignalMatcher::Extension(extensions) => {
                usize::from(extensions.iter().any(|e| e == self.candidate.extension.as_str()))
            }
            SignalMatcher::Path(keywords) => usize::from(
                self.parents
                    .iter()
                    .any(|dir| keywords.iter().any(|k| dir.contains(k.as_str()))),
            ),
            SignalMatcher::Content(keywords) => match self.content() {
                Some(text) => keywords.iter().filter(|k| text.contains(k.as_str())).count(),
                None => 0,
            },
            SignalMatcher::Age { min, max, basis } => match self.age(*basis) {
                Some(age) => usize::from(
                    min.is_none_or(|m| age >= m) && max.is_none_or(|m| age < m),
                ),
                None => 0,
            },
            SignalMatcher::Size { min, max } => {
                let size = self.candidate.size;
                usize::from(min.is_none_or(|m| size >= m) && max.is_none_or(|m| size <= m))
            }
        };

        if matches > 0 && signal.kind() == SignalKind::Content {
            trace!(path = %self.candidate.path.display(), matches, "content keywords found");
        }

        signal.weight * matches as f64
    }
}
