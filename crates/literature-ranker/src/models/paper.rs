//! Candidate and scored paper records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A bibliographic record as normalized by a source fetcher, before scoring.
///
/// Every field has a default so that no absent value in an upstream response
/// can make a record unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePaper {
    /// Tag of the API the record came from (e.g. "Semantic Scholar").
    #[serde(default)]
    pub source: String,

    /// Paper title (may be empty).
    #[serde(default)]
    pub title: String,

    /// Paper abstract (may be empty).
    #[serde(default)]
    pub r#abstract: String,

    /// Author names in publication order.
    #[serde(default)]
    pub authors: Vec<String>,

    /// Publication year, when the source knows it.
    #[serde(default)]
    pub year: Option<i32>,

    /// Number of citations; 0 when unknown.
    #[serde(default)]
    pub citations: u32,

    /// Publication venue (journal or conference).
    #[serde(default)]
    pub venue: Option<String>,

    /// Landing page URL (may be empty).
    #[serde(default)]
    pub url: String,
}

impl CandidatePaper {
    /// Text compared against the query: title and abstract joined by one space.
    #[must_use]
    pub fn comparison_text(&self) -> String {
        format!("{} {}", self.title, self.r#abstract)
    }

    /// True when there is nothing to embed.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.title.trim().is_empty() || !self.r#abstract.trim().is_empty()
    }

    /// Get the paper title, falling back to "Untitled" if empty.
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        if self.title.trim().is_empty() { "Untitled" } else { &self.title }
    }

    /// Get author names as a comma-separated string.
    #[must_use]
    pub fn author_names(&self) -> String {
        self.authors.join(", ")
    }
}

/// Discrete confidence bucket derived from the relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// relevance >= 0.8
    Highest,
    /// relevance >= 0.6
    High,
    /// relevance >= 0.4
    Medium,
    /// relevance >= 0.2, and papers with no text at all
    Low,
    /// everything below 0.2
    VeryLow,
}

impl ConfidenceTier {
    /// Thresholds in evaluation order; the first one the score reaches wins.
    const THRESHOLDS: [(f64, Self); 4] =
        [(0.8, Self::Highest), (0.6, Self::High), (0.4, Self::Medium), (0.2, Self::Low)];

    /// Bucket a relevance score.
    #[must_use]
    pub fn from_relevance(relevance: f64) -> Self {
        Self::THRESHOLDS
            .iter()
            .find(|(threshold, _)| relevance >= *threshold)
            .map(|(_, tier)| *tier)
            .unwrap_or(Self::VeryLow)
    }

    /// Hierarchy rank mirroring the tier, 1 (highest) to 5 (very low).
    #[must_use]
    pub const fn hierarchy_rank(self) -> u8 {
        match self {
            Self::Highest => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
            Self::VeryLow => 5,
        }
    }

    /// Wire name of the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Highest => "highest",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate paper enriched with ranking output.
///
/// Papers returned through the scoring fallback keep every ranking field
/// empty; read their relevance through [`ScoredPaper::relevance_or_zero`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPaper {
    /// The underlying record.
    #[serde(flatten)]
    pub paper: CandidatePaper,

    /// Composite relevance score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,

    /// Confidence bucket of `relevance`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_tier: Option<ConfidenceTier>,

    /// Numeric mirror of the tier. Left empty for papers without any text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy_rank: Option<u8>,

    /// 1-based position in the ranked list for this query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    /// True only for position 1.
    #[serde(default)]
    pub is_primary: bool,

    /// Human-readable role derived from the position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_label: Option<String>,
}

impl ScoredPaper {
    /// Wrap a candidate that never went through scoring.
    #[must_use]
    pub fn unscored(paper: CandidatePaper) -> Self {
        Self {
            paper,
            relevance: None,
            confidence_tier: None,
            hierarchy_rank: None,
            position: None,
            is_primary: false,
            tier_label: None,
        }
    }

    /// Relevance, with unscored papers counting as 0.
    #[must_use]
    pub fn relevance_or_zero(&self) -> f64 {
        self.relevance.unwrap_or(0.0)
    }

    /// Whether this paper went through the scorer.
    #[must_use]
    pub const fn is_scored(&self) -> bool {
        self.relevance.is_some()
    }
}

/// Label for a 1-based position in a ranked list.
#[must_use]
pub fn tier_label(position: usize) -> String {
    match position {
        0 | 1 => "Primary Reference (Highest Confidence)".to_string(),
        2 | 3 => format!("Secondary Reference #{} (High Confidence)", position - 1),
        _ => format!("Supporting Reference #{} (Supporting Evidence)", position - 1),
    }
}
