//! Workflow-facing literature records keyed by sub-question.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ScoredPaper;

/// One decomposed research question that a literature search runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestion {
    /// Stable identifier used to key results.
    pub id: String,

    /// Question text, used verbatim as the search query.
    pub text: String,
}

impl SubQuestion {
    /// Create a sub-question with a fresh id.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), text: text.into() }
    }

    /// Create a sub-question with a known id.
    #[must_use]
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// Mapping of a sub-question to its data requirements and analysis approach.
///
/// Only sub-questions that have a mapping were analyzed and get literature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuestionMap {
    /// Id of the mapped sub-question.
    pub sub_question_id: String,

    /// Sub-question text as seen by the mapper.
    #[serde(default)]
    pub sub_question: String,

    /// Data needed to answer the sub-question.
    #[serde(default)]
    pub data_requirements: String,

    /// How the data would be analysed.
    #[serde(default)]
    pub analysis_approach: String,
}

/// A ranked paper attached to the sub-question it was found for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteratureReference {
    /// Reference id.
    pub id: String,
    /// Paper title.
    pub title: String,
    /// Author names.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Paper abstract.
    #[serde(default)]
    pub r#abstract: String,
    /// Publication year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Publication venue.
    #[serde(default)]
    pub venue: String,
    /// Landing page URL.
    #[serde(default)]
    pub url: String,
    /// Relevance score; 0 for papers that were not scored.
    #[serde(default)]
    pub relevance: f64,
    /// Source tag.
    #[serde(default)]
    pub source: String,
    /// Sub-question this reference belongs to.
    #[serde(default)]
    pub sub_question_id: String,
    /// 1 = most relevant tier, 5 = least.
    #[serde(default)]
    pub hierarchy_rank: Option<u8>,
    /// True for the single top-ranked paper.
    #[serde(default)]
    pub is_primary: bool,
}

impl LiteratureReference {
    /// Convert a ranked paper into a reference for `sub_question_id`.
    #[must_use]
    pub fn from_scored(paper: ScoredPaper, sub_question_id: &str) -> Self {
        let relevance = paper.relevance_or_zero();
        let ScoredPaper { paper, hierarchy_rank, is_primary, .. } = paper;

        Self {
            id: Uuid::new_v4().to_string(),
            title: paper.title,
            authors: paper.authors,
            r#abstract: paper.r#abstract,
            year: paper.year,
            venue: paper.venue.unwrap_or_default(),
            url: paper.url,
            relevance,
            source: paper.source,
            sub_question_id: sub_question_id.to_string(),
            hierarchy_rank,
            is_primary,
        }
    }
}

/// Literature for one sub-question split into the primary paper and the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalLiterature {
    /// Sub-question id.
    pub sub_question_id: String,
    /// Sub-question text.
    pub sub_question_text: String,
    /// Highest relevance reference.
    pub primary_paper: Option<LiteratureReference>,
    /// Remaining references in descending relevance.
    pub supporting_papers: Vec<LiteratureReference>,
    /// Number of references.
    pub total_papers: usize,
    /// Relevance of the primary paper, 0 when there is none.
    pub max_relevance_score: f64,
}

impl HierarchicalLiterature {
    /// Group references for a sub-question, highest relevance first.
    #[must_use]
    pub fn from_references(
        sub_question: &SubQuestion,
        mut references: Vec<LiteratureReference>,
    ) -> Self {
        references.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));

        let total_papers = references.len();
        let mut papers = references.into_iter();
        let primary_paper = papers.next();
        let max_relevance_score = primary_paper.as_ref().map_or(0.0, |p| p.relevance);

        Self {
            sub_question_id: sub_question.id.clone(),
            sub_question_text: sub_question.text.clone(),
            primary_paper,
            supporting_papers: papers.collect(),
            total_papers,
            max_relevance_score,
        }
    }
}
