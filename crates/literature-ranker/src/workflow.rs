//! Literature node of the research-design workflow.
//!
//! Runs one search per analyzed sub-question and keys the references by the
//! sub-question's id.

use std::collections::HashSet;
use std::time::Instant;

use indexmap::IndexMap;

use crate::config::limits;
use crate::models::{HierarchicalLiterature, LiteratureReference, SubQuestion, SubQuestionMap};
use crate::search::LiteratureSearch;

/// References per sub-question id, in the order the sub-questions were searched.
pub type LiteratureMap = IndexMap<String, Vec<LiteratureReference>>;

/// How the node bounds its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteratureNodeOptions {
    /// Papers kept per sub-question.
    pub papers_per_sub_question: usize,
    /// Sub-questions searched per run; the rest are skipped.
    pub max_sub_questions: usize,
}

impl Default for LiteratureNodeOptions {
    fn default() -> Self {
        Self {
            papers_per_sub_question: limits::PAPERS_PER_SUB_QUESTION,
            max_sub_questions: limits::MAX_SUB_QUESTIONS,
        }
    }
}

/// Search literature for every sub-question that has a mapping.
///
/// Sub-questions are searched one after another with their text as the
/// query. A failed search leaves that sub-question with no references.
pub async fn search_literature_for_sub_questions(
    search: &LiteratureSearch,
    sub_questions: &[SubQuestion],
    mappings: &[SubQuestionMap],
    options: LiteratureNodeOptions,
) -> LiteratureMap {
    let mut literature = LiteratureMap::new();

    if mappings.is_empty() {
        tracing::warn!("no mappings found, skipping literature search");
        return literature;
    }

    let analyzed: HashSet<&str> = mappings
        .iter()
        .map(|m| m.sub_question_id.as_str())
        .filter(|id| !id.is_empty())
        .collect();
    let mut targets: Vec<&SubQuestion> =
        sub_questions.iter().filter(|sq| analyzed.contains(sq.id.as_str())).collect();

    if targets.is_empty() {
        tracing::warn!("no analyzed sub-questions found for literature search");
        return literature;
    }

    if targets.len() > options.max_sub_questions {
        tracing::info!(
            total = targets.len(),
            searched = options.max_sub_questions,
            "limiting literature search to the first sub-questions"
        );
        targets.truncate(options.max_sub_questions);
    }

    let started = Instant::now();
    let total = targets.len();

    for (index, sub_question) in targets.into_iter().enumerate() {
        tracing::info!(current = index + 1, total, id = %sub_question.id, "searching sub-question");

        let papers = match search.search(&sub_question.text, options.papers_per_sub_question).await {
            Ok(papers) => papers,
            Err(error) => {
                tracing::warn!(id = %sub_question.id, %error, "literature search rejected");
                Vec::new()
            }
        };

        let references = papers
            .into_iter()
            .map(|paper| LiteratureReference::from_scored(paper, &sub_question.id))
            .collect();
        literature.insert(sub_question.id.clone(), references);
    }

    tracing::info!(
        sub_questions = literature.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "literature search for all sub-questions completed"
    );
    literature
}

/// Group each sub-question's references into primary and supporting papers.
#[must_use]
pub fn build_hierarchy(
    sub_questions: &[SubQuestion],
    literature: &LiteratureMap,
) -> Vec<HierarchicalLiterature> {
    sub_questions
        .iter()
        .filter_map(|sq| {
            let references = literature.get(&sq.id)?;
            Some(HierarchicalLiterature::from_references(sq, references.clone()))
        })
        .collect()
}
