//! Markdown output formatting.

use std::borrow::Cow;

use crate::models::{HierarchicalLiterature, LiteratureReference, ScoredPaper};

const ABSTRACT_PREVIEW_CHARS: usize = 300;

/// Format a ranked list as Markdown.
#[must_use]
pub fn format_ranked_markdown(query: &str, papers: &[ScoredPaper]) -> String {
    if papers.is_empty() {
        return format!("No literature found for \"{query}\".");
    }

    let mut output = format!("# Literature for \"{}\" ({} results)\n\n", query, papers.len());

    for (i, paper) in papers.iter().enumerate() {
        output.push_str(&format_scored_markdown(paper, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single ranked paper as Markdown.
///
/// `index` is used as the heading number when the paper has no position.
#[must_use]
pub fn format_scored_markdown(paper: &ScoredPaper, index: usize) -> String {
    let mut output = String::new();
    let position = paper.position.unwrap_or(index);

    output.push_str(&format!("## {}. {}\n\n", position, paper.paper.title_or_default()));

    if let Some(label) = &paper.tier_label {
        output.push_str(&format!("*{label}*\n\n"));
    }

    // Score line
    match (paper.relevance, paper.confidence_tier) {
        (Some(relevance), Some(tier)) => {
            output.push_str(&format!("**Relevance**: {relevance:.3} ({tier})"));
            if let Some(rank) = paper.hierarchy_rank {
                output.push_str(&format!(" | **Hierarchy rank**: {rank}"));
            }
            output.push_str("\n\n");
        }
        _ => output.push_str("**Relevance**: unscored\n\n"),
    }

    if !paper.paper.authors.is_empty() {
        output.push_str(&format!("**Authors**: {}\n\n", paper.paper.author_names()));
    }

    let mut meta = Vec::new();
    if let Some(year) = paper.paper.year {
        meta.push(format!("**Year**: {year}"));
    }
    meta.push(format!("**Citations**: {}", paper.paper.citations));
    if let Some(venue) = &paper.paper.venue {
        meta.push(format!("**Venue**: {venue}"));
    }
    meta.push(format!("**Source**: {}", paper.paper.source));
    output.push_str(&format!("{}\n\n", meta.join(" | ")));

    if !paper.paper.url.is_empty() {
        output.push_str(&format!("**Link**: {}\n\n", paper.paper.url));
    }

    if !paper.paper.r#abstract.is_empty() {
        output.push_str(&format!("**Abstract**: {}\n", preview(&paper.paper.r#abstract)));
    }

    output
}

/// Format one sub-question's literature hierarchy as Markdown.
#[must_use]
pub fn format_hierarchy_markdown(literature: &HierarchicalLiterature) -> String {
    let mut output = format!("# {}\n\n", literature.sub_question_text);

    let Some(primary) = &literature.primary_paper else {
        output.push_str("No literature found.\n");
        return output;
    };

    output.push_str(&format!(
        "{} papers, best relevance {:.3}\n\n",
        literature.total_papers, literature.max_relevance_score
    ));
    output.push_str("## Primary reference\n\n");
    output.push_str(&format_reference_line(primary));

    if !literature.supporting_papers.is_empty() {
        output.push_str("\n## Supporting references\n\n");
        for reference in &literature.supporting_papers {
            output.push_str(&format_reference_line(reference));
        }
    }

    output
}

fn format_reference_line(reference: &LiteratureReference) -> String {
    let year = reference.year.map(|y| format!(" ({y})")).unwrap_or_default();
    format!("- **{}**{} [{:.3}] {}\n", reference.title, year, reference.relevance, reference.source)
}

fn preview(text: &str) -> Cow<'_, str> {
    if text.chars().count() > ABSTRACT_PREVIEW_CHARS {
        Cow::Owned(format!("{}...", text.chars().take(ABSTRACT_PREVIEW_CHARS).collect::<String>()))
    } else {
        Cow::Borrowed(text)
    }
}
