//! Data models shared by the fetchers, the scorer and the workflow.
//!
//! All models use `#[serde(default)]` for optional fields so that partial
//! records never fail to load.

mod literature;
mod paper;

pub use literature::{HierarchicalLiterature, LiteratureReference, SubQuestion, SubQuestionMap};
pub use paper::{CandidatePaper, ConfidenceTier, ScoredPaper, tier_label};
