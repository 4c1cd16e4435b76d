//! Use cases for the XPCS hypothesis assistant

pub mod ask;
pub mod build_knowledge_index;
pub mod draft_hypothesis;
pub mod evaluate_feasibility;
pub mod harvest_citations;
pub(crate) mod shared;
