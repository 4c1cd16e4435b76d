//! Prompt domain
//!
//! Templates for every stage that talks to an LLM.

mod template;

pub use template::PromptTemplate;
