//! Knowledge corpus loading from the local file system
//!
//! - [`LocalKnowledgeLoader`] - implements [`KnowledgeSourcePort`] over
//!   configured directories, files and glob patterns
//!
//! [`KnowledgeSourcePort`]: xpcs_application::KnowledgeSourcePort

mod loader;

pub use loader::LocalKnowledgeLoader;
