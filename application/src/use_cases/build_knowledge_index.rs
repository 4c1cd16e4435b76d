//! Build Knowledge Index use case

use crate::ports::knowledge_source::{KnowledgeError, KnowledgeSourcePort};
use std::sync::Arc;
use tracing::{info, warn};
use xpcs_domain::{ChunkingConfig, KnowledgeIndex};

/// Loads the corpus through a [`KnowledgeSourcePort`] and indexes it.
pub struct BuildKnowledgeIndexUseCase {
    source: Arc<dyn KnowledgeSourcePort>,
}

impl BuildKnowledgeIndexUseCase {
    pub fn new(source: Arc<dyn KnowledgeSourcePort>) -> Self {
        Self { source }
    }

    pub fn execute(&self, chunking: &ChunkingConfig) -> Result<KnowledgeIndex, KnowledgeError> {
        let documents = self.source.load_documents()?;
        let index = KnowledgeIndex::build(documents, chunking);
        let stats = index.stats();

        if index.is_empty() {
            warn!("Knowledge index is empty; answers will not cite any sources");
        } else {
            info!(
                "Knowledge index ready: {} documents, {} chunks, {} terms",
                stats.documents, stats.chunks, stats.vocabulary
            );
        }
        Ok(index)
    }
}
