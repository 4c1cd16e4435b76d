//! Harvest Citations use case
//!
//! Builds the publications part of the corpus: for each citation, search a
//! scholarly index, save an open-access PDF when one exists, and leave a
//! manual-download note otherwise. Searches are spaced by a jittered delay,
//! and a rate-limited search is retried once after a longer cooldown.
//! One citation failing never stops the batch; the batch log is always
//! written.

use crate::config::HarvestPolicy;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::harvest_progress::HarvestProgress;
use crate::ports::paper_store::PaperStorePort;
use crate::ports::scholar::{PaperHit, ScholarError, ScholarSearchPort};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use xpcs_domain::{Citation, DownloadRecord, DownloadStatus, batch_log_filename, truncate};

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("No citations to harvest")]
    NoCitations,
}

#[derive(Debug, Clone)]
pub struct HarvestInput {
    pub citations: Vec<Citation>,
    /// 1-based position of the first citation in the full list.
    pub start_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errored: usize,
    pub log_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// True when the batch was stopped before reaching the last citation.
    pub cancelled: bool,
    pub records: Vec<DownloadRecord>,
}

/// Use case for downloading the papers behind a citation list
pub struct HarvestCitationsUseCase {
    scholar: Arc<dyn ScholarSearchPort>,
    store: Arc<dyn PaperStorePort>,
    policy: HarvestPolicy,
    conversation_logger: Arc<dyn ConversationLogger>,
    cancellation: Option<CancellationToken>,
}

impl HarvestCitationsUseCase {
    pub fn new(scholar: Arc<dyn ScholarSearchPort>, store: Arc<dyn PaperStorePort>) -> Self {
        Self {
            scholar,
            store,
            policy: HarvestPolicy::default(),
            conversation_logger: Arc::new(NoConversationLogger),
            cancellation: None,
        }
    }

    pub fn with_policy(mut self, policy: HarvestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Stop between citations (or mid-wait) once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|t| t.is_cancelled())
    }

    pub async fn execute(
        &self,
        input: HarvestInput,
        progress: &dyn HarvestProgress,
    ) -> Result<HarvestSummary, HarvestError> {
        if input.citations.is_empty() {
            return Err(HarvestError::NoCitations);
        }

        let total = input.citations.len();
        info!(
            "Harvesting {} citation(s) starting at #{} into {}",
            total,
            input.start_index,
            self.store.output_dir().display()
        );
        progress.on_start(total);

        let mut records = Vec::with_capacity(total);
        let mut cancelled = false;

        for (i, citation) in input.citations.iter().enumerate() {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }

            let index = input.start_index + i;
            progress.on_citation_start(index, citation);
            let record = self.harvest_one(index, citation, progress).await;
            self.conversation_logger.log(ConversationEvent::new(
                "harvest_record",
                serde_json::to_value(&record).unwrap_or_default(),
            ));
            progress.on_citation_done(&record);
            records.push(record);

            // No wait after the last citation
            if i + 1 < total && !self.wait_between_searches(progress).await {
                cancelled = true;
                break;
            }
        }

        let log_file = self.write_log(input.start_index, &records);
        let count = |status: DownloadStatus| records.iter().filter(|r| r.status == status).count();
        let summary = HarvestSummary {
            total,
            succeeded: count(DownloadStatus::Success),
            failed: count(DownloadStatus::Failed),
            errored: count(DownloadStatus::Error),
            log_file,
            output_dir: self.store.output_dir().to_path_buf(),
            cancelled,
            records,
        };

        info!(
            "Harvest finished: {}/{} downloaded, {} need manual download, {} errors",
            summary.succeeded, summary.total, summary.failed, summary.errored
        );
        progress.on_finish(&summary);
        Ok(summary)
    }

    /// Returns false when cancelled during the wait.
    async fn wait_between_searches(&self, progress: &dyn HarvestProgress) -> bool {
        let delay = self.policy.next_delay();
        debug!("Waiting {:.1}s before next search", delay.as_secs_f64());
        self.pause(delay, progress).await
    }

    /// Sleep for `delay` unless cancelled first; false means cancelled.
    async fn pause(&self, delay: Duration, progress: &dyn HarvestProgress) -> bool {
        if delay.is_zero() {
            return !self.is_cancelled();
        }
        progress.on_waiting(delay);

        match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => false,
                    _ = tokio::time::sleep(delay) => true,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    /// Search once, and once more after a cooldown if the service rate limits us.
    async fn search(
        &self,
        index: usize,
        query: &str,
        progress: &dyn HarvestProgress,
    ) -> Result<Vec<PaperHit>, ScholarError> {
        let limit = self.policy.max_hits_considered;
        match self.scholar.search(query, limit).await {
            Err(ScholarError::RateLimited) => {
                let cooldown = self.policy.next_cooldown();
                warn!(
                    "Citation #{}: rate limited, retrying in {:.0}s",
                    index,
                    cooldown.as_secs_f64()
                );
                if !self.pause(cooldown, progress).await {
                    return Err(ScholarError::RateLimited);
                }
                self.scholar.search(query, limit).await
            }
            other => other,
        }
    }

    async fn harvest_one(
        &self,
        index: usize,
        citation: &Citation,
        progress: &dyn HarvestProgress,
    ) -> DownloadRecord {
        let query = citation.search_query();
        debug!("Citation #{}: searching '{}'", index, truncate(query, 80));

        let hits = match self.search(index, query, progress).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Citation #{}: search failed: {}", index, e);
                return DownloadRecord::error(citation, index, e.to_string());
            }
        };

        let mut reason = if hits.is_empty() {
            "No search results".to_string()
        } else {
            "No open-access PDF found".to_string()
        };

        let pdf_urls = hits
            .iter()
            .take(self.policy.max_hits_considered)
            .filter_map(|hit| hit.pdf_url.as_deref());
        for url in pdf_urls {
            match self.scholar.download_pdf(url).await {
                Ok(bytes) if bytes.starts_with(PDF_MAGIC) => {
                    let filename = citation.pdf_filename(index);
                    match self.store.save_pdf(&filename, &bytes) {
                        Ok(path) => {
                            info!("Citation #{}: saved {}", index, path.display());
                            return DownloadRecord::success(citation, index, filename);
                        }
                        Err(e) => {
                            warn!("Citation #{}: {}", index, e);
                            reason = format!("Could not save PDF: {e}");
                            break;
                        }
                    }
                }
                Ok(_) => {
                    debug!("Citation #{}: {} is not a PDF", index, url);
                    reason = format!("{url} did not return a PDF");
                }
                Err(e) => {
                    debug!("Citation #{}: download of {} failed: {}", index, url, e);
                    reason = format!("Download failed: {e}");
                }
            }
        }

        let manual_url = hits
            .iter()
            .find_map(|hit| hit.landing_url.clone())
            .unwrap_or_else(|| self.scholar.manual_search_url(query));
        let note_name = Citation::manual_note_filename(index);
        let note_file = match self
            .store
            .save_manual_note(&note_name, &citation.manual_note(&manual_url))
        {
            Ok(_) => Some(note_name),
            Err(e) => {
                warn!("Citation #{}: could not write manual note: {}", index, e);
                None
            }
        };

        info!("Citation #{}: {}", index, reason);
        DownloadRecord::failed(citation, index, reason, note_file)
    }

    fn write_log(&self, start_index: usize, records: &[DownloadRecord]) -> Option<PathBuf> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let filename = batch_log_filename(start_index, &timestamp);
        match self.store.save_log(&filename, records) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not write batch log: {}", e);
                None
            }
        }
    }
}
