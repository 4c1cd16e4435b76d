//! Progress notification port for citation harvesting

use crate::use_cases::harvest_citations::HarvestSummary;
use std::time::Duration;
use xpcs_domain::{Citation, DownloadRecord};

/// Callback for progress updates during a harvest batch
///
/// Implementations live in the presentation layer.
pub trait HarvestProgress: Send + Sync {
    fn on_start(&self, total: usize);

    fn on_citation_start(&self, index: usize, citation: &Citation);

    fn on_citation_done(&self, record: &DownloadRecord);

    /// Called before sleeping between two citations.
    fn on_waiting(&self, _delay: Duration) {}

    fn on_finish(&self, summary: &HarvestSummary);
}

/// No-op progress for tests and non-interactive runs
pub struct NoHarvestProgress;

impl HarvestProgress for NoHarvestProgress {
    fn on_start(&self, _total: usize) {}
    fn on_citation_start(&self, _index: usize, _citation: &Citation) {}
    fn on_citation_done(&self, _record: &DownloadRecord) {}
    fn on_finish(&self, _summary: &HarvestSummary) {}
}
