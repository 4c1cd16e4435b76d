//! Progress reporting for citation harvesting

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;
use xpcs_application::{HarvestProgress, HarvestSummary};
use xpcs_domain::{Citation, DownloadRecord, truncate};

const CITATION_CHARS: usize = 60;

/// Reports harvest progress with a bar and a spinner while waiting
pub struct HarvestProgressReporter {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
    wait: Mutex<Option<ProgressBar>>,
}

impl HarvestProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
            wait: Mutex::new(None),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-")
    }

    fn wait_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("  {spinner:.yellow} {msg}")
            .unwrap()
    }

    fn clear_wait(&self) {
        if let Ok(mut wait) = self.wait.lock()
            && let Some(spinner) = wait.take()
        {
            spinner.finish_and_clear();
        }
    }
}

impl Default for HarvestProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvestProgress for HarvestProgressReporter {
    fn on_start(&self, total: usize) {
        let pb = self.multi.add(ProgressBar::new(total as u64));
        pb.set_style(Self::bar_style());
        pb.set_prefix("Harvest");
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_citation_start(&self, index: usize, citation: &Citation) {
        self.clear_wait();
        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!("#{} {}", index, truncate(&citation.raw, CITATION_CHARS)));
        }
    }

    fn on_citation_done(&self, record: &DownloadRecord) {
        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.println(record_line(record));
            pb.inc(1);
        }
    }

    fn on_waiting(&self, delay: Duration) {
        let spinner = self.multi.add(ProgressBar::new_spinner());
        spinner.set_style(Self::wait_style());
        spinner.set_message(format!(
            "waiting {:.0}s before the next search",
            delay.as_secs_f64()
        ));
        spinner.enable_steady_tick(Duration::from_millis(120));

        if let Ok(mut wait) = self.wait.lock() {
            *wait = Some(spinner);
        }
    }

    fn on_finish(&self, summary: &HarvestSummary) {
        self.clear_wait();
        if let Ok(mut bar) = self.bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!(
                "{} {} downloaded, {} manual, {} errors",
                "done:".green(),
                summary.succeeded,
                summary.failed,
                summary.errored
            ));
        }
    }
}

/// Plain line-per-event progress for `--quiet` and non-terminal output
pub struct SimpleHarvestProgress;

impl HarvestProgress for SimpleHarvestProgress {
    fn on_start(&self, total: usize) {
        println!("{} {} citation(s)", "->".cyan(), total);
    }

    fn on_citation_start(&self, index: usize, citation: &Citation) {
        println!("  #{} {}", index, truncate(&citation.raw, CITATION_CHARS));
    }

    fn on_citation_done(&self, record: &DownloadRecord) {
        println!("{}", record_line(record));
    }

    fn on_waiting(&self, delay: Duration) {
        println!("  waiting {:.0}s", delay.as_secs_f64());
    }

    fn on_finish(&self, _summary: &HarvestSummary) {
        println!();
    }
}

fn record_line(record: &DownloadRecord) -> String {
    let detail = record
        .file
        .as_deref()
        .or(record.reason.as_deref())
        .or(record.error.as_deref())
        .unwrap_or("");
    format!(
        "  {} #{} {}",
        ConsoleFormatter::status_label(record.status),
        record.index,
        detail
    )
}
