//! Citation parsing for building the publications part of the corpus.

pub mod entities;
pub mod list;

pub use entities::{Citation, DownloadRecord, DownloadStatus, batch_log_filename};
pub use list::{BatchRange, parse_citation_list, select_batch};
