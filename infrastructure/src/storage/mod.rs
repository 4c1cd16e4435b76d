//! Filesystem persistence for harvested papers

mod paper_store;

pub use paper_store::FsPaperStore;
