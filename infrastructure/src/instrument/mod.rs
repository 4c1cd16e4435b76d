//! Instrument profile loading

mod loader;

pub use loader::{InstrumentLoadError, load_instrument_profile};
