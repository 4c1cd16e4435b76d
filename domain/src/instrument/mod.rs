//! Instrument capability profiles.

pub mod profile;

pub use profile::{Detector, GeometryCapability, InstrumentProfile, SampleEnvironment};
