//! Scope computation.

pub mod histogram;

pub use histogram::{HistogramChannel, HistogramData};
