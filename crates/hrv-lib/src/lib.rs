//! Frequency-domain heart rate variability.
//!
//! RR intervals go in, power spectral densities estimated with Lomb-Scargle,
//! Welch or a pluggable AR estimator come out, together with absolute and
//! normalized power in the VLF, LF and HF bands.

pub mod conf;
pub mod error;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod signal;
pub mod spectral;

pub use conf::{FreqConfig, Settings};
pub use error::{HrvError, Result};
pub use metrics::*;
pub use signal::{RRSeries, RawSeries};
pub use spectral::Psd;
