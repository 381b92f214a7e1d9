//! Spectral estimators for RR interval series.

pub mod axis;
pub mod lomb;
pub mod resample;
pub mod welch;
pub mod window;

use serde::{Deserialize, Serialize};

pub use axis::{build_uniform_freq_axis, uniform_time_axis, FreqAxis};
pub use lomb::{lombscargle, pxx_lomb};
pub use resample::{resample_uniform, CubicSpline};
pub use welch::{pxx_welch, welch};
pub use window::{WindowChoice, WindowFn, WindowRegistry};

/// Power spectral density estimate (s²/Hz) on its own frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Psd {
    pub freqs: Vec<f64>,
    pub power: Vec<f64>,
    /// Bin spacing (Hz), used when integrating band power
    pub resolution: f64,
}

impl Psd {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Frequency of the highest bin, if any.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.power
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| self.freqs[k])
    }
}
