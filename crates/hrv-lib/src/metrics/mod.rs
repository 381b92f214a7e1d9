pub mod bands;
pub mod freq;

pub use bands::{band_powers_of, Band, BandPowers, FreqBands, NormMethod};
pub use freq::{hrv_freq, EstimatorInput, FreqAnalysis, FreqAnalyzer, Method, PsdEstimator};
