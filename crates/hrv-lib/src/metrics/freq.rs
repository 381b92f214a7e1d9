//! Frequency-domain HRV: window selection, spectral estimation and the
//! per-method PSDs that band metrics are computed from.

use crate::conf::FreqConfig;
use crate::error::{HrvError, Result};
use crate::metrics::bands::{band_powers_of, BandPowers, FreqBands, NormMethod};
use crate::signal::{RRSeries, RawSeries};
use crate::spectral::{
    build_uniform_freq_axis, pxx_lomb, pxx_welch, resample_uniform, Psd, WindowFn,
    WindowRegistry,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Spectral estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Lomb-Scargle periodogram on the raw intervals.
    Lomb,
    /// Welch's method on the resampled intervals.
    Welch,
    /// Autoregressive model on the resampled intervals.
    Ar,
}

impl FromStr for Method {
    type Err = HrvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lomb" => Ok(Method::Lomb),
            "welch" => Ok(Method::Welch),
            "ar" => Ok(Method::Ar),
            other => Err(HrvError::Config(format!(
                "unsupported method '{other}', must be one of [\"lomb\", \"welch\", \"ar\"]"
            ))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Lomb => "lomb",
            Method::Welch => "welch",
            Method::Ar => "ar",
        })
    }
}

/// Everything an external estimator may need for one analysis call.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorInput<'a> {
    pub rri: &'a [f64],
    pub trr: &'a [f64],
    /// Intervals resampled on the uniform grid
    pub rri_uni: &'a [f64],
    pub fs_uni: f64,
    pub f_axis: &'a [f64],
    pub f_max: f64,
    pub t_win: f64,
    pub n_win_uni: usize,
    pub window: WindowFn,
    pub ar_order: usize,
}

/// Pluggable spectral estimator, used for the `ar` method.
pub trait PsdEstimator: Send + Sync {
    fn estimate(&self, input: &EstimatorInput<'_>) -> Result<Psd>;
}

/// Result of one frequency-domain analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqAnalysis {
    /// Shared frequency axis (Hz); the Lomb PSD is evaluated on it
    pub f_axis: Vec<f64>,
    pub fs_uni: f64,
    /// Window duration used by every estimator (seconds)
    pub t_win: f64,
    pub num_windows: usize,
    pub bands: FreqBands,
    pub norm_method: NormMethod,
    pub psd: BTreeMap<Method, Psd>,
}

impl FreqAnalysis {
    pub fn band_powers(&self, method: Method) -> Option<BandPowers> {
        self.psd
            .get(&method)
            .map(|psd| band_powers_of(psd, &self.bands, self.norm_method))
    }

    pub fn all_band_powers(&self) -> BTreeMap<Method, BandPowers> {
        self.psd
            .iter()
            .map(|(m, psd)| (*m, band_powers_of(psd, &self.bands, self.norm_method)))
            .collect()
    }
}

/// Frequency-domain analyzer bound to one configuration.
pub struct FreqAnalyzer<'a> {
    cfg: FreqConfig,
    registry: &'a WindowRegistry,
    ar: Option<&'a dyn PsdEstimator>,
}

impl<'a> FreqAnalyzer<'a> {
    pub fn new(cfg: FreqConfig) -> Self {
        Self {
            cfg,
            registry: WindowRegistry::builtin(),
            ar: None,
        }
    }

    /// Resolve window names against `registry` instead of the built-ins.
    pub fn with_registry(mut self, registry: &'a WindowRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_ar(mut self, estimator: &'a dyn PsdEstimator) -> Self {
        self.ar = Some(estimator);
        self
    }

    pub fn config(&self) -> &FreqConfig {
        &self.cfg
    }

    /// Validate everything, then estimate the PSD with each requested method.
    pub fn analyze(&self, rri: RawSeries, trr: Option<RawSeries>) -> Result<FreqAnalysis> {
        let cfg = &self.cfg;
        let methods = cfg.methods()?;
        let norm_method = cfg.norm_method()?;
        let window = cfg.win_func.resolve(self.registry)?;
        let series = RRSeries::standardize(rri, trr)?;
        let bands = cfg.bands()?;
        let welch_overlap = cfg.welch_overlap()?;
        self.run(&series, &methods, norm_method, window, bands, welch_overlap)
    }

    pub fn analyze_series(&self, series: &RRSeries) -> Result<FreqAnalysis> {
        let cfg = &self.cfg;
        let methods = cfg.methods()?;
        let norm_method = cfg.norm_method()?;
        let window = cfg.win_func.resolve(self.registry)?;
        let bands = cfg.bands()?;
        let welch_overlap = cfg.welch_overlap()?;
        self.run(series, &methods, norm_method, window, bands, welch_overlap)
    }

    fn run(
        &self,
        series: &RRSeries,
        methods: &BTreeSet<Method>,
        norm_method: NormMethod,
        window: WindowFn,
        bands: FreqBands,
        welch_overlap: f64,
    ) -> Result<FreqAnalysis> {
        let cfg = &self.cfg;
        if series.len() < 4 {
            return Err(HrvError::NoData(format!(
                "frequency analysis needs at least 4 intervals, got {}",
                series.len()
            )));
        }

        let duration = series.duration();
        let window_minutes = match cfg.window_minutes {
            Some(minutes) if minutes > 0.0 => minutes,
            _ => (duration / 60.0).floor().max(1.0),
        };

        let f_min = bands.f_min();
        let f_max = bands.f_max();
        let mut t_win = (60.0 * window_minutes).max(1.0 / f_min);

        let mut num_windows = (duration / t_win).floor() as usize;
        if num_windows < 1 {
            num_windows = 1;
            t_win = duration.floor();
            if t_win <= 0.0 {
                return Err(HrvError::NoData(format!(
                    "recording spans {duration}s, shorter than one second"
                )));
            }
        }

        let axis = build_uniform_freq_axis(
            t_win,
            f_min,
            f_max,
            cfg.resample_factor,
            cfg.oversample_factor,
        )?;
        let fs_uni = axis.fs_uni;

        let (t_uni, rri_uni) = resample_uniform(series, fs_uni)?;
        let n_win_uni = (t_win / (1.0 / fs_uni)).floor() as usize;
        let num_windows_uni = if n_win_uni > 0 {
            t_uni.len() / n_win_uni
        } else {
            0
        };
        debug!(
            "t_win={t_win}s num_windows={num_windows} fs_uni={fs_uni}Hz \
             n_win_uni={n_win_uni} num_windows_uni={num_windows_uni} bins={}",
            axis.freqs.len()
        );
        if (n_win_uni as f64) < 2.0 * f_max * t_win {
            warn!("Nyquist criterion not met for given window length and frequency bands");
        }

        let mut psd = BTreeMap::new();
        if methods.contains(&Method::Lomb) {
            let power = pxx_lomb(series, &axis.freqs, Some(t_win), Some(window))?;
            psd.insert(
                Method::Lomb,
                Psd {
                    freqs: axis.freqs.clone(),
                    power,
                    resolution: axis.resolution,
                },
            );
        }

        if methods.contains(&Method::Welch) {
            let welch = pxx_welch(&rri_uni, fs_uni, n_win_uni, welch_overlap, window, f_max)?;
            psd.insert(Method::Welch, welch);
        }

        if methods.contains(&Method::Ar) {
            match self.ar {
                Some(estimator) => {
                    let input = EstimatorInput {
                        rri: &series.rri,
                        trr: &series.trr,
                        rri_uni: &rri_uni,
                        fs_uni,
                        f_axis: &axis.freqs,
                        f_max,
                        t_win,
                        n_win_uni,
                        window,
                        ar_order: cfg.ar_order,
                    };
                    psd.insert(Method::Ar, estimator.estimate(&input)?);
                }
                None => warn!("no estimator registered for method 'ar'; skipping it"),
            }
        }

        Ok(FreqAnalysis {
            f_axis: axis.freqs,
            fs_uni,
            t_win,
            num_windows,
            bands,
            norm_method,
            psd,
        })
    }
}

/// Frequency-domain analysis of RR intervals (seconds) with optional onset
/// times, using the built-in window registry and no AR estimator.
pub fn hrv_freq(rri: &[f64], trr: Option<&[f64]>, cfg: &FreqConfig) -> Result<FreqAnalysis> {
    FreqAnalyzer::new(cfg.clone()).analyze(rri.into(), trr.map(RawSeries::from))
}
