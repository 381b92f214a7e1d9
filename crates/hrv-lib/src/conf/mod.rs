//! Analysis settings.
//!
//! A process-wide [`Settings`] value holds the defaults callers start from.
//! It is read with [`current`], replaced with [`set`], [`load`] or
//! [`load_str`], and restored with [`reset`]. Analysis functions never read
//! it themselves: they take a [`FreqConfig`] per call.

use crate::error::{HrvError, Result};
use crate::metrics::bands::{Band, FreqBands, NormMethod};
use crate::metrics::freq::Method;
use crate::spectral::WindowChoice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Options of one frequency-domain analysis, as written in settings files.
///
/// Values are kept loosely typed so that a bad file is reported with a
/// configuration error when the analysis runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FreqConfig {
    pub methods: Vec<String>,
    pub norm_method: String,
    pub vlf_band: Vec<f64>,
    pub lf_band: Vec<f64>,
    pub hf_band: Vec<f64>,
    pub extra_bands: Vec<Vec<f64>>,
    /// `None` or a non-positive value selects whole minutes of the recording
    pub window_minutes: Option<f64>,
    pub win_func: WindowChoice,
    pub oversample_factor: f64,
    pub resample_factor: f64,
    /// Welch segment overlap, in percent of the segment length
    pub welch_overlap: f64,
    pub ar_order: usize,
}

impl Default for FreqConfig {
    fn default() -> Self {
        Self {
            methods: vec!["lomb".into(), "welch".into()],
            norm_method: "total".into(),
            vlf_band: vec![0.003, 0.04],
            lf_band: vec![0.04, 0.15],
            hf_band: vec![0.15, 0.4],
            extra_bands: Vec::new(),
            window_minutes: Some(5.0),
            win_func: WindowChoice::default(),
            oversample_factor: 4.0,
            resample_factor: 2.25,
            welch_overlap: 50.0,
            ar_order: 24,
        }
    }
}

impl FreqConfig {
    /// Parsed, non-empty method set.
    pub fn methods(&self) -> Result<BTreeSet<Method>> {
        if self.methods.is_empty() {
            return Err(HrvError::Config("at least one method is required".into()));
        }
        self.methods.iter().map(|m| m.parse::<Method>()).collect()
    }

    pub fn norm_method(&self) -> Result<NormMethod> {
        self.norm_method.parse()
    }

    pub fn bands(&self) -> Result<FreqBands> {
        let extra = self
            .extra_bands
            .iter()
            .enumerate()
            .map(|(i, edges)| Band::from_slice(&format!("extra_bands[{i}]"), edges))
            .collect::<Result<Vec<_>>>()?;
        Ok(FreqBands {
            vlf: Band::from_slice("vlf_band", &self.vlf_band)?,
            lf: Band::from_slice("lf_band", &self.lf_band)?,
            hf: Band::from_slice("hf_band", &self.hf_band)?,
            extra,
        })
    }

    /// Checked Welch overlap percentage.
    pub fn welch_overlap(&self) -> Result<f64> {
        if !(0.0..100.0).contains(&self.welch_overlap) {
            return Err(HrvError::Config(format!(
                "welch_overlap must be in [0, 100), got {}",
                self.welch_overlap
            )));
        }
        Ok(self.welch_overlap)
    }
}

/// All settings, grouped per analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub hrv_freq: FreqConfig,
}

impl Settings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

fn store() -> &'static RwLock<Settings> {
    static SETTINGS: OnceLock<RwLock<Settings>> = OnceLock::new();
    SETTINGS.get_or_init(|| RwLock::new(Settings::default()))
}

/// Snapshot of the process-wide settings.
pub fn current() -> Settings {
    store()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn set(settings: Settings) {
    *store().write().unwrap_or_else(PoisonError::into_inner) = settings;
}

/// Replace the process-wide settings with the contents of a TOML file.
/// Keys missing from the file take their default values.
pub fn load(path: &Path) -> Result<()> {
    set(Settings::from_file(path)?);
    Ok(())
}

pub fn load_str(text: &str) -> Result<()> {
    set(Settings::from_toml_str(text)?);
    Ok(())
}

/// Restore the built-in defaults.
pub fn reset() {
    set(Settings::default());
}
