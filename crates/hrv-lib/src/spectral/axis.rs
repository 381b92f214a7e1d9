use crate::error::{HrvError, Result};
use serde::{Deserialize, Serialize};

/// Frequency bins to evaluate plus the uniform resampling rate they assume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqAxis {
    pub freqs: Vec<f64>,
    /// Uniform resampling frequency in Hz
    pub fs_uni: f64,
    /// Bin spacing after oversampling (Hz)
    pub resolution: f64,
}

/// Upper bound on resampled samples per window.
pub const MAX_WINDOW_SAMPLES: usize = 1 << 24;
/// Upper bound on frequency bins.
pub const MAX_BINS: usize = 1 << 22;

/// Build the frequency axis for RR intervals resampled at
/// `resample_factor * f_max` and analyzed in windows of `t_win` seconds.
///
/// The window is raised to `1 / f_min` when it is too short to resolve the
/// lowest frequency. Bins start at the resolution step and stay below `f_max`.
pub fn build_uniform_freq_axis(
    t_win: f64,
    f_min: f64,
    f_max: f64,
    resample_factor: f64,
    oversample_factor: f64,
) -> Result<FreqAxis> {
    if !f_min.is_finite() || f_min <= 0.0 {
        return Err(HrvError::Config(format!("f_min must be positive, got {f_min}")));
    }
    if !f_max.is_finite() || f_max <= f_min {
        return Err(HrvError::Config(format!(
            "f_max ({f_max}) must exceed f_min ({f_min})"
        )));
    }
    if !resample_factor.is_finite() || resample_factor < 2.0 {
        return Err(HrvError::Config(format!(
            "resample_factor must be finite and at least 2, got {resample_factor}"
        )));
    }
    if !oversample_factor.is_finite() || oversample_factor < 1.0 {
        return Err(HrvError::Config(format!(
            "oversample_factor must be finite and at least 1, got {oversample_factor}"
        )));
    }

    let t_win = t_win.max(1.0 / f_min);
    let fs_uni = resample_factor * f_max;

    let n_win = (t_win / (1.0 / fs_uni)).floor();
    if n_win > MAX_WINDOW_SAMPLES as f64 {
        return Err(HrvError::Config(format!(
            "window of {t_win}s at {fs_uni} Hz needs {n_win} samples, more than {MAX_WINDOW_SAMPLES}"
        )));
    }
    let n_win_uni = n_win as usize;
    if n_win_uni < 2 {
        return Err(HrvError::Config(format!(
            "window of {t_win}s holds {n_win_uni} samples at {fs_uni} Hz"
        )));
    }

    let ts = t_win / (n_win_uni - 1) as f64;
    let resolution = 1.0 / (n_win_uni as f64 * ts) / oversample_factor;

    let count = ((f_max - resolution) / resolution).ceil().max(0.0);
    if count > MAX_BINS as f64 {
        return Err(HrvError::Config(format!(
            "resolution of {resolution} Hz gives {count} bins, more than {MAX_BINS}"
        )));
    }
    let count = count as usize;
    let freqs = (0..count)
        .map(|i| resolution + i as f64 * resolution)
        .filter(|&f| f < f_max)
        .collect();

    Ok(FreqAxis {
        freqs,
        fs_uni,
        resolution,
    })
}

/// Sample times `t0, t0 + 1/fs, ...` strictly below `t1`.
pub fn uniform_time_axis(t0: f64, t1: f64, fs: f64) -> Vec<f64> {
    let step = 1.0 / fs;
    let count = ((t1 - t0) / step).ceil().max(0.0) as usize;
    (0..count).map(|i| t0 + i as f64 * step).collect()
}
