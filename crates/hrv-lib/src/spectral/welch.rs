use crate::error::{HrvError, Result};
use crate::spectral::window::WindowFn;
use crate::spectral::Psd;
use log::warn;
use realfft::RealFftPlanner;

/// Welch PSD of a uniformly sampled signal: constant-detrended segments of
/// `window.len()` samples overlapping by `noverlap`, density scaled, one-sided.
pub fn welch(x: &[f64], fs: f64, window: &[f64], noverlap: usize) -> Result<Psd> {
    let nperseg = window.len();
    if nperseg == 0 || x.len() < nperseg {
        return Err(HrvError::NoData(format!(
            "welch needs at least {} samples, got {}",
            nperseg.max(1),
            x.len()
        )));
    }
    if noverlap >= nperseg {
        return Err(HrvError::Config(format!(
            "overlap of {noverlap} samples must be shorter than the {nperseg}-sample segment"
        )));
    }
    let step = nperseg - noverlap;
    let num_segments = (x.len() - noverlap) / step;

    let mut planner = RealFftPlanner::<f64>::new();
    let r2c = planner.plan_fft_forward(nperseg);
    let mut spectrum = r2c.make_output_vec();
    let n_bins = spectrum.len();

    let win_energy: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (fs * win_energy);

    let mut powers = vec![0.0; n_bins];
    for seg in 0..num_segments {
        let slice = &x[seg * step..seg * step + nperseg];
        let mean = slice.iter().sum::<f64>() / nperseg as f64;
        let mut frame: Vec<f64> = slice
            .iter()
            .zip(window)
            .map(|(v, w)| (v - mean) * w)
            .collect();
        r2c.process(&mut frame, &mut spectrum)?;
        for (k, val) in spectrum.iter().enumerate() {
            let power = if k == 0 || (nperseg % 2 == 0 && k == nperseg / 2) {
                val.norm_sqr()
            } else {
                2.0 * val.norm_sqr()
            } * scale;
            powers[k] += power;
        }
    }
    for p in powers.iter_mut() {
        *p /= num_segments as f64;
    }

    let resolution = fs / nperseg as f64;
    Ok(Psd {
        freqs: (0..n_bins).map(|k| k as f64 * resolution).collect(),
        power: powers,
        resolution,
    })
}

/// Welch PSD of resampled intervals, truncated to `f <= f_max`.
///
/// `overlap_pct` is a percentage of `n_win`. A signal shorter than `n_win`
/// is analyzed as a single segment spanning all of it.
pub fn pxx_welch(
    x_uni: &[f64],
    fs: f64,
    n_win: usize,
    overlap_pct: f64,
    win_func: WindowFn,
    f_max: f64,
) -> Result<Psd> {
    if !(0.0..100.0).contains(&overlap_pct) {
        return Err(HrvError::Config(format!(
            "welch_overlap must be in [0, 100), got {overlap_pct}"
        )));
    }
    let mut nperseg = n_win;
    if nperseg > x_uni.len() {
        warn!(
            "welch segment of {} samples exceeds the {} resampled samples; using the whole signal",
            nperseg,
            x_uni.len()
        );
        nperseg = x_uni.len();
    }
    let noverlap = (nperseg as f64 * overlap_pct / 100.0).floor() as usize;
    let window = win_func(nperseg);

    let mut psd = welch(x_uni, fs, &window, noverlap)?;
    let keep = psd.freqs.iter().take_while(|f| **f <= f_max).count();
    psd.freqs.truncate(keep);
    psd.power.truncate(keep);
    Ok(psd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::window::{boxcar, hann};
    use std::f64::consts::PI;

    fn assert_close(actual: f64, expected: f64, rel_tol: f64) {
        let tol = expected.abs().max(1e-12) * rel_tol;
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    fn tone(fs: f64, f0: f64, amp: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * f0 * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn density_integrates_to_signal_variance() {
        // bin-aligned tone: 8 Hz at fs = 64, 64-sample segments
        let fs = 64.0;
        let x = tone(fs, 8.0, 2.0, 1024);
        let psd = welch(&x, fs, &boxcar(64), 32).unwrap();
        let power: f64 = psd.power.iter().sum::<f64>() * psd.resolution;
        assert_close(power, 2.0, 1e-9);
        assert_eq!(psd.freqs.len(), 33);
        assert_close(psd.freqs[32], 32.0, 1e-12);
    }

    #[test]
    fn constant_offset_is_removed() {
        let fs = 4.0;
        let x: Vec<f64> = tone(fs, 0.5, 0.1, 256).iter().map(|v| v + 0.8).collect();
        let psd = welch(&x, fs, &hann(64), 32).unwrap();
        let (peak_idx, peak_power) = psd
            .power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!(psd.power[0] < 1e-6 * peak_power);
        assert_close(psd.freqs[peak_idx], 0.5, 1e-9);
    }

    #[test]
    fn truncates_above_f_max() {
        let fs = 0.9;
        let x = tone(fs, 0.1, 0.05, 540);
        let psd = pxx_welch(&x, fs, 300, 50.0, hann, 0.4).unwrap();
        assert!(!psd.freqs.is_empty());
        assert!(psd.freqs.iter().all(|f| *f <= 0.4));
        assert_eq!(psd.freqs.len(), psd.power.len());
    }

    #[test]
    fn short_signal_uses_single_segment() {
        let fs = 1.0;
        let x = tone(fs, 0.1, 0.05, 100);
        let psd = pxx_welch(&x, fs, 300, 50.0, hann, 0.4).unwrap();
        assert_close(psd.resolution, 0.01, 1e-12);
    }

    #[test]
    fn rejects_full_overlap() {
        let x = vec![0.0; 64];
        for pct in [100.0, -1.0, f64::NAN] {
            let err = pxx_welch(&x, 1.0, 16, pct, hann, 0.4).unwrap_err();
            assert!(matches!(err, HrvError::Config(_)));
        }
    }
}
