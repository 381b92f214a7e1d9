//! Lomb-Scargle periodogram for the irregularly sampled RR series.

use crate::error::{HrvError, Result};
use crate::signal::RRSeries;
use crate::spectral::window::{boxcar, WindowFn};
use log::{debug, warn};
use std::f64::consts::PI;

/// Unnormalized Lomb-Scargle periodogram of `y` sampled at times `t`,
/// evaluated at angular frequencies `w`. The mean of `y` is removed first.
pub fn lombscargle(t: &[f64], y: &[f64], w: &[f64]) -> Vec<f64> {
    let n = y.len().min(t.len());
    if n == 0 {
        return vec![0.0; w.len()];
    }
    let mean = y[..n].iter().sum::<f64>() / n as f64;

    w.iter()
        .map(|&omega| {
            let (mut xc, mut xs, mut cc, mut ss, mut cs) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for (&ti, &yi) in t[..n].iter().zip(&y[..n]) {
                let (s, c) = (omega * ti).sin_cos();
                let yc = yi - mean;
                xc += yc * c;
                xs += yc * s;
                cc += c * c;
                ss += s * s;
                cs += c * s;
            }
            let tau = (2.0 * cs).atan2(cc - ss) / (2.0 * omega);
            let (s_tau, c_tau) = (omega * tau).sin_cos();
            let (c_tau2, s_tau2, cs_tau) = (c_tau * c_tau, s_tau * s_tau, 2.0 * c_tau * s_tau);

            let cos_den = c_tau2 * cc + cs_tau * cs + s_tau2 * ss;
            let sin_den = c_tau2 * ss - cs_tau * cs + s_tau2 * cc;
            let cos_term = ratio((c_tau * xc + s_tau * xs).powi(2), cos_den);
            let sin_term = ratio((c_tau * xs - s_tau * xc).powi(2), sin_den);
            0.5 * (cos_term + sin_term)
        })
        .collect()
}

fn ratio(num: f64, den: f64) -> f64 {
    if den.abs() < f64::EPSILON {
        0.0
    } else {
        num / den
    }
}

/// Lomb-Scargle PSD of RR intervals averaged over non-overlapping windows.
///
/// Windows of `t_win` seconds start at the first onset; a trailing window
/// that would end past the last onset is dropped. `t_win` defaults to the
/// whole recording and `win_func` to a rectangular window.
///
/// Each window is centered on its own mean before the taper is applied, so
/// the taper never shapes the mean interval into low-frequency power.
pub fn pxx_lomb(
    series: &RRSeries,
    f_axis: &[f64],
    t_win: Option<f64>,
    win_func: Option<WindowFn>,
) -> Result<Vec<f64>> {
    if series.is_empty() || f_axis.is_empty() {
        return Err(HrvError::NoData(
            "lomb periodogram needs intervals and frequencies".into(),
        ));
    }
    let duration = series.duration();
    let t_win = t_win
        .filter(|t| *t > 0.0)
        .unwrap_or_else(|| duration.floor());
    if t_win <= 0.0 {
        return Err(HrvError::NoData(format!(
            "recording of {duration}s is too short for a lomb window"
        )));
    }
    let win_func = win_func.unwrap_or(boxcar);
    let w_axis: Vec<f64> = f_axis.iter().map(|f| 2.0 * PI * f).collect();

    let f_top = f_axis[f_axis.len() - 1];
    let min_samples_nyq = (2.0 * f_top * t_win).ceil() as usize;

    let num_windows = if duration >= t_win {
        ((duration - t_win) / t_win).floor() as usize + 1
    } else {
        0
    };
    debug!("lomb: {num_windows} window(s) of {t_win}s over {duration}s");

    let sig_start = series.start();
    let sig_end = series.end();
    let mut pxx = vec![0.0; f_axis.len()];
    let mut used = 0usize;
    for i in 0..num_windows {
        let win_start = sig_start + i as f64 * t_win;
        let win_end = win_start + t_win;
        if win_end > sig_end {
            break;
        }

        let (t_win_samples, rri_win): (Vec<f64>, Vec<f64>) = series
            .trr
            .iter()
            .zip(&series.rri)
            .filter(|(t, _)| **t >= win_start && **t < win_end)
            .map(|(t, r)| (*t, *r))
            .unzip();

        if rri_win.len() < 2 {
            warn!(
                "skipping lomb window {i}: only {} sample(s)",
                rri_win.len()
            );
            continue;
        }
        if rri_win.len() < min_samples_nyq {
            warn!(
                "Nyquist criterion not met for lomb periodogram in window {i} ({}/{} samples)",
                rri_win.len(),
                min_samples_nyq
            );
        }

        let coeffs = win_func(rri_win.len());
        let gain = coeffs.iter().sum::<f64>() / coeffs.len() as f64;
        if gain.abs() < f64::EPSILON {
            warn!("skipping lomb window {i}: window coefficients average to zero");
            continue;
        }
        let mean = rri_win.iter().sum::<f64>() / rri_win.len() as f64;
        let tapered: Vec<f64> = rri_win
            .iter()
            .zip(&coeffs)
            .map(|(r, c)| (r - mean) * c)
            .collect();

        let pxx_win = lombscargle(&t_win_samples, &tapered, &w_axis);
        for (acc, p) in pxx.iter_mut().zip(pxx_win) {
            *acc += p / gain;
        }
        used += 1;
    }

    if used == 0 {
        return Err(HrvError::NoData(format!(
            "no {t_win}s lomb window fits within {duration}s of intervals"
        )));
    }
    for p in pxx.iter_mut() {
        *p /= used as f64;
    }
    Ok(pxx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::axis::build_uniform_freq_axis;
    use crate::spectral::window::hamming;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// Intervals of mean `mean_rr` modulated at `f0` Hz, with optional jitter.
    fn modulated_rr(mean_rr: f64, amp: f64, f0: f64, duration: f64, jitter: f64) -> RRSeries {
        let mut rng = StdRng::seed_from_u64(7);
        let mut rri = Vec::new();
        let mut t = 0.0;
        while t < duration {
            let noise = if jitter > 0.0 {
                rng.gen_range(-jitter..jitter)
            } else {
                0.0
            };
            let rr = mean_rr + amp * (2.0 * PI * f0 * t).sin() + noise;
            rri.push(rr);
            t += rr;
        }
        RRSeries::from_slices(&rri, None).unwrap()
    }

    fn peak_freq(f_axis: &[f64], pxx: &[f64]) -> f64 {
        let (idx, _) = pxx
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        f_axis[idx]
    }

    #[test]
    fn sinusoid_peak_is_recovered() {
        let t: Vec<f64> = (0..200).map(|i| i as f64 * 0.5 + 0.1 * (i % 3) as f64).collect();
        let y: Vec<f64> = t.iter().map(|ti| (2.0 * PI * 0.2 * ti).sin()).collect();
        let freqs: Vec<f64> = (1..100).map(|k| k as f64 * 0.005).collect();
        let w: Vec<f64> = freqs.iter().map(|f| 2.0 * PI * f).collect();
        let pxx = lombscargle(&t, &y, &w);
        assert!((peak_freq(&freqs, &pxx) - 0.2).abs() <= 0.005);
    }

    #[test]
    fn injected_component_dominates_the_spectrum() {
        let f0 = 0.1;
        let rr = modulated_rr(0.8, 0.05, f0, 900.0, 0.01);
        let axis = build_uniform_freq_axis(300.0, 0.0033, 0.4, 2.25, 4.0).unwrap();
        let pxx = pxx_lomb(&rr, &axis.freqs, Some(300.0), Some(hamming)).unwrap();
        assert_eq!(pxx.len(), axis.freqs.len());
        let peak = peak_freq(&axis.freqs, &pxx);
        assert!(
            (peak - f0).abs() <= axis.resolution,
            "peak at {peak}, expected {f0} ± {}",
            axis.resolution
        );
    }

    #[test]
    fn defaults_use_whole_recording() {
        let rr = modulated_rr(0.8, 0.04, 0.25, 120.0, 0.0);
        let axis = build_uniform_freq_axis(120.0, 1.0 / 120.0, 0.5, 2.0, 2.0).unwrap();
        let pxx = pxx_lomb(&rr, &axis.freqs, None, None).unwrap();
        let peak = peak_freq(&axis.freqs, &pxx);
        assert!((peak - 0.25).abs() <= axis.resolution);
        assert!(pxx.iter().all(|p| p.is_finite() && *p >= 0.0));
    }

    #[test]
    fn window_longer_than_recording_is_no_data() {
        let rr = modulated_rr(0.8, 0.05, 0.1, 100.0, 0.0);
        let err = pxx_lomb(&rr, &[0.05, 0.1], Some(500.0), None).unwrap_err();
        assert!(matches!(err, HrvError::NoData(_)));
    }

    #[test]
    fn constant_offset_does_not_change_the_spectrum() {
        let rr = modulated_rr(0.8, 0.05, 0.1, 600.0, 0.0);
        let shifted: Vec<f64> = rr.rri.iter().map(|r| r + 0.4).collect();
        let shifted = RRSeries::from_slices(&shifted, Some(&rr.trr)).unwrap();
        let axis = build_uniform_freq_axis(300.0, 0.0033, 0.4, 2.25, 4.0).unwrap();
        let a = pxx_lomb(&rr, &axis.freqs, Some(300.0), Some(hamming)).unwrap();
        let b = pxx_lomb(&shifted, &axis.freqs, Some(300.0), Some(hamming)).unwrap();
        let peak = a.iter().cloned().fold(0.0, f64::max);
        for (pa, pb) in a.iter().zip(&b) {
            assert!((pa - pb).abs() <= 1e-9 * peak, "{pa} vs {pb}");
        }
        // no taper-shaped lobe at the bottom of the axis
        assert!(a[0] < 0.1 * peak);
    }

    #[test]
    fn repeated_calls_are_bit_identical() {
        let rr = modulated_rr(0.8, 0.05, 0.1, 600.0, 0.02);
        let axis = build_uniform_freq_axis(200.0, 0.005, 0.4, 2.25, 2.0).unwrap();
        let a = pxx_lomb(&rr, &axis.freqs, Some(200.0), Some(hamming)).unwrap();
        let b = pxx_lomb(&rr, &axis.freqs, Some(200.0), Some(hamming)).unwrap();
        assert_eq!(a, b);
    }
}
