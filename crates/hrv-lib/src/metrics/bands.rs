use crate::error::{HrvError, Result};
use crate::spectral::Psd;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed frequency interval `[lo, hi]` in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lo: f64,
    pub hi: f64,
}

impl Band {
    pub fn new(lo: f64, hi: f64) -> Result<Self> {
        if !(lo.is_finite() && hi.is_finite()) || lo < 0.0 || lo >= hi {
            return Err(HrvError::Config(format!(
                "band edges must satisfy 0 <= lo < hi, got [{lo}, {hi}]"
            )));
        }
        Ok(Self { lo, hi })
    }

    /// Build from a two-element slice, as bands appear in settings files.
    pub fn from_slice(name: &str, edges: &[f64]) -> Result<Self> {
        match edges {
            [lo, hi] => Self::new(*lo, *hi),
            _ => Err(HrvError::Config(format!(
                "{name} must have exactly two elements, got {}",
                edges.len()
            ))),
        }
    }

    pub fn contains(&self, f: f64) -> bool {
        f >= self.lo && f <= self.hi
    }
}

/// Normalization applied to the LF and HF band powers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormMethod {
    /// Divide by the total spectral power.
    Total,
    /// Divide by LF + HF power.
    LfHf,
}

impl FromStr for NormMethod {
    type Err = HrvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(NormMethod::Total),
            "lf_hf" => Ok(NormMethod::LfHf),
            other => Err(HrvError::Config(format!(
                "unsupported norm_method '{other}', must be one of [\"total\", \"lf_hf\"]"
            ))),
        }
    }
}

impl fmt::Display for NormMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NormMethod::Total => "total",
            NormMethod::LfHf => "lf_hf",
        })
    }
}

/// The standard HRV bands plus caller-defined ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreqBands {
    pub vlf: Band,
    pub lf: Band,
    pub hf: Band,
    #[serde(default)]
    pub extra: Vec<Band>,
}

impl FreqBands {
    /// Lowest frequency to resolve (bottom of VLF).
    pub fn f_min(&self) -> f64 {
        self.vlf.lo
    }

    /// Highest frequency to resolve (top of HF).
    pub fn f_max(&self) -> f64 {
        self.hf.hi
    }
}

/// Absolute and normalized power per band for one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPowers {
    pub vlf: f64,
    pub lf: f64,
    pub hf: f64,
    pub extra: Vec<f64>,
    pub total_power: f64,
    pub vlf_norm: f64,
    pub lf_norm: f64,
    pub hf_norm: f64,
    pub extra_norm: Vec<f64>,
    pub lf_hf: f64,
}

impl BandPowers {
    /// Name of the standard band holding the most power.
    pub fn dominant_band(&self) -> &'static str {
        let mut best = ("vlf", self.vlf);
        for candidate in [("lf", self.lf), ("hf", self.hf)] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    }
}

fn integrate_band(psd: &Psd, band: &Band) -> f64 {
    psd.freqs
        .iter()
        .zip(&psd.power)
        .filter(|(f, _)| band.contains(**f))
        .map(|(_, p)| *p)
        .sum::<f64>()
        * psd.resolution
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Integrate `psd` over each band and normalize.
///
/// VLF and extra bands are always relative to total power; `norm` only
/// selects the denominator for LF and HF.
pub fn band_powers_of(psd: &Psd, bands: &FreqBands, norm: NormMethod) -> BandPowers {
    let total_power = psd.power.iter().sum::<f64>() * psd.resolution;
    let vlf = integrate_band(psd, &bands.vlf);
    let lf = integrate_band(psd, &bands.lf);
    let hf = integrate_band(psd, &bands.hf);
    let extra: Vec<f64> = bands.extra.iter().map(|b| integrate_band(psd, b)).collect();

    let lf_hf_den = match norm {
        NormMethod::Total => total_power,
        NormMethod::LfHf => lf + hf,
    };
    BandPowers {
        vlf,
        lf,
        hf,
        total_power,
        vlf_norm: safe_div(vlf, total_power),
        lf_norm: safe_div(lf, lf_hf_den),
        hf_norm: safe_div(hf, lf_hf_den),
        extra_norm: extra.iter().map(|p| safe_div(*p, total_power)).collect(),
        lf_hf: safe_div(lf, hf),
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    fn bands() -> FreqBands {
        FreqBands {
            vlf: Band::new(0.003, 0.04).unwrap(),
            lf: Band::new(0.04, 0.15).unwrap(),
            hf: Band::new(0.15, 0.4).unwrap(),
            extra: vec![Band::new(0.09, 0.11).unwrap()],
        }
    }

    /// Flat spectrum of 1.0 on 0.01 Hz bins from 0.01 to 0.40.
    fn flat_psd() -> Psd {
        let freqs: Vec<f64> = (1..=40).map(|k| k as f64 * 0.01).collect();
        Psd {
            power: vec![1.0; freqs.len()],
            freqs,
            resolution: 0.01,
        }
    }

    #[test]
    fn band_edges_are_inclusive() {
        let band = Band::new(0.04, 0.15).unwrap();
        assert!(band.contains(0.04));
        assert!(band.contains(0.15));
        assert!(!band.contains(0.151));
    }

    #[test]
    fn malformed_bands_are_config_errors() {
        assert!(matches!(
            Band::from_slice("lf_band", &[0.04]),
            Err(HrvError::Config(_))
        ));
        assert!(matches!(
            Band::from_slice("lf_band", &[0.04, 0.1, 0.2]),
            Err(HrvError::Config(_))
        ));
        assert!(matches!(Band::new(0.2, 0.1), Err(HrvError::Config(_))));
    }

    #[test]
    fn parses_norm_methods() {
        assert_eq!("TOTAL".parse::<NormMethod>().unwrap(), NormMethod::Total);
        assert_eq!("lf_hf".parse::<NormMethod>().unwrap(), NormMethod::LfHf);
        assert!(matches!("lf_af".parse::<NormMethod>(), Err(HrvError::Config(_))));
    }

    #[test]
    fn integrates_flat_spectrum() {
        let powers = band_powers_of(&flat_psd(), &bands(), NormMethod::Total);
        assert_close(powers.total_power, 0.40, 1e-12);
        // LF bins 0.04..=0.15 and HF bins 0.15..=0.40
        assert_close(powers.lf, 0.12, 1e-12);
        assert_close(powers.hf, 0.26, 1e-12);
        assert_close(powers.vlf, 0.04, 1e-12);
        assert_close(powers.extra[0], 0.03, 1e-12);
        assert_close(powers.lf_norm, 0.12 / 0.40, 1e-12);
        assert_close(powers.extra_norm[0], 0.03 / 0.40, 1e-12);
        assert_close(powers.lf_hf, 0.12 / 0.26, 1e-12);
        assert_eq!(powers.dominant_band(), "hf");
    }

    #[test]
    fn lf_hf_normalization_only_touches_lf_and_hf() {
        let total = band_powers_of(&flat_psd(), &bands(), NormMethod::Total);
        let lfhf = band_powers_of(&flat_psd(), &bands(), NormMethod::LfHf);
        assert_close(lfhf.lf_norm + lfhf.hf_norm, 1.0, 1e-12);
        assert_eq!(lfhf.vlf_norm, total.vlf_norm);
        assert_eq!(lfhf.extra_norm, total.extra_norm);
    }

    #[test]
    fn empty_spectrum_yields_zeros() {
        let psd = Psd {
            freqs: vec![],
            power: vec![],
            resolution: 0.01,
        };
        let powers = band_powers_of(&psd, &bands(), NormMethod::LfHf);
        assert_eq!(powers.total_power, 0.0);
        assert_eq!(powers.lf_norm, 0.0);
        assert_eq!(powers.lf_hf, 0.0);
    }
}
