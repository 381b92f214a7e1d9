//! Window functions and the name registry used to resolve them from settings.
//!
//! All windows are symmetric (the last coefficient mirrors the first), which
//! is what segment tapering of RR intervals expects.

use crate::error::{HrvError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use std::sync::OnceLock;

/// Produces `n` window coefficients.
pub type WindowFn = fn(usize) -> Vec<f64>;

pub fn boxcar(n: usize) -> Vec<f64> {
    vec![1.0; n]
}

/// Generalized cosine window `Σ (-1)^k a_k cos(2πk i / (n-1))`.
fn cosine_sum(n: usize, coeffs: &[f64]) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f64;
    (0..n)
        .map(|i| {
            let phase = 2.0 * PI * i as f64 / denom;
            coeffs
                .iter()
                .enumerate()
                .map(|(k, a)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * a * (k as f64 * phase).cos()
                })
                .sum()
        })
        .collect()
}

pub fn hamming(n: usize) -> Vec<f64> {
    cosine_sum(n, &[0.54, 0.46])
}

pub fn hann(n: usize) -> Vec<f64> {
    cosine_sum(n, &[0.5, 0.5])
}

pub fn blackman(n: usize) -> Vec<f64> {
    cosine_sum(n, &[0.42, 0.5, 0.08])
}

pub fn bartlett(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let half = (n - 1) as f64 / 2.0;
    (0..n)
        .map(|i| 1.0 - ((i as f64 - half) / half).abs())
        .collect()
}

/// Name → window function lookup.
#[derive(Debug, Clone, Default)]
pub struct WindowRegistry {
    entries: BTreeMap<String, WindowFn>,
}

impl WindowRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in windows and their common aliases.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("boxcar", boxcar);
        registry.register("rectangular", boxcar);
        registry.register("hamming", hamming);
        registry.register("hann", hann);
        registry.register("hanning", hann);
        registry.register("blackman", blackman);
        registry.register("bartlett", bartlett);
        registry
    }

    /// Process-wide registry of built-ins, populated on first use.
    pub fn builtin() -> &'static WindowRegistry {
        static BUILTIN: OnceLock<WindowRegistry> = OnceLock::new();
        BUILTIN.get_or_init(Self::with_builtins)
    }

    pub fn register(&mut self, name: &str, func: WindowFn) {
        self.entries.insert(name.to_ascii_lowercase(), func);
    }

    pub fn resolve(&self, name: &str) -> Result<WindowFn> {
        self.entries
            .get(&name.trim().to_ascii_lowercase())
            .copied()
            .ok_or_else(|| {
                HrvError::Config(format!(
                    "unknown window function '{}', expected one of {:?}",
                    name,
                    self.names()
                ))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

/// A window given either by registry name or directly as a function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WindowChoice {
    Named(String),
    Custom(WindowFn),
}

impl WindowChoice {
    pub fn resolve(&self, registry: &WindowRegistry) -> Result<WindowFn> {
        match self {
            WindowChoice::Named(name) => registry.resolve(name),
            WindowChoice::Custom(func) => Ok(*func),
        }
    }
}

impl Default for WindowChoice {
    fn default() -> Self {
        WindowChoice::Named("hamming".into())
    }
}

impl From<String> for WindowChoice {
    fn from(name: String) -> Self {
        WindowChoice::Named(name)
    }
}

impl From<WindowChoice> for String {
    fn from(choice: WindowChoice) -> Self {
        match choice {
            WindowChoice::Named(name) => name,
            WindowChoice::Custom(_) => "custom".into(),
        }
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

    #[test]
    fn hamming_is_symmetric_with_expected_edges() {
        let w = hamming(11);
        assert_close(w[0], 0.08, 1e-12);
        assert_close(w[10], 0.08, 1e-12);
        assert_close(w[5], 1.0, 1e-12);
        for i in 0..w.len() {
            assert_close(w[i], w[w.len() - 1 - i], 1e-12);
        }
    }

    #[test]
    fn degenerate_lengths() {
        assert!(hann(0).is_empty());
        assert_eq!(hann(1), vec![1.0]);
        assert_eq!(bartlett(1), vec![1.0]);
        assert_eq!(boxcar(3), vec![1.0; 3]);
    }

    #[test]
    fn bartlett_peaks_in_the_middle() {
        let w = bartlett(5);
        assert_eq!(w, vec![0.0, 0.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn blackman_edges_are_near_zero() {
        let w = blackman(16);
        assert_close(w[0], 0.0, 1e-12);
        assert_close(w[15], 0.0, 1e-12);
    }

    #[test]
    fn registry_resolves_names_case_insensitively() {
        let registry = WindowRegistry::builtin();
        let f = registry.resolve("Hamming").unwrap();
        assert_eq!(f(7), hamming(7));
        let rect = registry.resolve("rectangular").unwrap();
        assert_eq!(rect(4), boxcar(4));
    }

    #[test]
    fn unknown_name_is_a_config_error() {
        let err = WindowRegistry::builtin().resolve("kaiser").unwrap_err();
        assert!(matches!(err, HrvError::Config(_)));
    }

    #[test]
    fn custom_windows_can_be_registered() {
        fn ramp(n: usize) -> Vec<f64> {
            (0..n).map(|i| (i + 1) as f64).collect()
        }
        let mut registry = WindowRegistry::empty();
        registry.register("ramp", ramp);
        let choice = WindowChoice::Named("ramp".into());
        let f = choice.resolve(&registry).unwrap();
        assert_eq!(f(3), vec![1.0, 2.0, 3.0]);
        assert!(WindowChoice::Custom(ramp).resolve(&WindowRegistry::empty()).is_ok());
    }
}
