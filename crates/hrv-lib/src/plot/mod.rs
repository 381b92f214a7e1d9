//! Backend-agnostic figures of frequency-domain results.

use crate::metrics::freq::{FreqAnalysis, Method};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

/// 0xRRGGBB
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over all finite points, if any.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .series
            .iter()
            .flat_map(|series| match series {
                Series::Line(line) => line.points.iter(),
            })
            .filter(|p| p[0].is_finite() && p[1].is_finite());
        let first = points.next()?;
        Some(points.fold(
            (first[0], first[0], first[1], first[1]),
            |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
        ))
    }
}

pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure) -> anyhow::Result<()>;
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| (i as f64 * bucket_size).floor() as usize)
        .take_while(|start| *start < points.len())
        .map(|start| points[start])
        .collect()
}

fn method_color(method: Method) -> Color {
    match method {
        Method::Lomb => Color(0xFF0077),
        Method::Welch => Color(0x0077FF),
        Method::Ar => Color(0x22AA22),
    }
}

/// One PSD curve per estimated method.
pub fn figure_from_analysis_limit(analysis: &FreqAnalysis, max_points: usize) -> Figure {
    let mut fig = Figure::new(Some("Power spectral density".into()));
    fig.x.label = Some("Frequency (Hz)".into());
    fig.y.label = Some("PSD (s²/Hz)".into());
    for (method, psd) in &analysis.psd {
        let points: Vec<[f64; 2]> = psd
            .freqs
            .iter()
            .zip(&psd.power)
            .map(|(f, p)| [*f, *p])
            .collect();
        fig.add_series(Series::Line(LineSeries {
            name: method.to_string(),
            points: decimate_points(&points, max_points),
            style: Style {
                width: 2.0,
                dash: (*method == Method::Welch).then_some([6.0, 3.0]),
                color: method_color(*method),
            },
        }));
    }
    fig
}

pub fn figure_from_analysis(analysis: &FreqAnalysis) -> Figure {
    figure_from_analysis_limit(analysis, 2048)
}
