use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use hrv_lib::{
    conf::{self, FreqConfig, Settings},
    io::text as text_io,
    metrics::{hrv_freq, BandPowers, FreqAnalysis, Method},
    plot::{figure_from_analysis, Figure, PlotBackend, Series, Style},
    spectral::WindowChoice,
};
use log::info;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use serde::Serialize;
use std::{
    collections::BTreeMap,
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "hrv",
    version,
    about = "Frequency-domain heart rate variability from RR intervals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// RR intervals in seconds, one per line, with an optional onset time
    /// column; read from stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,
    /// Onset times in seconds, one per line
    #[arg(long)]
    trr: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
struct FreqArgs {
    /// Settings file (TOML); missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Comma-separated list of lomb, welch, ar
    #[arg(long, value_delimiter = ',')]
    methods: Option<Vec<String>>,
    #[arg(long)]
    norm_method: Option<String>,
    /// Window length in minutes; 0 selects the whole recording
    #[arg(long)]
    window_minutes: Option<f64>,
    #[arg(long)]
    win_func: Option<String>,
    #[arg(long)]
    oversample_factor: Option<f64>,
    #[arg(long)]
    resample_factor: Option<f64>,
    /// Welch segment overlap in percent
    #[arg(long)]
    welch_overlap: Option<f64>,
}

impl FreqArgs {
    fn apply(&self, cfg: &mut FreqConfig) {
        if let Some(methods) = &self.methods {
            cfg.methods = methods.clone();
        }
        if let Some(norm) = &self.norm_method {
            cfg.norm_method = norm.clone();
        }
        if let Some(minutes) = self.window_minutes {
            cfg.window_minutes = Some(minutes);
        }
        if let Some(name) = &self.win_func {
            cfg.win_func = WindowChoice::Named(name.clone());
        }
        if let Some(o) = self.oversample_factor {
            cfg.oversample_factor = o;
        }
        if let Some(r) = self.resample_factor {
            cfg.resample_factor = r;
        }
        if let Some(pct) = self.welch_overlap {
            cfg.welch_overlap = pct;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Power spectral densities and band powers as JSON
    HrvFreq {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        freq: FreqArgs,
        #[arg(long)]
        pretty: bool,
    },
    /// Render the power spectral densities to a PNG via plotters
    HrvPlot {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        freq: FreqArgs,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 800)]
        width: u32,
        #[arg(long, default_value_t = 480)]
        height: u32,
    },
    /// Print the effective settings as TOML
    ShowConfig {
        #[command(flatten)]
        freq: FreqArgs,
    },
}

#[derive(Serialize)]
struct HrvFreqOutput<'a> {
    #[serde(flatten)]
    analysis: &'a FreqAnalysis,
    band_powers: BTreeMap<Method, BandPowers>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::HrvFreq {
            input,
            freq,
            pretty,
        } => cmd_hrv_freq(&input, &freq, pretty)?,
        Commands::HrvPlot {
            input,
            freq,
            out,
            width,
            height,
        } => cmd_hrv_plot(&input, &freq, &out, (width, height))?,
        Commands::ShowConfig { freq } => cmd_show_config(&freq)?,
    }
    Ok(())
}

fn effective_config(args: &FreqArgs) -> Result<FreqConfig> {
    if let Some(path) = &args.config {
        conf::load(path).with_context(|| format!("failed to load {}", path.display()))?;
        info!("loaded settings from {}", path.display());
    }
    let mut cfg = conf::current().hrv_freq;
    args.apply(&mut cfg);
    Ok(cfg)
}

fn read_rr(input: &InputArgs) -> Result<(Vec<f64>, Option<Vec<f64>>)> {
    let (rri, table_trr) = match &input.input {
        Some(path) => text_io::read_rr_table(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_rr_table(&buf)?
        }
    };
    let trr = match (&input.trr, table_trr) {
        (Some(_), Some(_)) => bail!("onset times given both as a column and with --trr"),
        (Some(path), None) => Some(text_io::read_f64_series(path)?),
        (None, column) => column,
    };
    info!(
        "read {} RR intervals{}",
        rri.len(),
        if trr.is_some() { " with onset times" } else { "" }
    );
    Ok((rri, trr))
}

fn analyze(input: &InputArgs, freq: &FreqArgs) -> Result<FreqAnalysis> {
    let cfg = effective_config(freq)?;
    let (rri, trr) = read_rr(input)?;
    Ok(hrv_freq(&rri, trr.as_deref(), &cfg)?)
}

fn cmd_hrv_freq(input: &InputArgs, freq: &FreqArgs, pretty: bool) -> Result<()> {
    let analysis = analyze(input, freq)?;
    let out = HrvFreqOutput {
        band_powers: analysis.all_band_powers(),
        analysis: &analysis,
    };
    let js = if pretty {
        serde_json::to_string_pretty(&out)?
    } else {
        serde_json::to_string(&out)?
    };
    println!("{}", js);
    Ok(())
}

fn cmd_hrv_plot(input: &InputArgs, freq: &FreqArgs, out: &Path, size: (u32, u32)) -> Result<()> {
    let analysis = analyze(input, freq)?;
    let fig = figure_from_analysis(&analysis);
    PngBackend {
        path: out.to_path_buf(),
        size,
    }
    .draw(&fig)?;
    info!("wrote {}", out.display());
    Ok(())
}

fn cmd_show_config(freq: &FreqArgs) -> Result<()> {
    let settings = Settings {
        hrv_freq: effective_config(freq)?,
    };
    print!("{}", toml::to_string_pretty(&settings)?);
    Ok(())
}

/// Dash and gap lengths in pixels, if the line is dashed.
fn dash_pattern(style: &Style) -> Option<(u32, u32)> {
    let [size, spacing] = style.dash?;
    let (size, spacing) = (size.round().max(0.0) as u32, spacing.round().max(0.0) as u32);
    (size > 0 && spacing > 0).then_some((size, spacing))
}

struct PngBackend {
    path: PathBuf,
    size: (u32, u32),
}

impl PlotBackend for PngBackend {
    fn draw(&mut self, fig: &Figure) -> Result<()> {
        let Some((x_min, mut x_max, y_min, mut y_max)) = fig.bounds() else {
            bail!("nothing to plot");
        };
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }
        if y_max <= y_min {
            y_max = y_min + 1.0;
        }

        let root = BitMapBackend::new(&self.path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(
                fig.title.clone().unwrap_or_else(|| "Plot".into()),
                ("sans-serif", 24),
            )
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc(fig.x.label.clone().unwrap_or_default())
            .y_desc(fig.y.label.clone().unwrap_or_default())
            .draw()?;
        for series in &fig.series {
            match series {
                Series::Line(line) => {
                    let (r, g, b) = line.style.color.rgb();
                    let style = RGBColor(r, g, b).stroke_width(line.style.width.round() as u32);
                    let points = line.points.iter().map(|p| (p[0], p[1]));
                    let anno = match dash_pattern(&line.style) {
                        Some((size, spacing)) => chart
                            .draw_series(DashedLineSeries::new(points, size, spacing, style))?,
                        None => chart.draw_series(LineSeries::new(points, style))?,
                    };
                    anno.label(line.name.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
            }
        }
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }
}
