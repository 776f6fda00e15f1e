//! Command-line parsing for the interferometric model toolkit.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{ObservableKind, RunConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "oifit",
    version,
    about = "Optical Interferometry Model Fitting (OIFITS-based)",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a model to OIFITS data with the ensemble sampler, print
    /// diagnostics, and optionally plot/export.
    Fit(FitArgs),
    /// Compare a model against OIFITS data (chi-square only, no fitting).
    Compare(FitArgs),
    /// Simulate a synthetic dataset from a model and write it as OIFITS.
    Sim(SimArgs),
    /// Run the built-in end-to-end demo (synthetic binary, then a fit);
    /// needs no input files.
    Demo(DemoArgs),
}

/// Common options for fitting and comparison.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// OIFITS file(s) to load.
    #[arg(short = 'd', long = "data", value_name = "OIFITS", required = true, num_args = 1..)]
    pub data: Vec<PathBuf>,

    /// Model JSON file.
    #[arg(short = 'm', long, value_name = "JSON")]
    pub model: PathBuf,

    /// Observables entering the chi-square (default: vis2 t3-phi).
    #[arg(long, value_enum, num_args = 1..)]
    pub observables: Option<Vec<ObservableKind>>,

    /// Minimum wavelength to keep, meters.
    #[arg(long)]
    pub wl_min: Option<f64>,

    /// Maximum wavelength to keep, meters.
    #[arg(long)]
    pub wl_max: Option<f64>,

    /// Minimum MJD to keep.
    #[arg(long)]
    pub mjd_min: Option<f64>,

    /// Maximum MJD to keep.
    #[arg(long)]
    pub mjd_max: Option<f64>,

    /// Minimum projected baseline to keep, meters.
    #[arg(long)]
    pub bl_min: Option<f64>,

    /// Maximum projected baseline to keep, meters.
    #[arg(long)]
    pub bl_max: Option<f64>,

    /// Keep flagged points instead of dropping them.
    #[arg(long)]
    pub keep_flagged: bool,

    /// Number of walkers (0 = auto: max(2 * n_free, 16)).
    #[arg(long, default_value_t = 0)]
    pub walkers: usize,

    /// Sampler steps.
    #[arg(long, default_value_t = 1000)]
    pub steps: usize,

    /// Burn-in steps discarded from the chain.
    #[arg(long, default_value_t = 250)]
    pub burn: usize,

    /// Keep every n-th post-burn step.
    #[arg(long, default_value_t = 1)]
    pub thin: usize,

    /// Random seed (walker init and proposals).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Stretch-move scale parameter.
    #[arg(long, default_value_t = 2.0)]
    pub stretch_a: f64,

    /// Show top-N worst-fitting points.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Render an ASCII VIS2 plot in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 78)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,

    /// Export per-point residuals to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Write the (fitted) model back to JSON.
    #[arg(long = "save-model", value_name = "JSON")]
    pub save_model: Option<PathBuf>,
}

impl FitArgs {
    pub fn to_config(&self) -> RunConfig {
        RunConfig {
            data_paths: self.data.clone(),
            model_path: Some(self.model.clone()),
            observables: self
                .observables
                .clone()
                .unwrap_or_else(ObservableKind::default_set),
            wl_min: self.wl_min,
            wl_max: self.wl_max,
            mjd_min: self.mjd_min,
            mjd_max: self.mjd_max,
            baseline_min: self.bl_min,
            baseline_max: self.bl_max,
            keep_flagged: self.keep_flagged,
            walkers: self.walkers,
            steps: self.steps,
            burn: self.burn,
            thin: self.thin,
            seed: self.seed,
            stretch_a: self.stretch_a,
            top_n: self.top,
            plot: self.plot,
            plot_width: self.width,
            plot_height: self.height,
            export_residuals: self.export.clone(),
            save_model: self.save_model.clone(),
        }
    }
}

/// Options for simulating a synthetic dataset.
#[derive(Debug, Parser)]
pub struct SimArgs {
    /// Model JSON file describing the source.
    #[arg(short = 'm', long, value_name = "JSON")]
    pub model: PathBuf,

    /// Output OIFITS path.
    #[arg(short = 'o', long, value_name = "OIFITS")]
    pub out: PathBuf,

    /// Hour-angle samples per baseline.
    #[arg(long, default_value_t = 6)]
    pub times: usize,

    /// Spectral channels.
    #[arg(long, default_value_t = 5)]
    pub channels: usize,

    /// Wavelength band, meters.
    #[arg(long, default_value_t = 2.0e-6)]
    pub wl_min: f64,
    #[arg(long, default_value_t = 2.4e-6)]
    pub wl_max: f64,

    /// VIS2 noise (1-sigma, absolute).
    #[arg(long, default_value_t = 0.02)]
    pub vis2_err: f64,

    /// Closure-phase noise (1-sigma, degrees).
    #[arg(long, default_value_t = 1.0)]
    pub t3phi_err: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Render an ASCII VIS2 plot of the simulated data.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 78)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 18)]
    pub height: usize,
}

/// Options for the built-in demo.
#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Random seed (data noise and sampler).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Sampler steps.
    #[arg(long, default_value_t = 800)]
    pub steps: usize,

    /// Burn-in steps.
    #[arg(long, default_value_t = 300)]
    pub burn: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_fit_invocation() {
        let cli = Cli::try_parse_from([
            "oifit", "fit", "-d", "night1.fits", "night2.fits", "-m", "model.json", "--steps",
            "500", "--plot",
        ])
        .unwrap();
        match cli.command {
            Command::Fit(args) => {
                assert_eq!(args.data.len(), 2);
                assert_eq!(args.steps, 500);
                assert!(args.plot);
                let cfg = args.to_config();
                assert_eq!(cfg.observables, ObservableKind::default_set());
                assert_eq!(cfg.steps, 500);
            }
            _ => panic!("expected fit"),
        }
    }

    #[test]
    fn observables_are_selectable() {
        let cli = Cli::try_parse_from([
            "oifit",
            "compare",
            "-d",
            "a.fits",
            "-m",
            "m.json",
            "--observables",
            "vis2",
            "vis-amp",
            "t3-phi",
        ])
        .unwrap();
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(
                    args.observables,
                    Some(vec![
                        ObservableKind::Vis2,
                        ObservableKind::VisAmp,
                        ObservableKind::T3Phi
                    ])
                );
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn demo_needs_no_files() {
        let cli = Cli::try_parse_from(["oifit", "demo", "--steps", "100"]).unwrap();
        match cli.command {
            Command::Demo(args) => assert_eq!(args.steps, 100),
            _ => panic!("expected demo"),
        }
    }
}
