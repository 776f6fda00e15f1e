//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during simulation and fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Interferometric observable kinds the toolkit understands.
///
/// `Vis2` and `T3Phi` are the workhorses: squared visibilities constrain
/// source size, closure phases constrain asymmetry and are immune to
/// station-based phase errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ObservableKind {
    /// Squared visibility amplitude (VIS2DATA).
    Vis2,
    /// Visibility amplitude (VISAMP).
    VisAmp,
    /// Differential/absolute visibility phase in degrees (VISPHI).
    VisPhi,
    /// Closure phase in degrees (T3PHI).
    T3Phi,
    /// Triple-product amplitude (T3AMP).
    T3Amp,
    /// Spectral flux (FLUXDATA).
    Flux,
}

impl ObservableKind {
    /// Column-style label used in reports and exports.
    pub fn label(self) -> &'static str {
        match self {
            ObservableKind::Vis2 => "VIS2",
            ObservableKind::VisAmp => "VISAMP",
            ObservableKind::VisPhi => "VISPHI",
            ObservableKind::T3Phi => "T3PHI",
            ObservableKind::T3Amp => "T3AMP",
            ObservableKind::Flux => "FLUX",
        }
    }

    /// Whether residuals for this observable live on the circle (degrees).
    pub fn is_phase(self) -> bool {
        matches!(self, ObservableKind::VisPhi | ObservableKind::T3Phi)
    }

    /// Observables used in the chi-square by default: VIS2 + T3PHI.
    ///
    /// T3AMP is simulated but excluded by default since its calibration is
    /// commonly unreliable.
    pub fn default_set() -> Vec<ObservableKind> {
        vec![ObservableKind::Vis2, ObservableKind::T3Phi]
    }
}

/// Built-in component kinds for analytic Fourier-plane models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Unresolved point source.
    Point,
    /// Uniform-brightness disk of diameter `d`.
    UniformDisk,
    /// Circular Gaussian of FWHM `fwhm`.
    Gaussian,
    /// Elongated uniform disk (`d` = minor-axis diameter, `elong`, `pa`).
    EllipticalUniformDisk,
    /// Elongated Gaussian (`fwhm` = minor-axis FWHM, `elong`, `pa`).
    EllipticalGaussian,
    /// Uniform annulus between inner/outer diameters `din`/`dout`.
    Ring,
    /// Fully resolved background: contributes flux but no coherent signal.
    Background,
    /// Pixelated image-plane component evaluated by direct DFT.
    Image,
}

impl ComponentKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ComponentKind::Point => "point",
            ComponentKind::UniformDisk => "uniform disk",
            ComponentKind::Gaussian => "Gaussian",
            ComponentKind::EllipticalUniformDisk => "elliptical uniform disk",
            ComponentKind::EllipticalGaussian => "elliptical Gaussian",
            ComponentKind::Ring => "ring",
            ComponentKind::Background => "background",
            ComponentKind::Image => "image",
        }
    }
}

/// Summary statistics of a dataset (after filtering).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetStats {
    pub n_vis2: usize,
    pub n_vis: usize,
    pub n_t3: usize,
    pub n_flux: usize,
    /// Wavelength range covered, meters.
    pub wl_min: f64,
    pub wl_max: f64,
    /// MJD range covered.
    pub mjd_min: f64,
    pub mjd_max: f64,
    /// Projected baseline length range, meters (longest leg for triangles).
    pub baseline_min: f64,
    pub baseline_max: f64,
}

/// Per-observable chi-square contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chi2Entry {
    pub kind: ObservableKind,
    pub chi2: f64,
    /// Number of valid (unflagged, finite-error) points.
    pub n: usize,
}

/// Chi-square breakdown over the selected observables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chi2Breakdown {
    pub entries: Vec<Chi2Entry>,
    /// Free parameter count used for the reduced chi-square.
    pub n_free: usize,
}

impl Chi2Breakdown {
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.chi2).sum()
    }

    pub fn n_points(&self) -> usize {
        self.entries.iter().map(|e| e.n).sum()
    }

    /// Reduced chi-square; the denominator is floored at 1 so degenerate
    /// setups (more parameters than points) stay finite.
    pub fn reduced(&self) -> f64 {
        let dof = self.n_points().saturating_sub(self.n_free).max(1);
        self.total() / dof as f64
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// OIFITS files to load.
    pub data_paths: Vec<PathBuf>,
    /// Model JSON describing components and parameters.
    pub model_path: Option<PathBuf>,

    /// Observables participating in the chi-square.
    pub observables: Vec<ObservableKind>,

    /// Optional wavelength window, meters.
    pub wl_min: Option<f64>,
    pub wl_max: Option<f64>,
    /// Optional MJD window.
    pub mjd_min: Option<f64>,
    pub mjd_max: Option<f64>,
    /// Optional projected-baseline window, meters.
    pub baseline_min: Option<f64>,
    pub baseline_max: Option<f64>,
    /// Keep flagged points instead of dropping them.
    pub keep_flagged: bool,

    /// Ensemble sampler settings.
    pub walkers: usize,
    pub steps: usize,
    pub burn: usize,
    pub thin: usize,
    pub seed: u64,
    /// Stretch-move scale parameter (a=2 is the standard choice).
    pub stretch_a: f64,

    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_residuals: Option<PathBuf>,
    pub save_model: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            data_paths: Vec::new(),
            model_path: None,
            observables: ObservableKind::default_set(),
            wl_min: None,
            wl_max: None,
            mjd_min: None,
            mjd_max: None,
            baseline_min: None,
            baseline_max: None,
            keep_flagged: false,
            walkers: 0, // 0 means auto: max(2 * n_free, 16)
            steps: 1000,
            burn: 250,
            thin: 1,
            seed: 42,
            stretch_a: 2.0,
            top_n: 10,
            plot: false,
            plot_width: 78,
            plot_height: 18,
            export_residuals: None,
            save_model: None,
        }
    }
}

/// A per-point residual (used for rankings and exports).
#[derive(Debug, Clone)]
pub struct ObsResidual {
    pub kind: ObservableKind,
    /// Station pair/triangle label, when known.
    pub baseline: String,
    /// Spatial frequency of the point, cycles/rad (longest leg for triangles).
    pub spatial_freq: f64,
    /// Wavelength, meters.
    pub wl: f64,
    pub mjd: f64,
    pub observed: f64,
    pub model: f64,
    pub error: f64,
    /// observed - model; wrapped to (-180, 180] for phases.
    pub residual: f64,
}
