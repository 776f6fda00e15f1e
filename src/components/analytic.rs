//! Analytic Fourier-plane components.
//!
//! Each component has a closed-form normalized visibility:
//!
//! - point: `V = 1`
//! - uniform disk (diameter d): `V = 2 J1(π d ρ) / (π d ρ)`
//! - Gaussian (FWHM θ): `V = exp(-(π θ ρ)² / (4 ln 2))`
//! - ring (annulus din..dout): area-weighted difference of uniform disks,
//!   degenerating to `J0(π d ρ)` for an infinitesimally thin ring
//! - background: flux with no coherent signal (`V = 0` off zero spacing)
//!
//! Elliptical variants evaluate the circular profile at the elongated
//! radial frequency from [`elliptic_freq`]; their size parameters refer to
//! the minor axis.

use num_complex::Complex64;

use crate::components::{elliptic_freq, radial_freq, shift_phasor, Component};
use crate::domain::ComponentKind;
use crate::math::{bessel_j0, uniform_disk_vis, MAS_TO_RAD};
use crate::params::{standard, Param};

const PI: f64 = std::f64::consts::PI;
const FOUR_LN2: f64 = 4.0 * std::f64::consts::LN_2;

/// Unresolved point source.
#[derive(Debug, Clone)]
pub struct Point {
    pub x: Param,
    pub y: Param,
    pub f: Param,
}

impl Point {
    pub fn new() -> Self {
        Self {
            x: standard("x"),
            y: standard("y"),
            f: standard("f"),
        }
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Point {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Point
    }

    fn code(&self) -> &'static str {
        "pt"
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.x, &self.y, &self.f]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.x, &mut self.y, &mut self.f]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        shift_phasor(u, v, self.x.eval(wl, mjd), self.y.eval(wl, mjd))
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Uniform-brightness disk.
#[derive(Debug, Clone)]
pub struct UniformDisk {
    pub x: Param,
    pub y: Param,
    pub f: Param,
    pub d: Param,
}

impl UniformDisk {
    pub fn new() -> Self {
        Self {
            x: standard("x"),
            y: standard("y"),
            f: standard("f"),
            d: standard("d"),
        }
    }
}

impl Default for UniformDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for UniformDisk {
    fn kind(&self) -> ComponentKind {
        ComponentKind::UniformDisk
    }

    fn code(&self) -> &'static str {
        "ud"
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.x, &self.y, &self.f, &self.d]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.x, &mut self.y, &mut self.f, &mut self.d]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        let rho = radial_freq(u, v);
        let a = PI * self.d.eval(wl, mjd) * MAS_TO_RAD * rho;
        shift_phasor(u, v, self.x.eval(wl, mjd), self.y.eval(wl, mjd)) * uniform_disk_vis(a)
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Circular Gaussian.
#[derive(Debug, Clone)]
pub struct Gaussian {
    pub x: Param,
    pub y: Param,
    pub f: Param,
    pub fwhm: Param,
}

impl Gaussian {
    pub fn new() -> Self {
        Self {
            x: standard("x"),
            y: standard("y"),
            f: standard("f"),
            fwhm: standard("fwhm"),
        }
    }
}

impl Default for Gaussian {
    fn default() -> Self {
        Self::new()
    }
}

fn gaussian_vis(fwhm_mas: f64, rho: f64) -> f64 {
    let a = PI * fwhm_mas * MAS_TO_RAD * rho;
    (-a * a / FOUR_LN2).exp()
}

impl Component for Gaussian {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Gaussian
    }

    fn code(&self) -> &'static str {
        "g"
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.x, &self.y, &self.f, &self.fwhm]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.x, &mut self.y, &mut self.f, &mut self.fwhm]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        let rho = radial_freq(u, v);
        shift_phasor(u, v, self.x.eval(wl, mjd), self.y.eval(wl, mjd))
            * gaussian_vis(self.fwhm.eval(wl, mjd), rho)
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Elongated uniform disk. `d` is the minor-axis diameter.
#[derive(Debug, Clone)]
pub struct EllipticalUniformDisk {
    pub x: Param,
    pub y: Param,
    pub f: Param,
    pub d: Param,
    pub elong: Param,
    pub pa: Param,
}

impl EllipticalUniformDisk {
    pub fn new() -> Self {
        Self {
            x: standard("x"),
            y: standard("y"),
            f: standard("f"),
            d: standard("d"),
            elong: standard("elong"),
            pa: standard("pa"),
        }
    }
}

impl Default for EllipticalUniformDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for EllipticalUniformDisk {
    fn kind(&self) -> ComponentKind {
        ComponentKind::EllipticalUniformDisk
    }

    fn code(&self) -> &'static str {
        "eud"
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.x, &self.y, &self.f, &self.d, &self.elong, &self.pa]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![
            &mut self.x,
            &mut self.y,
            &mut self.f,
            &mut self.d,
            &mut self.elong,
            &mut self.pa,
        ]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        let rho = elliptic_freq(u, v, self.pa.eval(wl, mjd), self.elong.eval(wl, mjd));
        let a = PI * self.d.eval(wl, mjd) * MAS_TO_RAD * rho;
        shift_phasor(u, v, self.x.eval(wl, mjd), self.y.eval(wl, mjd)) * uniform_disk_vis(a)
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Elongated Gaussian. `fwhm` is the minor-axis FWHM.
#[derive(Debug, Clone)]
pub struct EllipticalGaussian {
    pub x: Param,
    pub y: Param,
    pub f: Param,
    pub fwhm: Param,
    pub elong: Param,
    pub pa: Param,
}

impl EllipticalGaussian {
    pub fn new() -> Self {
        Self {
            x: standard("x"),
            y: standard("y"),
            f: standard("f"),
            fwhm: standard("fwhm"),
            elong: standard("elong"),
            pa: standard("pa"),
        }
    }
}

impl Default for EllipticalGaussian {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for EllipticalGaussian {
    fn kind(&self) -> ComponentKind {
        ComponentKind::EllipticalGaussian
    }

    fn code(&self) -> &'static str {
        "eg"
    }

    fn params(&self) -> Vec<&Param> {
        vec![
            &self.x,
            &self.y,
            &self.f,
            &self.fwhm,
            &self.elong,
            &self.pa,
        ]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![
            &mut self.x,
            &mut self.y,
            &mut self.f,
            &mut self.fwhm,
            &mut self.elong,
            &mut self.pa,
        ]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        let rho = elliptic_freq(u, v, self.pa.eval(wl, mjd), self.elong.eval(wl, mjd));
        shift_phasor(u, v, self.x.eval(wl, mjd), self.y.eval(wl, mjd))
            * gaussian_vis(self.fwhm.eval(wl, mjd), rho)
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Uniform annulus between inner diameter `din` and outer diameter `dout`.
#[derive(Debug, Clone)]
pub struct Ring {
    pub x: Param,
    pub y: Param,
    pub f: Param,
    pub din: Param,
    pub dout: Param,
}

impl Ring {
    pub fn new() -> Self {
        Self {
            x: standard("x"),
            y: standard("y"),
            f: standard("f"),
            din: standard("din"),
            dout: standard("dout"),
        }
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Ring {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Ring
    }

    fn code(&self) -> &'static str {
        "ring"
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.x, &self.y, &self.f, &self.din, &self.dout]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![
            &mut self.x,
            &mut self.y,
            &mut self.f,
            &mut self.din,
            &mut self.dout,
        ]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64 {
        let rho = radial_freq(u, v);
        let din = self.din.eval(wl, mjd).max(0.0);
        let dout = self.dout.eval(wl, mjd).max(0.0);
        let phasor = shift_phasor(u, v, self.x.eval(wl, mjd), self.y.eval(wl, mjd));

        // An annulus is the area-weighted difference of two uniform disks.
        // When the annulus collapses the difference is singular, so fall
        // back to the thin-ring form J0(π d ρ).
        let amp = if (dout - din).abs() < 1e-9 * dout.max(1e-9) {
            bessel_j0(PI * din * MAS_TO_RAD * rho)
        } else {
            let a_in = din * din;
            let a_out = dout * dout;
            let v_in = uniform_disk_vis(PI * din * MAS_TO_RAD * rho);
            let v_out = uniform_disk_vis(PI * dout * MAS_TO_RAD * rho);
            (a_out * v_out - a_in * v_in) / (a_out - a_in)
        };

        phasor * amp
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}

/// Fully resolved background. It contributes flux but no coherent signal,
/// so adding it lowers every visibility of the model.
#[derive(Debug, Clone)]
pub struct Background {
    pub f: Param,
}

impl Background {
    pub fn new() -> Self {
        Self { f: standard("f") }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Background {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Background
    }

    fn code(&self) -> &'static str {
        "bg"
    }

    fn params(&self) -> Vec<&Param> {
        vec![&self.f]
    }

    fn params_mut(&mut self) -> Vec<&mut Param> {
        vec![&mut self.f]
    }

    fn flux(&self, wl: f64, mjd: f64) -> f64 {
        self.f.eval(wl, mjd)
    }

    fn vis(&self, u: f64, v: f64, _wl: f64, _mjd: f64) -> Complex64 {
        if u == 0.0 && v == 0.0 {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    }

    fn boxed_clone(&self) -> Box<dyn Component> {
        Box::new(self.clone())
    }
}
