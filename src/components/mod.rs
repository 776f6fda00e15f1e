//! Model components and their Fourier-domain evaluation.
//!
//! A component exposes:
//!
//! - a normalized complex visibility at a spatial-frequency coordinate
//!   (|V| = 1 at zero baseline for flux-carrying components)
//! - a flux at a (wavelength, MJD) coordinate
//! - its parameters, in a stable order (the free-vector order)
//!
//! Analytic components live in `analytic`, the pixelated image-plane
//! component in `image`. Coordinates follow interferometric conventions:
//! u, v in cycles/radian (baseline over wavelength), positions and sizes
//! in milliarcseconds, position angles in degrees East of North.

pub mod analytic;
pub mod image;

pub use analytic::{
    Background, EllipticalGaussian, EllipticalUniformDisk, Gaussian, Point, Ring, UniformDisk,
};
pub use image::ImageComponent;

use num_complex::Complex64;

use crate::domain::ComponentKind;
use crate::math::MAS_TO_RAD;
use crate::params::Param;

/// A source model component.
pub trait Component: Send + Sync {
    fn kind(&self) -> ComponentKind;

    /// Short code used in free-parameter labels (e.g. "ud", "eg").
    fn code(&self) -> &'static str;

    /// Parameters in free-vector order.
    fn params(&self) -> Vec<&Param>;
    fn params_mut(&mut self) -> Vec<&mut Param>;

    /// Flux at (wavelength [m], MJD). For most components this is the `f`
    /// parameter, which may carry a wavelength/time interpolator.
    fn flux(&self, wl: f64, mjd: f64) -> f64;

    /// Normalized complex visibility at (u, v) cycles/rad, including the
    /// phase from the component's (x, y) position.
    fn vis(&self, u: f64, v: f64, wl: f64, mjd: f64) -> Complex64;

    /// Pixel grid of an image-plane component, `(dim, row-major pixels)`.
    /// Analytic components have none.
    fn image_grid(&self) -> Option<(usize, &[f64])> {
        None
    }

    fn boxed_clone(&self) -> Box<dyn Component>;
}

impl Clone for Box<dyn Component> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Construct a component of the given kind with standard parameters.
pub fn build(kind: ComponentKind) -> Box<dyn Component> {
    match kind {
        ComponentKind::Point => Box::new(Point::new()),
        ComponentKind::UniformDisk => Box::new(UniformDisk::new()),
        ComponentKind::Gaussian => Box::new(Gaussian::new()),
        ComponentKind::EllipticalUniformDisk => Box::new(EllipticalUniformDisk::new()),
        ComponentKind::EllipticalGaussian => Box::new(EllipticalGaussian::new()),
        ComponentKind::Ring => Box::new(Ring::new()),
        ComponentKind::Background => Box::new(Background::new()),
        ComponentKind::Image => Box::new(ImageComponent::new()),
    }
}

/// Phase factor from shifting a component by (x, y) mas on sky:
/// `exp(-2πi (u x + v y))` with x, y converted to radians.
pub fn shift_phasor(u: f64, v: f64, x_mas: f64, y_mas: f64) -> Complex64 {
    if x_mas == 0.0 && y_mas == 0.0 {
        return Complex64::new(1.0, 0.0);
    }
    let phase = -std::f64::consts::TAU * (u * x_mas * MAS_TO_RAD + v * y_mas * MAS_TO_RAD);
    Complex64::cis(phase)
}

/// Radial spatial frequency, cycles/rad.
pub fn radial_freq(u: f64, v: f64) -> f64 {
    (u * u + v * v).sqrt()
}

/// Effective radial frequency for a component elongated by `elong` along a
/// major axis at position angle `pa_deg` (East of North).
///
/// Size parameters of elliptical components refer to the minor axis; the
/// major axis is `elong` times larger, so the frequency component along the
/// major axis is stretched by `elong` before computing the radius.
pub fn elliptic_freq(u: f64, v: f64, pa_deg: f64, elong: f64) -> f64 {
    let pa = crate::math::deg_to_rad(pa_deg);
    let (sin_pa, cos_pa) = pa.sin_cos();
    // Major-axis direction on sky is (sin pa, cos pa) in (East, North).
    let u_major = u * sin_pa + v * cos_pa;
    let u_minor = u * cos_pa - v * sin_pa;
    ((elong * u_major) * (elong * u_major) + u_minor * u_minor).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_phasor_is_identity_at_origin() {
        let p = shift_phasor(1e7, -3e7, 0.0, 0.0);
        assert_eq!(p, Complex64::new(1.0, 0.0));
    }

    #[test]
    fn shift_phasor_has_unit_magnitude() {
        let p = shift_phasor(5e7, 2e7, 1.5, -3.0);
        assert!((p.norm() - 1.0).abs() < 1e-12);
        assert!(p.im != 0.0);
    }

    #[test]
    fn elliptic_freq_reduces_to_radial_for_unit_elongation() {
        let r = elliptic_freq(3e7, 4e7, 30.0, 1.0);
        assert!((r - radial_freq(3e7, 4e7)).abs() < 1e-3);
    }

    #[test]
    fn elliptic_freq_stretches_along_major_axis() {
        // Major axis due North (pa = 0): v is stretched, u is not.
        let along = elliptic_freq(0.0, 1e7, 0.0, 2.0);
        let across = elliptic_freq(1e7, 0.0, 0.0, 2.0);
        assert!((along - 2e7).abs() < 1.0);
        assert!((across - 1e7).abs() < 1.0);
    }
}
