//! Model parameters.
//!
//! A [`Param`] is a named scalar with an uncertainty, bounds, a free/fixed
//! flag, and a unit. Parameters are evaluated at a (wavelength, MJD)
//! coordinate: a plain parameter is constant there, while a parameter with
//! an attached [`Interp`] varies along wavelength or time (keyframes,
//! Gaussian bumps, polynomials, power laws, periodic cosines).
//!
//! Free-value packing: during fitting a parameter contributes a flat slice
//! of values to the sampler vector (one for a plain parameter, the
//! amplitude-like values for an interpolated one; shape settings such as
//! keyframe positions or bump centers stay fixed). `free_values` /
//! `set_free_values` round-trip in a stable order.

pub mod interp;
pub mod standard;

pub use interp::{Dependence, Interp};
pub use standard::standard;

use serde::{Deserialize, Serialize};

/// Unit of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Dimensionless.
    #[default]
    None,
    /// Milliarcseconds.
    Mas,
    /// Degrees.
    Deg,
    /// Meters.
    Meter,
    /// Days.
    Day,
}

impl Unit {
    pub fn label(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Mas => "mas",
            Unit::Deg => "deg",
            Unit::Meter => "m",
            Unit::Day => "d",
        }
    }
}

/// A model parameter.
#[derive(Debug, Clone)]
pub struct Param {
    /// Short key within its component (e.g. "d", "fwhm", "pa").
    pub name: String,
    pub value: f64,
    /// 1-sigma uncertainty (filled in after fitting).
    pub error: f64,
    pub min: f64,
    pub max: f64,
    pub free: bool,
    pub unit: Unit,
    pub description: String,
    /// Optional wavelength/time dependence.
    pub interp: Option<Interp>,
}

impl Param {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            error: 0.0,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            free: true,
            unit: Unit::None,
            description: String::new(),
            interp: None,
        }
    }

    /// Evaluate the parameter at a (wavelength [m], MJD) coordinate.
    pub fn eval(&self, wl: f64, mjd: f64) -> f64 {
        match &self.interp {
            None => self.value,
            Some(i) => i.eval(wl, mjd),
        }
    }

    /// Number of values this parameter contributes to the free vector.
    pub fn n_free(&self) -> usize {
        if !self.free {
            return 0;
        }
        match &self.interp {
            None => 1,
            Some(i) => i.n_free(),
        }
    }

    /// Append this parameter's free values to `out` (stable order).
    pub fn push_free_values(&self, out: &mut Vec<f64>) {
        if !self.free {
            return;
        }
        match &self.interp {
            None => out.push(self.value),
            Some(i) => i.push_free_values(out),
        }
    }

    /// Consume values for this parameter from the head of `values`;
    /// returns how many were consumed.
    pub fn set_free_values(&mut self, values: &[f64]) -> usize {
        if !self.free {
            return 0;
        }
        match &mut self.interp {
            None => {
                self.value = values[0];
                1
            }
            Some(i) => i.set_free_values(values),
        }
    }

    /// (min, max) bounds applied to every free value of this parameter.
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    // Builder-style helpers used by component constructors.

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn fixed(mut self) -> Self {
        self.free = false;
        self
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} ± {} {} range=[{}, {}] {}",
            self.name,
            self.value,
            self.error,
            self.unit.label(),
            self.min,
            self.max,
            if self.free { "free" } else { "fixed" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_param_is_constant_in_wl_and_time() {
        let p = Param::new("d", 3.0);
        assert_eq!(p.eval(2.2e-6, 60000.0), 3.0);
        assert_eq!(p.eval(1.6e-6, 60500.0), 3.0);
    }

    #[test]
    fn free_values_round_trip() {
        let mut p = Param::new("fwhm", 5.0).with_range(0.0, 20.0);
        let mut v = Vec::new();
        p.push_free_values(&mut v);
        assert_eq!(v, vec![5.0]);

        let consumed = p.set_free_values(&[7.5]);
        assert_eq!(consumed, 1);
        assert_eq!(p.value, 7.5);
    }

    #[test]
    fn fixed_param_contributes_nothing() {
        let mut p = Param::new("x", 1.0).fixed();
        assert_eq!(p.n_free(), 0);
        let mut v = Vec::new();
        p.push_free_values(&mut v);
        assert!(v.is_empty());
        assert_eq!(p.set_free_values(&[9.0]), 0);
        assert_eq!(p.value, 1.0);
    }
}
