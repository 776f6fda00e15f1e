//! Standard parameter definitions shared by components.
//!
//! Components build their parameters from this table so that names, units,
//! bounds, and free/fixed defaults stay consistent across the model zoo.

use crate::params::{Param, Unit};

/// Build a standard parameter by key. Panics on unknown keys; the set of
/// keys is closed and exercised by tests.
pub fn standard(key: &str) -> Param {
    match key {
        "x" => Param::new("x", 0.0)
            .with_unit(Unit::Mas)
            .with_description("x position (East)")
            .fixed(),
        "y" => Param::new("y", 0.0)
            .with_unit(Unit::Mas)
            .with_description("y position (North)")
            .fixed(),
        "f" => Param::new("f", 1.0)
            .with_range(0.0, 1.0)
            .with_description("flux fraction"),
        "fwhm" => Param::new("fwhm", 0.0)
            .with_range(0.0, f64::INFINITY)
            .with_unit(Unit::Mas)
            .with_description("FWHM"),
        "d" => Param::new("d", 0.0)
            .with_range(0.0, f64::INFINITY)
            .with_unit(Unit::Mas)
            .with_description("diameter"),
        "din" => Param::new("din", 0.0)
            .with_range(0.0, f64::INFINITY)
            .with_unit(Unit::Mas)
            .with_description("inner diameter"),
        "dout" => Param::new("dout", 0.0)
            .with_range(0.0, f64::INFINITY)
            .with_unit(Unit::Mas)
            .with_description("outer diameter"),
        "elong" => Param::new("elong", 1.0)
            .with_range(1.0, f64::INFINITY)
            .with_description("elongation ratio (major/minor)"),
        "pa" => Param::new("pa", 0.0)
            .with_range(-180.0, 180.0)
            .with_unit(Unit::Deg)
            .with_description("major-axis position angle"),
        "pixsize" => Param::new("pixsize", 0.1)
            .with_range(0.0, f64::INFINITY)
            .with_unit(Unit::Mas)
            .with_description("pixel size")
            .fixed(),
        "dim" => Param::new("dim", 128.0)
            .with_range(1.0, f64::INFINITY)
            .with_description("grid dimension in pixels")
            .fixed(),
        "wl" => Param::new("wl", 0.0)
            .with_range(0.0, f64::INFINITY)
            .with_unit(Unit::Meter)
            .with_description("wavelength"),
        "mjd" => Param::new("mjd", 0.0)
            .with_unit(Unit::Day)
            .with_description("MJD"),
        "scale" => Param::new("scale", 1.0).with_description("scaling factor"),
        "index" => Param::new("index", 1.0).with_description("power-law index"),
        other => panic!("unknown standard parameter key: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_default_fixed_fluxes_default_free() {
        assert!(!standard("x").free);
        assert!(!standard("y").free);
        let f = standard("f");
        assert!(f.free);
        assert_eq!(f.min, 0.0);
        assert_eq!(f.max, 1.0);
    }

    #[test]
    fn sizes_are_non_negative_mas() {
        for key in ["fwhm", "d", "din", "dout"] {
            let p = standard(key);
            assert_eq!(p.min, 0.0, "{key}");
            assert_eq!(p.unit, Unit::Mas, "{key}");
        }
    }

    #[test]
    fn elongation_starts_at_unity() {
        let p = standard("elong");
        assert_eq!(p.value, 1.0);
        assert_eq!(p.min, 1.0);
    }
}
