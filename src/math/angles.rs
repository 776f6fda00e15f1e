//! Angle and unit conversions.
//!
//! Conventions used throughout the crate:
//!
//! - angular sizes and positions on sky: milliarcseconds (mas)
//! - position angles: degrees, East of North
//! - baselines (u, v): meters
//! - wavelengths: meters
//! - spatial frequencies: cycles/radian (baseline / wavelength)

/// Milliarcseconds to radians.
pub const MAS_TO_RAD: f64 = std::f64::consts::PI / 180.0 / 3600.0 / 1000.0;

/// Degrees to radians.
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Radians to degrees.
pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / std::f64::consts::PI
}

/// Wrap a phase in degrees to the interval (-180, 180].
pub fn wrap_phase_deg(value: f64) -> f64 {
    let mut wrapped = (value + 180.0) % 360.0;
    if wrapped <= 0.0 {
        wrapped += 360.0;
    }
    wrapped - 180.0
}

/// Modified Julian Date to calendar date (UTC), for report headers.
pub fn mjd_to_date(mjd: f64) -> Option<chrono::NaiveDate> {
    // MJD 0 is 1858-11-17.
    let epoch = chrono::NaiveDate::from_ymd_opt(1858, 11, 17)?;
    if !mjd.is_finite() {
        return None;
    }
    epoch.checked_add_signed(chrono::Duration::days(mjd.floor() as i64))
}
