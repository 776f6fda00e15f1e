//! Mathematical utilities: Bessel functions, angle conversions, and
//! order statistics.

pub mod angles;
pub mod bessel;
pub mod stats;

pub use angles::*;
pub use bessel::*;
pub use stats::*;
