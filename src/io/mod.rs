//! File formats: model JSON and residual CSV export.

pub mod export;
pub mod model_file;
