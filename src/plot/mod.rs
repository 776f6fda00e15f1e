//! Terminal plotting.

pub mod ascii;

pub use ascii::render_vis2_plot;
