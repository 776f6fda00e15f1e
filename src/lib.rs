//! `oifit` library crate.
//!
//! The binary (`oifit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future GUI/daemon, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod components;
pub mod data;
pub mod domain;
pub mod error;
pub mod filter;
pub mod fit;
pub mod io;
pub mod math;
pub mod model;
pub mod oifits;
pub mod params;
pub mod plot;
pub mod report;
pub mod simulate;
