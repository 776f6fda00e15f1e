//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads OIFITS data and model files
//! - runs comparison / fitting / simulation
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Cli, Command, DemoArgs, FitArgs, SimArgs};
use crate::data::synthetic::{generate, to_oifits, SynthConfig};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::io::{export, model_file};
use crate::oifits::writer;

pub mod pipeline;

/// Entry point for the `oifit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Compare(args) => handle_compare(args),
        Command::Sim(args) => handle_sim(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let cfg = args.to_config();
    let (model, run, outcome) = pipeline::run_fit(&cfg)?;

    println!(
        "{}",
        crate::report::format::format_run_summary(&run.stats, &run.breakdown, &model)
    );
    println!("{}", crate::report::format::format_fit_summary(&outcome));
    println!("{}", crate::report::format::format_worst_table(&run.worst));

    finish_outputs(&cfg, &model, &run)
}

fn handle_compare(args: FitArgs) -> Result<(), AppError> {
    let cfg = args.to_config();
    let (model, run) = pipeline::run_compare(&cfg)?;

    println!(
        "{}",
        crate::report::format::format_run_summary(&run.stats, &run.breakdown, &model)
    );
    println!("{}", crate::report::format::format_worst_table(&run.worst));

    finish_outputs(&cfg, &model, &run)
}

fn handle_sim(args: SimArgs) -> Result<(), AppError> {
    let model = model_file::read_model_json(&args.model)?;
    let synth = SynthConfig {
        n_times: args.times,
        n_wl: args.channels,
        wl_min: args.wl_min,
        wl_max: args.wl_max,
        vis2_err: args.vis2_err,
        t3phi_err_deg: args.t3phi_err,
        seed: args.seed,
        ..SynthConfig::default()
    };
    let data = generate(&model, &synth)?;
    writer::save(&to_oifits(&data, &synth), &args.out)?;

    let stats = data.stats();
    println!(
        "Wrote {}: VIS2={} T3={} over [{:.3}, {:.3}] um",
        args.out.display(),
        stats.n_vis2,
        stats.n_t3,
        stats.wl_min * 1e6,
        stats.wl_max * 1e6
    );

    if args.plot {
        println!(
            "{}",
            crate::plot::render_vis2_plot(&data, &model, args.width, args.height)
        );
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let cfg = RunConfig {
        seed: args.seed,
        steps: args.steps,
        burn: args.burn,
        plot: !args.no_plot,
        ..RunConfig::default()
    };
    let (model, run, outcome) = pipeline::run_demo(&cfg)?;

    println!(
        "{}",
        crate::report::format::format_run_summary(&run.stats, &run.breakdown, &model)
    );
    println!("{}", crate::report::format::format_fit_summary(&outcome));
    println!("{}", crate::report::format::format_worst_table(&run.worst));

    if cfg.plot {
        println!(
            "{}",
            crate::plot::render_vis2_plot(&run.data, &model, cfg.plot_width, cfg.plot_height)
        );
    }
    Ok(())
}

/// Plot and exports shared by `fit` and `compare`.
fn finish_outputs(
    cfg: &RunConfig,
    model: &crate::model::Model,
    run: &pipeline::ComparisonRun,
) -> Result<(), AppError> {
    if cfg.plot {
        println!(
            "{}",
            crate::plot::render_vis2_plot(&run.data, model, cfg.plot_width, cfg.plot_height)
        );
    }
    if let Some(path) = &cfg.export_residuals {
        export::write_residuals_csv(path, &run.residuals)?;
    }
    if let Some(path) = &cfg.save_model {
        model_file::write_model_json(path, model, Some(run.breakdown.reduced()))?;
    }
    Ok(())
}
