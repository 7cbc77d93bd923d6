//! Implementation of `tfidf run`.

use std::process::ExitCode;

use tfidf_config::RunOverrides;
use tfidf_pipeline::{LocalFs, Pipeline};
use tracing::{info, warn};

use crate::cli::{
    args::{RunCommand, TopNArg, resolve_positional},
    context::CommandContext,
    output::print_report,
};

/// Runs the pipeline and reports the outcome.
///
/// A failed stage exits with that stage's code; configuration problems exit with 1.
pub fn run(ctx: &CommandContext, cmd: &RunCommand) -> ExitCode {
    let Some(target) = resolve_positional(&cmd.args) else {
        eprintln!("error: expected <INPUT_DIR> <OUTPUT_BASE> [TOP_N]");
        return ExitCode::FAILURE;
    };
    if let TopNArg::Invalid(arg) = &target.top_n {
        warn!(
            argument = %arg,
            top_n = ctx.config.pipeline.top_n,
            "third argument is not an integer; using the configured top-N"
        );
    }

    let overrides = RunOverrides {
        top_n: target.top_n.value(),
        reduce_tasks: cmd.reduce_tasks,
        max_task_attempts: cmd.max_attempts,
        threads: cmd.threads,
    };
    let config = match ctx.run_config(target.input_dir, target.output_base, &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    for warning in config.validate() {
        warn!("{warning}");
    }
    info!(
        input = %config.input_dir.display(),
        output = %config.output_base.display(),
        top_n = config.top_n,
        "arguments resolved"
    );

    match Pipeline::new(&LocalFs, config).run() {
        Ok(report) => print_report(&report, cmd.json),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
