//! Command-line interface for the `tfidf` pipeline.

use std::process::ExitCode;

use tfidf::cli::{
    CommandContext,
    args::{Commands, parse_cli},
    commands, logging,
};

fn main() -> ExitCode {
    let cli = match parse_cli() {
        Ok(cli) => cli,
        Err(code) => return code,
    };
    logging::init(cli.verbose);

    let ctx = if matches!(cli.command, Commands::Init(_)) {
        CommandContext::load_cwd_only()
    } else {
        CommandContext::load()
    };
    match ctx {
        Ok(ctx) => commands::run(cli.command, &ctx),
        Err(code) => code,
    }
}
