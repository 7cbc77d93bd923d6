//! Implementation of `tfidf config`.

use std::process::ExitCode;

use crate::cli::context::CommandContext;

/// Shows effective configuration settings.
pub fn run(ctx: &CommandContext) -> ExitCode {
    if let Some(root) = &ctx.config.config_root {
        println!("# configuration root: {}", root.display());
    }
    match ctx.config.settings_to_toml() {
        Ok(toml) => {
            print!("{toml}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to render configuration: {e}");
            ExitCode::FAILURE
        }
    }
}
