//! Implementation of `tfidf init`.

use std::{fs, path::PathBuf, process::ExitCode};

use tfidf_config::{CONFIG_FILENAME, config_template, global_config_path};

use crate::cli::{args::InitCommand, context::CommandContext};

/// Writes the commented settings template to `.tfidf.toml`.
pub fn run(ctx: &CommandContext, cmd: &InitCommand) -> ExitCode {
    let target = match init_target(ctx, cmd.global) {
        Ok(path) => path,
        Err(code) => return code,
    };

    if target.exists() && !cmd.force {
        eprintln!("error: configuration file already exists: {}", target.display());
        eprintln!("use --force to overwrite");
        return ExitCode::FAILURE;
    }

    match fs::write(&target, config_template()) {
        Ok(()) => {
            println!("Created {}", target.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write {}: {e}", target.display());
            ExitCode::FAILURE
        }
    }
}

/// Picks the file to create. Running from the home directory writes the global file.
fn init_target(ctx: &CommandContext, global: bool) -> Result<PathBuf, ExitCode> {
    let global_path = global_config_path();
    let in_home = global_path
        .as_deref()
        .and_then(|p| p.parent())
        .is_some_and(|home| home == ctx.cwd);

    if !global && !in_home {
        return Ok(ctx.cwd.join(CONFIG_FILENAME));
    }
    global_path.ok_or_else(|| {
        eprintln!("error: could not determine home directory");
        ExitCode::FAILURE
    })
}
