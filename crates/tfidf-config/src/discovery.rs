//! Locates the `.tfidf.toml` files that configure a run: one per ancestor of the
//! working directory, then the global file in the home directory.

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::parse::is_root_config;

/// The configuration filename.
pub const CONFIG_FILENAME: &str = ".tfidf.toml";

/// Lists the configuration files that apply to runs started in `cwd`.
///
/// The nearest file comes first and `~/.tfidf.toml`, if present, comes last. A file
/// setting `root = true` ends the search, and then the global file is skipped too.
pub fn discover_config_files(cwd: &Path) -> Vec<PathBuf> {
    let mut configs = Vec::new();
    for dir in cwd.ancestors() {
        let candidate = dir.join(CONFIG_FILENAME);
        if !candidate.is_file() {
            continue;
        }
        let stops_here = is_root_config(&candidate);
        configs.push(candidate);
        if stops_here {
            return configs;
        }
    }

    if let Some(global) = global_config_path().filter(|p| p.is_file())
        && !configs.contains(&global)
    {
        configs.push(global);
    }
    configs
}

/// Returns the path to the global configuration file (`~/.tfidf.toml`).
///
/// Returns `None` if the home directory cannot be determined.
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_FILENAME))
}

/// Whether `path` is `~/.tfidf.toml`.
pub fn is_global_config(path: &Path) -> bool {
    global_config_path().is_some_and(|global| path == global)
}
