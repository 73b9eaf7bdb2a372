use std::{env, path::PathBuf};

use anyhow::{Result, anyhow};

const DEFAULT_CONFIG_FILE: &str = "lifeline.jsonc";
const USAGE: &str = "usage: lifeline [--config <path>]";

pub fn config_path_from_args() -> Result<PathBuf> {
    config_path_from(env::args().skip(1))
}

/// Resolves the config path from `--config <path>`, falling back to `./lifeline.jsonc`.
pub fn config_path_from(args: impl IntoIterator<Item = String>) -> Result<PathBuf> {
    let mut args = args.into_iter();
    let mut config = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config expects a path. {USAGE}"))?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err(anyhow!("--config given more than once. {USAGE}"));
                }
            }
            other => return Err(anyhow!("unexpected argument '{other}'. {USAGE}")),
        }
    }

    match config {
        Some(path) => Ok(path),
        None => Ok(env::current_dir()?.join(DEFAULT_CONFIG_FILE)),
    }
}
