//! Subcommands and the library loading they share

pub mod list;
pub mod run;

use crate::LoadArgs;
use anyhow::{bail, Context, Result};
use clarity_config::{Config, ConfigLoader};

/// Load clarity.toml (explicit path, or found from the working directory)
pub fn load_config(args: &LoadArgs) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    let config = match &args.config {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => loader
            .load_from_directory(&std::env::current_dir()?)
            .context("failed to load clarity.toml")?,
    };
    Ok(config)
}

/// Register search paths, then load every configured and requested library.
///
/// Configured libraries load first. Returns the number of libraries loaded.
/// Loading libraries that register no suite at all is an error.
pub fn load_libraries(config: &Config, args: &LoadArgs) -> Result<usize> {
    // Each add prepends, so add lowest priority first
    for dir in config.search_paths().iter().rev() {
        clarity::add_library_search_path(dir);
    }
    for dir in args.search_paths.iter().rev() {
        clarity::add_library_search_path(dir);
    }

    let configured = config
        .libraries()
        .iter()
        .map(|p| p.to_string_lossy().into_owned());
    let requested = args.libraries.iter().cloned();

    let mut count = 0;
    for library in configured.chain(requested) {
        tracing::debug!(library = %library, "loading test library");
        clarity::load_tests(&library)?;
        count += 1;
    }

    if count > 0 && clarity::registry().is_empty() {
        bail!("{} test libraries loaded but none registered a suite", count);
    }
    Ok(count)
}

/// Release every loaded library once its suites are no longer needed
pub fn unload_libraries() {
    // Registered tests point into library code; drop them first
    clarity::registry().clear();

    if clarity::loaded_library_count() == 0 {
        return;
    }
    if let Err(e) = clarity::unload_tests() {
        tracing::warn!(error = %e, "failed to unload test libraries");
    }
}
