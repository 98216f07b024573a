use anyhow::Result;
use byoserve_core::ServerConfig;

use super::paths::PathArgs;

/// Print the configuration `serve` would run with.
pub fn execute(paths: PathArgs) -> Result<()> {
    let config = ServerConfig::from_env()?;
    let paths = paths.resolve(config.paths.clone());
    let config = config.with_paths(paths);

    print!("{}", config.to_toml()?);
    Ok(())
}
