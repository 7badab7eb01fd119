use dnspulse_domain::{CliOverrides, Config};

/// Loads and validates the configuration before logging exists, so failures
/// go straight to stderr.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    match Config::load(path, overrides) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            Err(anyhow::anyhow!(e))
        }
    }
}
