use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `directives` uses `EnvFilter` syntax.
pub fn init(directives: &str) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_new(directives)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| e as Box<dyn Error>)
}
