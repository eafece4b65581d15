use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    AppResult,
    config::{ClientConfig, LogFormat},
};

pub fn init_tracing(config: &ClientConfig) -> AppResult<()> {
    let filter =
        EnvFilter::try_new(config.log_level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .try_init(),
        LogFormat::Compact => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init(),
    };

    result.map_err(|e| format!("tracing already initialised: {e}").into())
}
