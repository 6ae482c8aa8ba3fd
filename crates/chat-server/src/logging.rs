use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Environment;

const LOCAL_FILTER: &str = "chat_server=debug,chat_api=debug,chat_db=info,tower_http=debug";
const DEV_FILTER: &str = "debug";
const PROD_FILTER: &str = "info";

/// `RUST_LOG` overrides the profile's default filter.
pub fn init(env: Environment) {
    let default = match env {
        Environment::Local => LOCAL_FILTER,
        Environment::Dev => DEV_FILTER,
        Environment::Prod => PROD_FILTER,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Environment::Local => registry.with(fmt::layer().with_target(false)).init(),
        Environment::Dev | Environment::Prod => registry
            .with(fmt::layer().json().with_target(true).with_ansi(false))
            .init(),
    }
}
