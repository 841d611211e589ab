//! Layered service settings
//!
//! Defaults declared by each service are overridden by process environment
//! variables. Variable names map to lower-case keys (`PORT` -> `port`,
//! `VENUE_SERVICE_URL` -> `venue_service_url`).

use config::{Config, ConfigError, Environment};
use serde::de::DeserializeOwned;

/// Build a typed settings struct from defaults plus the environment
pub fn load<T: DeserializeOwned>(defaults: &[(&str, &str)]) -> Result<T, ConfigError> {
    let mut builder = Config::builder();
    for (key, value) in defaults {
        builder = builder.set_default(*key, *value)?;
    }

    builder
        .add_source(Environment::default().try_parsing(true))
        .build()?
        .try_deserialize()
}
