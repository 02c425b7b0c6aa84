// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/planner.db";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 60;

/// Runtime settings, read from `PLANNER_*` environment variables (and a
/// `.env` file when present) on top of built-in defaults.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Period of the current-time indicator refresh.
    pub tick_interval_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env(Environment::with_prefix("PLANNER"))
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("tick_interval_secs", DEFAULT_TICK_INTERVAL_SECS)?
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
