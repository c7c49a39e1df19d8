use log::{debug, info, warn};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_USER: u64 = 1;
pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub seed_path: Option<PathBuf>,
    pub base_url: String,
    pub user_id: u64,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: try_load(&lookup, "AVIARY_PORT", DEFAULT_PORT),
            seed_path: var(&lookup, "AVIARY_SEED").map(PathBuf::from),
            base_url: var(&lookup, "AVIARY_URL").unwrap_or_else(|| DEFAULT_URL.to_string()),
            user_id: try_load(&lookup, "AVIARY_USER", DEFAULT_USER),
        }
    }
}

fn var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = lookup(key).filter(|value| !value.trim().is_empty());
    if value.is_none() {
        debug!("Environment variable {key} not found, using default");
    }
    value
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = var(lookup, key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}
