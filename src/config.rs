use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AreasError, AreasResult};

/// Runtime settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub endpoint: String,
    pub host: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub max_concurrency: usize,
    pub script_max_len: usize,
}

impl Config {
    pub fn from_env() -> AreasResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup, so tests don't have to mutate
    /// the real environment.
    pub fn from_lookup<F>(lookup: F) -> AreasResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_concurrency: usize = Self::parsed(&lookup, "MAX_CONCURRENCY", 64)?;
        if max_concurrency == 0 {
            return Err(AreasError::InvalidEnv {
                name: "MAX_CONCURRENCY",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Config {
            username: Self::required(&lookup, "BGRID_USERNAME")?,
            password: Self::required(&lookup, "BGRID_PASSWORD")?,
            endpoint: Self::required(&lookup, "BGRID_ENDPOINT")?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: Self::parsed(&lookup, "PORT", 8000)?,
            cache_ttl: Duration::from_secs(Self::parsed(&lookup, "CACHE_TTL_SECS", 300)?),
            request_timeout: Duration::from_secs(Self::parsed(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                30,
            )?),
            max_concurrency,
            script_max_len: Self::parsed(&lookup, "SCRIPT_MAX_LEN", 16 * 1024)?,
        })
    }

    /// URL of the upstream "actual areas" resource.
    pub fn areas_url(&self) -> String {
        format!("{}/areas/actual", self.endpoint.trim_end_matches('/'))
    }

    fn required<F>(lookup: &F, name: &'static str) -> AreasResult<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AreasError::MissingEnv(name)),
        }
    }

    fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> AreasResult<T>
    where
        F: Fn(&str) -> Option<String>,
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match lookup(name) {
            None => Ok(default),
            Some(value) => value.trim().parse::<T>().map_err(|e| AreasError::InvalidEnv {
                name,
                value: value.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
