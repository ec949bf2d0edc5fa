//! Configuration module

use std::env;

use crate::pipeline::PipelineParams;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,

    /// Seed for synthetic rows; unset means fresh entropy per run
    pub synthetic_seed: Option<u64>,

    /// Synthetic rows blended into each training set
    pub synthetic_rows: usize,

    /// Logistic regression iteration cap
    pub train_max_iter: usize,

    /// Trained pipelines kept in the cache
    pub cache_capacity: usize,

    /// Live sessions kept in memory
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            environment: "development".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            synthetic_seed: None,
            synthetic_rows: 1000,
            train_max_iter: 1000,
            cache_capacity: 32,
            max_sessions: 256,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),

            environment: environment(),

            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),

            synthetic_seed: parse_var("SYNTHETIC_SEED"),

            synthetic_rows: parse_var("SYNTHETIC_ROWS").unwrap_or(defaults.synthetic_rows),

            train_max_iter: parse_var("TRAIN_MAX_ITER").unwrap_or(defaults.train_max_iter),

            cache_capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.cache_capacity),

            max_sessions: parse_var("MAX_SESSIONS").unwrap_or(defaults.max_sessions),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Training params for an upload; a per-upload seed wins over the configured one
    pub fn pipeline_params(&self, seed: Option<u64>) -> PipelineParams {
        PipelineParams {
            synthetic_rows: self.synthetic_rows,
            max_iter: self.train_max_iter,
            seed: seed.or(self.synthetic_seed),
            ..Default::default()
        }
    }
}

/// Deployment environment, read on its own so logging can be set up first
pub fn environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring unparsable {}={:?}", name, raw);
                None
            }
        },
        Err(_) => None,
    }
}
