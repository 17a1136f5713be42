use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Parameters of a single crawl job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub base_urls: Vec<String>,
    pub workers: usize,
    pub tasks: usize,
    pub max_links_in_page: usize,
    pub max_depth: usize,
    #[serde(default)]
    pub only_same_domain: bool,
    /// Requests per second across the whole job. 0 disables pacing.
    #[serde(default)]
    pub rate: u32,
    /// Wall-clock limit for the whole job, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    90
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("base_urls must not be empty")]
    NoSeeds,
    #[error("workers must be greater than zero")]
    ZeroWorkers,
    #[error("tasks must be greater than zero")]
    ZeroTasks,
}

impl CrawlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_urls.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if self.tasks == 0 {
            return Err(ConfigError::ZeroTasks);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
