// Run configuration. Every value defaults to what a plain `lapse hunt` uses.

use crate::expiry::UnknownPolicy;
use lapse_scanner::crawler::{
    BROWSER_USER_AGENT, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FRONTIER, DEFAULT_MAX_PAGES,
    DEFAULT_REQUEST_DELAY, DEFAULT_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Expired-domain listing sites crawled when no seeds are given.
pub const DEFAULT_SEEDS: [&str; 5] = [
    "https://www.expireddomains.net/expired-domains/",
    "https://www.moonsy.com/expired_domains/",
    "https://www.justdropped.com/",
    "https://snapnames.com",
    "https://www.namejet.com/Pages/Auctions/ExpiredDomains.aspx",
];

pub const API_NINJAS_BASE: &str = "https://api.api-ninjas.com";
pub const WAYBACK_BASE: &str = "http://web.archive.org";
pub const OPENLINKPROFILER_BASE: &str = "https://openlinkprofiler.org";

pub const DEFAULT_API_KEY: &str = "YOUR_API_KEY_HERE";
pub const API_KEY_ENV: &str = "LAPSE_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least one seed URL is required")]
    NoSeeds,

    #[error("Invalid seed URL '{0}'")]
    InvalidSeed(String),

    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LookupStrategy {
    /// WHOIS over TCP port 43.
    #[default]
    Whois,
    /// Third-party WHOIS JSON API, needs an API key.
    Api,
}

impl LookupStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "whois" => Some(LookupStrategy::Whois),
            "api" => Some(LookupStrategy::Api),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStrategy::Whois => "whois",
            LookupStrategy::Api => "api",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HuntConfig {
    pub seeds: Vec<String>,
    pub max_depth: usize,
    pub max_frontier: usize,
    pub max_pages: usize,
    pub request_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
    pub strategy: LookupStrategy,
    pub api_key: String,
    pub api_base_url: String,
    pub unknown_policy: UnknownPolicy,
    pub enrich: bool,
    pub archive_base_url: String,
    pub backlink_base_url: String,
    pub output_dir: PathBuf,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            seeds: DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_frontier: DEFAULT_MAX_FRONTIER,
            max_pages: DEFAULT_MAX_PAGES,
            request_delay: DEFAULT_REQUEST_DELAY,
            timeout: DEFAULT_TIMEOUT,
            user_agent: BROWSER_USER_AGENT.to_string(),
            strategy: LookupStrategy::default(),
            api_key: DEFAULT_API_KEY.to_string(),
            api_base_url: API_NINJAS_BASE.to_string(),
            unknown_policy: UnknownPolicy::default(),
            enrich: false,
            archive_base_url: WAYBACK_BASE.to_string(),
            backlink_base_url: OPENLINKPROFILER_BASE.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl HuntConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seeds.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        if let Some(bad) = self.seeds.iter().find(|s| Url::parse(s).is_err()) {
            return Err(ConfigError::InvalidSeed(bad.clone()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroLimit("depth"));
        }
        if self.max_frontier == 0 {
            return Err(ConfigError::ZeroLimit("max frontier"));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::ZeroLimit("max pages"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroLimit("timeout"));
        }
        Ok(())
    }
}
