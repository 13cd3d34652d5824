use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// One fetch attempt made by the crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub round: usize,
    pub status_code: u16,
    pub response_time: Duration,
    pub domains_found: BTreeSet<String>,
    pub links_found: BTreeSet<String>,
    pub error: Option<String>,
}

impl PageResult {
    pub fn new(url: String, round: usize) -> Self {
        Self {
            url,
            round,
            status_code: 0,
            response_time: Duration::from_secs(0),
            domains_found: BTreeSet::new(),
            links_found: BTreeSet::new(),
            error: None,
        }
    }

    pub fn with_error(url: String, round: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, round)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200 && self.error.is_none()
    }
}

/// Everything a single seed crawl produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlOutcome {
    pub seed: String,
    pub domains: BTreeSet<String>,
    pub pages: Vec<PageResult>,
    pub rounds_completed: usize,
    pub budget_exhausted: bool,
}

impl CrawlOutcome {
    pub fn new(seed: String) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages.len()
    }
}
