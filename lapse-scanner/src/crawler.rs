use crate::error::{Result, ScanError};
use crate::extract::{extract_domains, extract_internal_links, normalize_url};
use crate::result::{CrawlOutcome, PageResult};
use reqwest::{Client, StatusCode};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub type PageCallback = Arc<dyn Fn(&PageResult) + Send + Sync>;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DEPTH: usize = 2;
pub const DEFAULT_MAX_FRONTIER: usize = 500;
pub const DEFAULT_MAX_PAGES: usize = 5000;

/// Visited URLs and fetch budget for one run.
///
/// Reusing a context across seeds means a page reachable from two seeds is
/// fetched once, by whichever crawl gets there first. Use a fresh context per
/// seed to crawl them independently.
#[derive(Debug, Clone)]
pub struct TraversalContext {
    visited: HashSet<String>,
    max_pages: usize,
}

impl TraversalContext {
    pub fn new() -> Self {
        Self::with_max_pages(DEFAULT_MAX_PAGES)
    }

    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            visited: HashSet::new(),
            max_pages,
        }
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Returns false when the URL was already present.
    pub fn mark_visited(&mut self, url: String) -> bool {
        self.visited.insert(url)
    }

    /// Every visited URL costs one fetch attempt.
    pub fn pages_fetched(&self) -> usize {
        self.visited.len()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.visited.len() >= self.max_pages
    }
}

impl Default for TraversalContext {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Crawler {
    client: Client,
    max_depth: usize,
    max_frontier: usize,
    request_delay: Duration,
    page_callback: Option<PageCallback>,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Self::with_settings(DEFAULT_TIMEOUT, BROWSER_USER_AGENT)
    }

    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            max_depth: DEFAULT_MAX_DEPTH,
            max_frontier: DEFAULT_MAX_FRONTIER,
            request_delay: DEFAULT_REQUEST_DELAY,
            page_callback: None,
        })
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_frontier(mut self, max_frontier: usize) -> Self {
        self.max_frontier = max_frontier;
        self
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_page_callback(mut self, callback: PageCallback) -> Self {
        self.page_callback = Some(callback);
        self
    }

    /// Breadth-first crawl of `seed` for at most `max_depth` rounds.
    ///
    /// Round 0 fetches the seed, round `n` fetches links found in round `n-1`.
    /// Links discovered in the last round are never followed. Page failures
    /// are recorded on the outcome and never abort the crawl.
    pub async fn crawl(&self, seed: &str, ctx: &mut TraversalContext) -> Result<CrawlOutcome> {
        let seed_url = normalize_url(seed)
            .ok_or_else(|| ScanError::InvalidUrl(format!("Invalid seed URL: {}", seed)))?;

        info!("Starting crawl of {} (depth {})", seed_url, self.max_depth);

        let mut outcome = CrawlOutcome::new(seed_url.clone());
        let mut frontier = BTreeSet::from([seed_url]);

        'rounds: for round in 0..self.max_depth {
            let mut next_round = BTreeSet::new();

            for url in &frontier {
                if ctx.is_visited(url) {
                    debug!("Skipping already visited {}", url);
                    continue;
                }
                if ctx.budget_exhausted() {
                    warn!(
                        "Page budget exhausted after {} fetches, stopping crawl of {}",
                        ctx.pages_fetched(),
                        outcome.seed
                    );
                    outcome.budget_exhausted = true;
                    break 'rounds;
                }
                ctx.mark_visited(url.clone());

                let page = match self.fetch_page(url, round).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!("Error crawling {}: {}", url, e);
                        PageResult::with_error(url.clone(), round, e.to_string())
                    }
                };

                if page.is_success() {
                    info!(
                        "Crawled: {} - Domains Found: {}, Internal Links: {}",
                        url,
                        page.domains_found.len(),
                        page.links_found.len()
                    );
                    outcome.domains.extend(page.domains_found.iter().cloned());
                    next_round.extend(page.links_found.iter().cloned());
                }

                if let Some(ref callback) = self.page_callback {
                    callback(&page);
                }
                outcome.pages.push(page);

                if !self.request_delay.is_zero() {
                    tokio::time::sleep(self.request_delay).await;
                }
            }

            outcome.rounds_completed = round + 1;

            frontier = next_round
                .into_iter()
                .filter(|url| !ctx.is_visited(url))
                .take(self.max_frontier)
                .collect();
            if frontier.is_empty() {
                debug!("Frontier exhausted after round {}", round);
                break;
            }
        }

        info!(
            "Crawl of {} complete. {} pages, {} domains",
            outcome.seed,
            outcome.pages_fetched(),
            outcome.domains.len()
        );
        Ok(outcome)
    }

    async fn fetch_page(&self, url: &str, round: usize) -> Result<PageResult> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url).send().await?;

        let mut page = PageResult::new(url.to_string(), round);
        page.status_code = response.status().as_u16();

        if response.status() != StatusCode::OK {
            page.response_time = start.elapsed();
            debug!("{} returned {}, nothing extracted", url, page.status_code);
            return Ok(page);
        }

        let body = response.text().await?;
        page.response_time = start.elapsed();
        page.domains_found = extract_domains(&body);
        page.links_found = extract_internal_links(&body, url);

        Ok(page)
    }
}
