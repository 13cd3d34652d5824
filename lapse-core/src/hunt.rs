use crate::config::{ConfigError, HuntConfig, LookupStrategy};
use crate::expiry::{ApiChecker, ExpiryChecker, LookupError, LookupOutcome, UnknownPolicy, WhoisChecker};
use crate::report::{EnrichedDomain, ExpiredDomain, ReportError, write_report};
use crate::seo::SeoScorer;
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use lapse_scanner::{CrawlOutcome, Crawler, PageCallback, PageResult, ScanError, TraversalContext};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Callback for human-readable progress messages
pub type HuntProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback receiving each domain's lookup outcome and final verdict
pub type VerdictCallback = Arc<dyn Fn(&str, &LookupOutcome, bool) + Send + Sync>;

/// Callback receiving each enriched record
pub type EnrichmentCallback = Arc<dyn Fn(&EnrichedDomain) + Send + Sync>;

#[derive(Error, Debug)]
pub enum HuntError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawler setup failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Lookup setup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Observers for a hunt. All optional.
#[derive(Default, Clone)]
pub struct HuntHooks {
    pub progress: Option<HuntProgressCallback>,
    pub page: Option<PageCallback>,
    pub verdict: Option<VerdictCallback>,
    pub enrichment: Option<EnrichmentCallback>,
    pub show_spinner: bool,
}

#[derive(Debug, Clone)]
pub struct HuntSummary {
    pub seeds_crawled: usize,
    pub seeds_failed: usize,
    pub pages_fetched: usize,
    pub candidates: usize,
    pub expired: Vec<String>,
    pub enriched: Vec<EnrichedDomain>,
    pub report_path: PathBuf,
}

/// Crawl every seed with one shared traversal context and merge the domains.
///
/// Seeds that cannot be crawled at all are reported and skipped.
pub async fn collect_candidates(
    crawler: &Crawler,
    seeds: &[String],
    ctx: &mut TraversalContext,
    progress: Option<&HuntProgressCallback>,
) -> (BTreeSet<String>, Vec<CrawlOutcome>) {
    let mut all_domains = BTreeSet::new();
    let mut outcomes = Vec::new();

    for (idx, seed) in seeds.iter().enumerate() {
        if let Some(callback) = progress {
            callback(format!("Crawling seed {}/{}: {}", idx + 1, seeds.len(), seed));
        }

        match crawler.crawl(seed, ctx).await {
            Ok(outcome) => {
                all_domains.extend(outcome.domains.iter().cloned());
                outcomes.push(outcome);
            }
            Err(e) => {
                warn!("Failed to crawl {}: {}", seed, e);
                if let Some(callback) = progress {
                    callback(format!("[!]  Failed to crawl {}: {}", seed, e));
                }
            }
        }
    }

    (all_domains, outcomes)
}

/// Look up each domain once, in order, and keep the ones counted as expired.
pub async fn find_expired<'a>(
    checker: &ExpiryChecker,
    domains: impl IntoIterator<Item = &'a String>,
    policy: UnknownPolicy,
    verdict: Option<&VerdictCallback>,
) -> Vec<String> {
    let mut expired = Vec::new();

    for domain in domains {
        let outcome = checker.lookup(domain).await;
        let is_expired = outcome.is_expired(policy);
        info!("{} -> {} (expired: {})", domain, outcome.label(), is_expired);

        if let Some(callback) = verdict {
            callback(domain.as_str(), &outcome, is_expired);
        }
        if is_expired {
            expired.push(domain.clone());
        }
    }

    expired
}

pub async fn enrich_domains(
    scorer: &SeoScorer,
    domains: &[String],
    enrichment: Option<&EnrichmentCallback>,
) -> Vec<EnrichedDomain> {
    let mut records = Vec::with_capacity(domains.len());

    for domain in domains {
        let record = scorer.score(domain).await;
        info!(
            "{} - Past Usage: {}, Brandability: {}, Backlinks: {}",
            record.domain, record.past_usage, record.brandability, record.backlinks
        );
        if let Some(callback) = enrichment {
            callback(&record);
        }
        records.push(record);
    }

    records
}

pub fn build_checker(config: &HuntConfig) -> Result<ExpiryChecker, HuntError> {
    Ok(match config.strategy {
        LookupStrategy::Whois => ExpiryChecker::Whois(WhoisChecker::new(config.timeout)),
        LookupStrategy::Api => ExpiryChecker::Api(ApiChecker::new(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.timeout,
        )?),
    })
}

/// Run a complete hunt: crawl, dedupe, check, optionally enrich, write report.
///
/// `date` names the report file.
pub async fn run_hunt(
    config: &HuntConfig,
    hooks: HuntHooks,
    date: NaiveDate,
) -> Result<HuntSummary, HuntError> {
    config.validate()?;

    let spinner = if hooks.show_spinner {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    // Output from callbacks has to go around the spinner line.
    let progress = hooks.progress.clone().map(|callback| {
        let pb = spinner.clone();
        Arc::new(move |msg: String| match pb {
            Some(ref pb) => pb.suspend(|| callback(msg)),
            None => callback(msg),
        }) as HuntProgressCallback
    });

    let mut crawler = Crawler::with_settings(config.timeout, &config.user_agent)?
        .with_max_depth(config.max_depth)
        .with_max_frontier(config.max_frontier)
        .with_request_delay(config.request_delay);

    if hooks.page.is_some() || spinner.is_some() {
        let pb = spinner.clone();
        let page_hook = hooks.page.clone();
        let fetched = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        crawler = crawler.with_page_callback(Arc::new(move |page: &PageResult| {
            let count = fetched.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1;
            match (&pb, &page_hook) {
                (Some(pb), Some(hook)) => {
                    pb.set_message(format!("Crawling... {} pages fetched", count));
                    pb.suspend(|| hook(page));
                }
                (Some(pb), None) => pb.set_message(format!("Crawling... {} pages fetched", count)),
                (None, Some(hook)) => hook(page),
                (None, None) => {}
            }
        }));
    }

    let mut ctx = TraversalContext::with_max_pages(config.max_pages);
    let (candidates, outcomes) =
        collect_candidates(&crawler, &config.seeds, &mut ctx, progress.as_ref()).await;

    if let Some(ref callback) = progress {
        callback(format!("Total raw domain entries found: {}", candidates.len()));
    }

    if let Some(ref pb) = spinner {
        pb.set_message(format!("Checking {} domains...", candidates.len()));
    }
    let checker = build_checker(config)?;
    let verdict = hooks.verdict.clone().map(|callback| {
        let pb = spinner.clone();
        Arc::new(move |domain: &str, outcome: &LookupOutcome, expired: bool| match pb {
            Some(ref pb) => pb.suspend(|| callback(domain, outcome, expired)),
            None => callback(domain, outcome, expired),
        }) as VerdictCallback
    });
    let expired = find_expired(&checker, &candidates, config.unknown_policy, verdict.as_ref()).await;

    let (enriched, report_path) = if config.enrich {
        if let Some(ref pb) = spinner {
            pb.set_message(format!("Scoring {} expired domains...", expired.len()));
        }
        let scorer = SeoScorer::new(
            config.timeout,
            &config.user_agent,
            config.archive_base_url.clone(),
            config.backlink_base_url.clone(),
        )?;
        let enrichment = hooks.enrichment.clone().map(|callback| {
            let pb = spinner.clone();
            Arc::new(move |record: &EnrichedDomain| match pb {
                Some(ref pb) => pb.suspend(|| callback(record)),
                None => callback(record),
            }) as EnrichmentCallback
        });
        let records = enrich_domains(&scorer, &expired, enrichment.as_ref()).await;
        let path = write_report(&config.output_dir, date, &records)?;
        (records, path)
    } else {
        let records: Vec<ExpiredDomain> = expired.iter().map(|d| ExpiredDomain::new(d.clone())).collect();
        let path = write_report(&config.output_dir, date, &records)?;
        (Vec::new(), path)
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    info!("Saved {} expired domains to {}", expired.len(), report_path.display());

    Ok(HuntSummary {
        seeds_crawled: outcomes.len(),
        seeds_failed: config.seeds.len() - outcomes.len(),
        pages_fetched: ctx.pages_fetched(),
        candidates: candidates.len(),
        expired,
        enriched,
        report_path,
    })
}
