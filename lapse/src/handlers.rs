use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use lapse_core::config::{API_KEY_ENV, DEFAULT_API_KEY, DEFAULT_SEEDS};
use lapse_core::hunt::{build_checker, find_expired};
use lapse_core::{
    EnrichedDomain, HuntConfig, HuntHooks, HuntSummary, LookupOutcome, LookupStrategy,
    UnknownPolicy, run_hunt,
};
use lapse_scanner::PageResult;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// Helper functions for hunt handler

/// Load seeds from a file, the repeated --seed argument, or the built-in list
pub fn load_urls_from_source(
    seeds: Option<Vec<String>>,
    seeds_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(seeds_file_path) = seeds_file {
        load_urls_from_file(seeds_file_path)
    } else if let Some(seeds) = seeds {
        let urls: Vec<String> = seeds
            .iter()
            .filter_map(|line| parse_url_line(line.trim()))
            .collect();
        if urls.is_empty() {
            return Err("No valid seed URLs given".to_string());
        }
        Ok(urls)
    } else {
        Ok(DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &PathBuf) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read seeds file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| parse_url_line(line.trim()))
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // Try to parse as-is
    if let Ok(url) = Url::parse(line) {
        if url.has_host() {
            return Some(line.to_string());
        }
    }

    // Try adding http://
    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("⚠️  Skipping invalid URL '{}'", line);
    None
}

/// Domains from a newline-delimited file: trimmed, lower-cased, blanks and
/// `#` comments skipped.
pub fn load_domains_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read domains file {}: {}", path.display(), e))?;

    let domains: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_ascii_lowercase)
        .collect();

    if domains.is_empty() {
        return Err(format!("No domains found in {}", path.display()));
    }

    Ok(domains)
}

/// `--api-key`, then `$LAPSE_API_KEY`, then the placeholder.
pub fn resolve_api_key(arg: Option<&String>) -> String {
    arg.cloned()
        .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
        .unwrap_or_else(|| DEFAULT_API_KEY.to_string())
}

fn lookup_settings(args: &ArgMatches) -> (LookupStrategy, String, UnknownPolicy, Duration) {
    let strategy = args
        .get_one::<String>("strategy")
        .and_then(|s| LookupStrategy::from_str(s))
        .unwrap_or_default();
    let unknown_policy = args
        .get_one::<String>("unknown-as")
        .and_then(|s| UnknownPolicy::from_str(s))
        .unwrap_or_default();
    let timeout = Duration::from_secs(*args.get_one::<u64>("timeout").unwrap_or(&10));

    (
        strategy,
        resolve_api_key(args.get_one::<String>("api-key")),
        unknown_policy,
        timeout,
    )
}

/// Build the run configuration from `hunt` arguments
pub fn hunt_config_from_args(args: &ArgMatches) -> Result<HuntConfig, String> {
    let seeds = args
        .get_many::<String>("seed")
        .map(|values| values.cloned().collect());
    let seeds = load_urls_from_source(seeds, args.get_one::<PathBuf>("seeds-file"))?;
    let (strategy, api_key, unknown_policy, timeout) = lookup_settings(args);

    let output_dir = args
        .get_one::<String>("output-dir")
        .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
        .unwrap_or_else(|| PathBuf::from("."));

    let defaults = HuntConfig::default();
    Ok(HuntConfig {
        seeds,
        max_depth: *args.get_one::<usize>("depth").unwrap_or(&defaults.max_depth),
        max_frontier: *args
            .get_one::<usize>("max-frontier")
            .unwrap_or(&defaults.max_frontier),
        max_pages: *args
            .get_one::<usize>("max-pages")
            .unwrap_or(&defaults.max_pages),
        request_delay: args
            .get_one::<u64>("delay-ms")
            .map(|ms| Duration::from_millis(*ms))
            .unwrap_or(defaults.request_delay),
        timeout,
        strategy,
        api_key,
        unknown_policy,
        enrich: args.get_flag("enrich"),
        output_dir,
        ..defaults
    })
}

pub fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

pub fn print_banner() {
    print_divider();
    println!(
        "{}",
        format!("  LAPSE v{}", env!("CARGO_PKG_VERSION"))
            .bright_white()
            .bold()
    );
    println!("  {}", "expired domain hunter".bright_black());
    print_divider();
    println!();
}

fn print_page(page: &PageResult) {
    println!("{}", page_line(page));
}

/// One console line per fetch attempt, with its round and response time.
pub fn page_line(page: &PageResult) -> String {
    let timing = format!(
        "(round {}, {} ms)",
        page.round,
        page.response_time.as_millis()
    )
    .bright_black();

    if let Some(error) = &page.error {
        format!(
            "{} Error crawling {}: {} {}",
            "✗".red().bold(),
            page.url,
            error,
            timing
        )
    } else if page.is_success() {
        format!(
            "{} Crawled: {} - Domains Found: {}, Internal Links: {} {}",
            "→".blue(),
            page.url,
            page.domains_found.len().to_string().cyan(),
            page.links_found.len().to_string().cyan(),
            timing
        )
    } else {
        format!(
            "{} Crawled: {} - status {} {}",
            "⚠".yellow(),
            page.url,
            page.status_code.to_string().yellow(),
            timing
        )
    }
}

fn print_verdict(domain: &str, outcome: &LookupOutcome, expired: bool) {
    let detail = match outcome {
        LookupOutcome::Active { expires } => format!("expires {}", expires.format("%Y-%m-%d")),
        LookupOutcome::Expired {
            expires: Some(expires),
        } => format!("expired {}", expires.format("%Y-%m-%d")),
        LookupOutcome::Expired { expires: None } => "not registered".to_string(),
        LookupOutcome::Unknown { reason } => format!("unknown: {}", reason),
    };

    if expired {
        println!(
            "✅ {}: {} {}",
            "Expired".green().bold(),
            domain.bright_white(),
            format!("({})", detail).bright_black()
        );
    } else {
        println!(
            "❌ {}: {} {}",
            "Active".red(),
            domain,
            format!("({})", detail).bright_black()
        );
    }
}

fn print_enriched(record: &EnrichedDomain) {
    println!(
        "📊 {} - Past Usage: {}, Brandability: {}, Backlinks: {}",
        record.domain.bright_white(),
        if record.past_usage { "Yes" } else { "No" },
        record.brandability.to_string().cyan(),
        record.backlinks.to_string().cyan()
    );
}

fn print_summary(summary: &HuntSummary) {
    println!();
    print_divider();
    println!("{}", "  HUNT COMPLETE".green().bold());
    print_divider();
    println!(
        "  Seeds crawled:    {} ({} failed)",
        summary.seeds_crawled.to_string().cyan(),
        summary.seeds_failed
    );
    println!(
        "  Pages fetched:    {}",
        summary.pages_fetched.to_string().cyan()
    );
    println!(
        "  Candidates:       {}",
        summary.candidates.to_string().cyan()
    );
    println!(
        "  Expired:          {}",
        summary.expired.len().to_string().green().bold()
    );
    println!();
}

pub async fn handle_hunt(args: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let config = match hunt_config_from_args(args) {
        Ok(config) => config,
        Err(e) => bail!(e),
    };

    if !quiet {
        println!("🔎 Hunting across {} seed(s)", config.seeds.len());
        println!("Max depth: {}", config.max_depth);
        println!("Lookup: {}", config.strategy.as_str());
        println!(
            "Enrichment: {}\n",
            if config.enrich { "on" } else { "off" }
        );
    }

    let hooks = if quiet {
        HuntHooks::default()
    } else {
        HuntHooks {
            progress: Some(Arc::new(|msg: String| println!("{}", msg))),
            page: Some(Arc::new(print_page)),
            verdict: Some(Arc::new(print_verdict)),
            enrichment: Some(Arc::new(print_enriched)),
            show_spinner: true,
        }
    };

    let today = chrono::Local::now().date_naive();
    let summary = run_hunt(&config, hooks, today)
        .await
        .context("Hunt failed")?;

    if !quiet {
        print_summary(&summary);
    }
    println!(
        "{} Saved {} expired domains to {}",
        "✓".green().bold(),
        summary.expired.len(),
        summary.report_path.display().to_string().bright_white()
    );

    Ok(())
}

pub async fn handle_check(args: &ArgMatches) -> anyhow::Result<()> {
    let domains: Vec<String> = if let Some(path) = args.get_one::<PathBuf>("file") {
        match load_domains_from_file(path) {
            Ok(domains) => domains,
            Err(e) => bail!(e),
        }
    } else {
        args.get_many::<String>("DOMAIN")
            .map(|values| values.map(|d| d.trim().to_ascii_lowercase()).collect())
            .unwrap_or_default()
    };
    if domains.is_empty() {
        bail!("Either DOMAIN arguments or --file must be provided");
    }

    let (strategy, api_key, unknown_policy, timeout) = lookup_settings(args);
    let config = HuntConfig {
        strategy,
        api_key,
        unknown_policy,
        timeout,
        ..HuntConfig::default()
    };

    let checker = build_checker(&config).context("Failed to set up lookups")?;
    let unique: BTreeSet<String> = domains.into_iter().collect();
    println!(
        "Checking {} domain(s) via {}\n",
        unique.len(),
        checker.name()
    );

    let verdict: lapse_core::hunt::VerdictCallback = Arc::new(print_verdict);
    let expired = find_expired(&checker, &unique, unknown_policy, Some(&verdict)).await;

    println!();
    println!(
        "{} {} of {} expired",
        "✓".green().bold(),
        expired.len().to_string().green().bold(),
        unique.len()
    );

    Ok(())
}
