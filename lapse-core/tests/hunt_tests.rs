// End-to-end hunts against a mock web: seeds, lookup API, archive and backlink checker

use chrono::NaiveDate;
use lapse_core::config::{HuntConfig, LookupStrategy};
use lapse_core::expiry::UnknownPolicy;
use lapse_core::hunt::{HuntHooks, build_checker, run_hunt};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex, query_param},
};

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .expect(hits)
        .mount(server)
        .await;
}

async fn mount_lookup(server: &MockServer, domain: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/v1/whois"))
        .and(query_param("domain", domain))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

/// Two seeds sharing a page, four candidate domains with mixed lookup results.
async fn mock_web() -> MockServer {
    let server = MockServer::start().await;

    mount_page(&server, "/s1", r#"lapsed.com held.com <a href="/shared">more</a>"#, 1).await;
    mount_page(&server, "/s2", r#"gofit.ai <a href="/shared">more</a>"#, 1).await;
    mount_page(&server, "/shared", "nodata.io", 1).await;

    mount_lookup(
        &server,
        "lapsed.com",
        ResponseTemplate::new(200).set_body_json(json!({"expires": "2001-04-05T06:07:08"})),
    )
    .await;
    mount_lookup(
        &server,
        "held.com",
        ResponseTemplate::new(200).set_body_json(json!({"expires": "2999-04-05T06:07:08"})),
    )
    .await;
    mount_lookup(&server, "gofit.ai", ResponseTemplate::new(500)).await;
    mount_lookup(
        &server,
        "nodata.io",
        ResponseTemplate::new(200).set_body_json(json!({"domain_name": "nodata.io"})),
    )
    .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/web/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("No results found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/gofit.ai"))
        .respond_with(html_page(r#"<span class="counter">42 backlinks</span>"#))
        .mount(&server)
        .await;

    server
}

fn config_for(server: &MockServer, output_dir: &TempDir) -> HuntConfig {
    HuntConfig {
        seeds: vec![
            format!("{}/s1", server.uri()),
            format!("{}/s2", server.uri()),
        ],
        max_depth: 2,
        request_delay: Duration::ZERO,
        timeout: Duration::from_secs(2),
        strategy: LookupStrategy::Api,
        api_key: "test-key".to_string(),
        api_base_url: server.uri(),
        archive_base_url: server.uri(),
        backlink_base_url: server.uri(),
        output_dir: output_dir.path().to_path_buf(),
        ..Default::default()
    }
}

fn report_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[tokio::test]
async fn test_hunt_writes_expired_domains() {
    let server = mock_web().await;
    let output_dir = TempDir::new().unwrap();
    let config = config_for(&server, &output_dir);

    let summary = run_hunt(&config, HuntHooks::default(), report_date())
        .await
        .unwrap();

    assert_eq!(summary.seeds_crawled, 2);
    assert_eq!(summary.seeds_failed, 0);
    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.candidates, 4);
    assert_eq!(summary.expired, vec!["gofit.ai", "lapsed.com", "nodata.io"]);
    assert!(summary.enriched.is_empty());

    assert_eq!(
        summary.report_path,
        output_dir.path().join("expired_domains_2024-01-02.csv")
    );
    let contents = std::fs::read_to_string(&summary.report_path).unwrap();
    assert_eq!(contents, "Domain\ngofit.ai\nlapsed.com\nnodata.io\n");
}

#[tokio::test]
async fn test_hunt_with_enrichment() {
    let server = mock_web().await;
    let output_dir = TempDir::new().unwrap();
    let config = HuntConfig {
        enrich: true,
        ..config_for(&server, &output_dir)
    };

    let summary = run_hunt(&config, HuntHooks::default(), report_date())
        .await
        .unwrap();

    assert_eq!(summary.enriched.len(), 3);
    assert_eq!(
        summary.report_path,
        output_dir.path().join("expired_domains_enriched_2024-01-02.csv")
    );
    let contents = std::fs::read_to_string(&summary.report_path).unwrap();
    assert_eq!(
        contents,
        "Domain,PastUsage,BrandabilityScore,Backlinks\n\
         gofit.ai,No,3,42\n\
         lapsed.com,No,2,0\n\
         nodata.io,No,3,0\n"
    );
}

#[tokio::test]
async fn test_hunt_assume_active_drops_unknowns() {
    let server = mock_web().await;
    let output_dir = TempDir::new().unwrap();
    let config = HuntConfig {
        unknown_policy: UnknownPolicy::AssumeActive,
        ..config_for(&server, &output_dir)
    };

    let summary = run_hunt(&config, HuntHooks::default(), report_date())
        .await
        .unwrap();

    assert_eq!(summary.expired, vec!["lapsed.com"]);
}

#[tokio::test]
async fn test_hunt_hooks_see_pages_and_verdicts() {
    let server = mock_web().await;
    let output_dir = TempDir::new().unwrap();
    let config = config_for(&server, &output_dir);

    let pages = Arc::new(Mutex::new(Vec::new()));
    let verdicts = Arc::new(Mutex::new(Vec::new()));
    let messages = Arc::new(Mutex::new(Vec::new()));

    let pages_clone = pages.clone();
    let verdicts_clone = verdicts.clone();
    let messages_clone = messages.clone();
    let hooks = HuntHooks {
        progress: Some(Arc::new(move |msg: String| {
            messages_clone.lock().unwrap().push(msg);
        })),
        page: Some(Arc::new(move |page: &lapse_scanner::PageResult| {
            pages_clone.lock().unwrap().push(page.url.clone());
        })),
        verdict: Some(Arc::new(
            move |domain: &str, outcome: &lapse_core::LookupOutcome, expired: bool| {
                verdicts_clone
                    .lock()
                    .unwrap()
                    .push((domain.to_string(), outcome.label(), expired));
            },
        )),
        ..Default::default()
    };

    run_hunt(&config, hooks, report_date()).await.unwrap();

    assert_eq!(pages.lock().unwrap().len(), 3);

    let verdicts = verdicts.lock().unwrap();
    assert_eq!(verdicts.len(), 4);
    assert!(verdicts.contains(&("held.com".to_string(), "active", false)));
    assert!(verdicts.contains(&("gofit.ai".to_string(), "unknown", true)));
    assert!(verdicts.contains(&("lapsed.com".to_string(), "expired", true)));

    let messages = messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.starts_with("Crawling seed 1/2")));
    assert!(messages.iter().any(|m| m.contains("Total raw domain entries found: 4")));
}

// ============================================================================
// Failure Handling Tests
// ============================================================================

#[tokio::test]
async fn test_hunt_with_dead_seed_still_writes_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let output_dir = TempDir::new().unwrap();
    let config = config_for(&server, &output_dir);

    let summary = run_hunt(&config, HuntHooks::default(), report_date())
        .await
        .unwrap();

    assert_eq!(summary.candidates, 0);
    assert!(summary.expired.is_empty());
    let contents = std::fs::read_to_string(&summary.report_path).unwrap();
    assert_eq!(contents, "Domain\n");
}

#[tokio::test]
async fn test_hunt_rejects_invalid_config() {
    let output_dir = TempDir::new().unwrap();
    let config = HuntConfig {
        seeds: vec![],
        output_dir: output_dir.path().to_path_buf(),
        ..Default::default()
    };

    let result = run_hunt(&config, HuntHooks::default(), report_date()).await;
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(output_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_build_checker_follows_strategy() {
    let config = HuntConfig {
        strategy: LookupStrategy::Whois,
        ..Default::default()
    };
    assert_eq!(build_checker(&config).unwrap().name(), "whois");

    let config = HuntConfig {
        strategy: LookupStrategy::Api,
        ..Default::default()
    };
    assert_eq!(build_checker(&config).unwrap().name(), "api");
}
