use crate::report::EnrichedDomain;
use regex::Regex;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Text the archive shows when it has never captured a site.
const NO_ARCHIVE_MARKER: &str = "No results found";

const BRAND_KEYWORDS: [&str; 10] = [
    "fit", "tech", "cloud", "shop", "home", "ai", "data", "bot", "go", "get",
];

static COUNTER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.counter").expect("counter selector is valid"));

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// Brandability heuristic over the label before the first dot, 0 to 3.
///
/// One point each for: at most ten characters, letters only, and containing
/// a marketing keyword.
pub fn brandability_score(domain: &str) -> u8 {
    let label = domain.split('.').next().unwrap_or_default();
    let lowered = label.to_ascii_lowercase();

    let mut score = 0;
    if label.chars().count() <= 10 {
        score += 1;
    }
    if !label.is_empty() && label.chars().all(|c| c.is_ascii_alphabetic()) {
        score += 1;
    }
    if BRAND_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        score += 1;
    }
    score
}

/// First run of digits inside the first `span.counter` of a page.
pub fn parse_backlink_counter(html: &str) -> Option<u64> {
    let document = Html::parse_document(html);
    let counter = document.select(&COUNTER_SELECTOR).next()?;
    let text: String = counter.text().collect();
    DIGITS.find(&text)?.as_str().parse().ok()
}

/// Network-backed scorers for expired domains.
///
/// Each scorer swallows its own failures and returns a neutral value, so a
/// record is produced for every domain.
pub struct SeoScorer {
    client: Client,
    // The archive is queried without a user agent header.
    archive_client: Client,
    archive_base: String,
    backlink_base: String,
}

impl SeoScorer {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        archive_base: impl Into<String>,
        backlink_base: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .build()?;
        let archive_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .build()?;

        Ok(Self {
            client,
            archive_client,
            archive_base: archive_base.into().trim_end_matches('/').to_string(),
            backlink_base: backlink_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// True unless the archive reports no captures. A failed request counts
    /// as no past content.
    pub async fn has_past_content(&self, domain: &str) -> bool {
        let url = format!("{}/web/*/http://{}", self.archive_base, domain);
        debug!("Checking archive: {}", url);

        let response = match self.archive_client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Archive check failed for {}: {}", domain, e);
                return false;
            }
        };
        match response.text().await {
            Ok(body) => !body.contains(NO_ARCHIVE_MARKER),
            Err(e) => {
                debug!("Archive body unreadable for {}: {}", domain, e);
                false
            }
        }
    }

    /// Backlink count scraped from the checker's counter element, or 0.
    pub async fn estimate_backlinks(&self, domain: &str) -> u64 {
        let url = format!("{}/r/{}", self.backlink_base, domain);

        let body = match self.client.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => response.text().await,
            Ok(response) => {
                debug!("Backlink page for {} returned {}", domain, response.status());
                return 0;
            }
            Err(e) => Err(e),
        };

        match body {
            Ok(html) => parse_backlink_counter(&html).unwrap_or(0),
            Err(e) => {
                warn!("Backlink check failed for {}: {}", domain, e);
                0
            }
        }
    }

    pub async fn score(&self, domain: &str) -> EnrichedDomain {
        let past_usage = self.has_past_content(domain).await;
        let brandability = brandability_score(domain);
        let backlinks = self.estimate_backlinks(domain).await;

        EnrichedDomain {
            domain: domain.to_string(),
            past_usage,
            brandability,
            backlinks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, path_regex},
    };

    fn scorer_for(server: &MockServer) -> SeoScorer {
        SeoScorer::new(
            Duration::from_millis(500),
            "Mozilla/5.0",
            server.uri(),
            server.uri(),
        )
        .unwrap()
    }

    #[test]
    fn test_brandability_examples() {
        assert_eq!(brandability_score("gofit.ai"), 3);
        assert_eq!(brandability_score("zebra.com"), 2);
        assert_eq!(brandability_score("x-9.io"), 1);
        assert_eq!(brandability_score("averyveryverylongname-77.com"), 0);
        assert_eq!(brandability_score("CloudNine.io"), 3);
        assert_eq!(brandability_score("quantumbotics.com"), 2);
    }

    #[test]
    fn test_brandability_always_in_range() {
        for domain in [
            "", ".", "a.com", "1234567890.io", "-.ai", "ÄÖÜ.com", "get.get.get",
            "supercalifragilistic.com", "data-bot-9.ai",
        ] {
            let score = brandability_score(domain);
            assert!(score <= 3, "{} scored {}", domain, score);
        }
    }

    #[test]
    fn test_parse_backlink_counter() {
        let html = r#"<div><span class="counter">About 1,234 links</span>
            <span class="counter">99</span></div>"#;
        assert_eq!(parse_backlink_counter(html), Some(1));
        assert_eq!(
            parse_backlink_counter(r#"<span class="big counter">512 backlinks</span>"#),
            Some(512)
        );
        assert_eq!(parse_backlink_counter(r#"<div class="counter">7</div>"#), None);
        assert_eq!(parse_backlink_counter(r#"<span class="counter">none</span>"#), None);
    }

    #[tokio::test]
    async fn test_past_content() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/web/.*used\.com$"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Saved 40 times</p>"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/web/.*fresh\.com$"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<p>No results found for fresh.com</p>"),
            )
            .mount(&mock_server)
            .await;

        let scorer = scorer_for(&mock_server);
        assert!(scorer.has_past_content("used.com").await);
        assert!(!scorer.has_past_content("fresh.com").await);
    }

    #[tokio::test]
    async fn test_past_content_fails_closed() {
        let scorer = SeoScorer::new(
            Duration::from_millis(300),
            "Mozilla/5.0",
            "http://127.0.0.1:1",
            "http://127.0.0.1:1",
        )
        .unwrap();
        assert!(!scorer.has_past_content("down.com").await);
        assert_eq!(scorer.estimate_backlinks("down.com").await, 0);
    }

    #[tokio::test]
    async fn test_backlinks_from_counter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/linked.com"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><body><span class="counter">3,210</span></body></html>"#),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/gone.com"))
            .respond_with(ResponseTemplate::new(403).set_body_string(r#"<span class="counter">55</span>"#))
            .mount(&mock_server)
            .await;

        let scorer = scorer_for(&mock_server);
        assert_eq!(scorer.estimate_backlinks("linked.com").await, 3);
        assert_eq!(scorer.estimate_backlinks("gone.com").await, 0);
    }

    /// Test that a missing counter still yields a full record
    #[tokio::test]
    async fn test_score_without_counter() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/web/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("captures"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/gofit.ai"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>no counter here</p>"))
            .mount(&mock_server)
            .await;

        let record = scorer_for(&mock_server).score("gofit.ai").await;
        assert_eq!(
            record,
            EnrichedDomain {
                domain: "gofit.ai".to_string(),
                past_usage: true,
                brandability: 3,
                backlinks: 0,
            }
        );
    }

    /// Test that only the backlink request carries the browser user agent
    #[tokio::test]
    async fn test_user_agent_per_service() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/web/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("captured"))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r/agent.io"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<span class="counter">3</span>"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let record = scorer_for(&mock_server).score("agent.io").await;
        assert!(record.past_usage);
        assert_eq!(record.backlinks, 3);

        let requests = mock_server.received_requests().await.unwrap();
        let archive = requests
            .iter()
            .find(|req| req.url.path().starts_with("/web/"))
            .unwrap();
        assert!(!archive.headers.contains_key("user-agent"));

        let backlinks = requests
            .iter()
            .find(|req| req.url.path().starts_with("/r/"))
            .unwrap();
        assert_eq!(
            backlinks.headers.get("user-agent").unwrap().to_str().unwrap(),
            "Mozilla/5.0"
        );
    }
}
