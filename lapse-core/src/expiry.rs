use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};
use whois_service::{WhoisClient, WhoisResponse};

/// Timestamp layout of the `expires` field returned by the lookup API.
pub const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const NOT_REGISTERED_MARKERS: [&str; 6] = [
    "no match for",
    "not found",
    "no data found",
    "no entries found",
    "no object found",
    "is available for registration",
];

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("WHOIS lookup failed: {0}")]
    Whois(String),

    #[error("lookup for {0} timed out")]
    Timeout(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup API returned status {0}")]
    Status(u16),

    #[error("no expiration date in response")]
    MissingExpiry,

    #[error("unparsable expiration date '{0}'")]
    BadTimestamp(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// What a lookup could establish about a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Active { expires: DateTime<Utc> },
    /// `expires` is `None` when the registry has no record at all.
    Expired { expires: Option<DateTime<Utc>> },
    Unknown { reason: String },
}

impl LookupOutcome {
    /// A registration is expired when its expiry lies strictly before `now`.
    pub fn classify(expires: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if expires < now {
            LookupOutcome::Expired {
                expires: Some(expires),
            }
        } else {
            LookupOutcome::Active { expires }
        }
    }

    pub fn is_expired(&self, policy: UnknownPolicy) -> bool {
        match self {
            LookupOutcome::Active { .. } => false,
            LookupOutcome::Expired { .. } => true,
            LookupOutcome::Unknown { .. } => policy == UnknownPolicy::AssumeExpired,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LookupOutcome::Active { .. } => "active",
            LookupOutcome::Expired { .. } => "expired",
            LookupOutcome::Unknown { .. } => "unknown",
        }
    }
}

impl From<LookupError> for LookupOutcome {
    fn from(err: LookupError) -> Self {
        LookupOutcome::Unknown {
            reason: err.to_string(),
        }
    }
}

/// How a lookup that could not be verified is counted.
///
/// `AssumeExpired` keeps unverifiable domains in the results, so a failed
/// lookup can surface a registered domain as expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnknownPolicy {
    #[default]
    AssumeExpired,
    AssumeActive,
}

impl UnknownPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expired" | "assume-expired" => Some(UnknownPolicy::AssumeExpired),
            "active" | "assume-active" => Some(UnknownPolicy::AssumeActive),
            _ => None,
        }
    }
}

/// Either lookup strategy behind one call site.
pub enum ExpiryChecker {
    Whois(WhoisChecker),
    Api(ApiChecker),
}

impl ExpiryChecker {
    pub async fn lookup(&self, domain: &str) -> LookupOutcome {
        match self {
            ExpiryChecker::Whois(checker) => checker.lookup(domain).await,
            ExpiryChecker::Api(checker) => checker.lookup(domain).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExpiryChecker::Whois(_) => "whois",
            ExpiryChecker::Api(_) => "api",
        }
    }
}

// ============================================================================
// Registry lookup (WHOIS / RDAP)
// ============================================================================

/// What a registry record says about expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WhoisExpiry {
    Expires(DateTime<Utc>),
    NotRegistered,
}

/// Registry lookups through `whois-service`, which picks RDAP or WHOIS and
/// the right server per TLD. Every lookup is bounded by `timeout` since the
/// client's own limit is far longer.
pub struct WhoisChecker {
    timeout: Duration,
}

impl WhoisChecker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn lookup(&self, domain: &str) -> LookupOutcome {
        let result = match timeout(self.timeout, self.fetch_expiry(domain)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(domain.to_string())),
        };

        match result {
            Ok(WhoisExpiry::Expires(expires)) => LookupOutcome::classify(expires, Utc::now()),
            Ok(WhoisExpiry::NotRegistered) => LookupOutcome::Expired { expires: None },
            Err(e) => {
                warn!("WHOIS failed for {}: {}", domain, e);
                e.into()
            }
        }
    }

    async fn fetch_expiry(&self, domain: &str) -> Result<WhoisExpiry, LookupError> {
        debug!("Starting WHOIS lookup for {}", domain);

        // Lightweight, so one per lookup
        let client = WhoisClient::new()
            .await
            .map_err(|e| LookupError::Whois(format!("failed to create WHOIS client: {}", e)))?;
        let response = client
            .lookup(domain)
            .await
            .map_err(|e| LookupError::Whois(e.to_string()))?;

        whois_expiry(&response)
    }
}

fn whois_expiry(response: &WhoisResponse) -> Result<WhoisExpiry, LookupError> {
    let expiration = response
        .parsed_data
        .as_ref()
        .and_then(|parsed| parsed.expiration_date.as_deref());
    interpret_whois_record(expiration, &response.raw_data)
}

/// Map a registry record's expiration field onto a verdict.
///
/// Without an expiration date the raw text is checked for the registry's
/// "no match" wording; anything else is `MissingExpiry`.
pub fn interpret_whois_record(
    expiration: Option<&str>,
    raw_text: &str,
) -> Result<WhoisExpiry, LookupError> {
    if let Some(raw) = expiration.map(str::trim).filter(|s| !s.is_empty()) {
        return parse_whois_timestamp(raw)
            .map(WhoisExpiry::Expires)
            .ok_or_else(|| LookupError::BadTimestamp(raw.to_string()));
    }

    let lowered = raw_text.to_lowercase();
    if NOT_REGISTERED_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Ok(WhoisExpiry::NotRegistered);
    }

    Err(LookupError::MissingExpiry)
}

/// Parse the date layouts registries commonly use, all read as UTC.
pub fn parse_whois_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
        "%d-%b-%Y",
        "%d/%m/%Y",
    ];

    for format in &formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(naive_dt.and_utc());
        }
        if let Ok(naive_date) = NaiveDate::parse_from_str(date_str, format) {
            return Some(naive_date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

// ============================================================================
// Third-party WHOIS API
// ============================================================================

pub struct ApiChecker {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ApiChecker {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub async fn lookup(&self, domain: &str) -> LookupOutcome {
        match self.fetch_expiry(domain).await {
            Ok(expires) => LookupOutcome::classify(expires, Utc::now()),
            Err(e) => {
                warn!("WHOIS API failed for {}: {}", domain, e);
                e.into()
            }
        }
    }

    async fn fetch_expiry(&self, domain: &str) -> Result<DateTime<Utc>, LookupError> {
        let response = self
            .client
            .get(format!("{}/v1/whois", self.base_url))
            .query(&[("domain", domain)])
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;
        parse_api_expiry(&body)
    }
}

/// Read the `expires` field of an API response.
pub fn parse_api_expiry(body: &serde_json::Value) -> Result<DateTime<Utc>, LookupError> {
    let raw = match body.get("expires") {
        None | Some(serde_json::Value::Null) => return Err(LookupError::MissingExpiry),
        Some(serde_json::Value::String(s)) if s.is_empty() => {
            return Err(LookupError::MissingExpiry);
        }
        Some(serde_json::Value::String(s)) => s,
        Some(other) => {
            return Err(LookupError::Malformed(format!(
                "expires is not a string: {}",
                other
            )));
        }
    };

    NaiveDateTime::parse_from_str(raw, API_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| LookupError::BadTimestamp(raw.clone()))
}
