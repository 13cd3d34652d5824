use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// A host-like token ending in one of the watched suffixes. Loose on purpose:
/// version strings and file names match too, the expiry check sorts them out.
static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z0-9-]{1,63}\.(?i:com|ai|io)\b").expect("domain pattern is valid")
});

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Collect every domain candidate in the text content of a page.
///
/// Markup and attribute values are ignored; only text nodes are scanned.
/// Candidates are lower-cased so that `Brand.COM` and `brand.com` collapse.
pub fn extract_domains(html: &str) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let text: String = document.root_element().text().collect();

    DOMAIN_PATTERN
        .find_iter(&text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect()
}

/// Collect the same-host links of a page, resolved against `base_url`.
///
/// Hosts must match exactly (`www.a.test` is not `a.test`) and so must any
/// explicit port. The scheme may switch between http and https. Fragments
/// are dropped.
pub fn extract_internal_links(html: &str, base_url: &str) -> BTreeSet<String> {
    let Ok(base) = Url::parse(base_url) else {
        debug!("Unparsable base URL {}, no links extracted", base_url);
        return BTreeSet::new();
    };

    let document = Html::parse_document(html);
    let mut links = BTreeSet::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(&base, href)
        {
            if is_same_host(&absolute_url, &base) {
                links.insert(absolute_url.to_string());
            } else {
                debug!("  -> Cross-host link {} skipped", absolute_url);
            }
        }
    }

    links
}

/// Strip the fragment from an absolute URL. Used as the visited-set key.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let mut resolved = base.join(href.trim()).ok()?;
    if !resolved.scheme().starts_with("http") {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

fn is_same_host(candidate: &Url, base: &Url) -> bool {
    match (candidate.host_str(), base.host_str()) {
        (Some(host), Some(base_host)) => {
            host == base_host && candidate.port() == base.port()
        }
        _ => false,
    }
}
