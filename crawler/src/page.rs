use crate::cancel::CancelToken;
use lazy_static::lazy_static;
use reqwest::{header, Client};
use scraper::{Html, Selector};
use url::Url;

lazy_static! {
    static ref SEL_BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref SEL_ANCHOR: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Extracted page content: whitespace-collapsed visible text plus outbound
/// links absolutized against the page URL.
pub struct Page {
    pub text: String,
    pub links: Vec<Url>,
}

/// Canonical string form of a URL: no fragment, no default port, and no
/// trailing slash on path-less URLs. Scheme and host are already lowercased
/// by the parser; query strings are kept intact.
pub fn canonicalize(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    let mut out = url.to_string();
    if url.path() == "/" && url.query().is_none() && out.ends_with('/') {
        out.pop();
    }
    out
}

/// eTLD+1 of the URL's host, when it has one (IP literals and bare
/// localhost do not).
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host() {
        Some(url::Host::Domain(domain)) => psl::domain_str(domain).map(str::to_owned),
        _ => None,
    }
}

/// GET one page. `Ok(None)` means "skip this URL": cancelled, non-2xx,
/// or not an HTML document.
pub async fn fetch(client: &Client, url: &Url, cancel: &CancelToken) -> reqwest::Result<Option<String>> {
    let response = tokio::select! {
        r = client.get(url.clone()).send() => r?,
        _ = cancel.cancelled() => return Ok(None),
    };
    if !response.status().is_success() {
        return Ok(None);
    }
    if let Some(content_type) = response.headers().get(header::CONTENT_TYPE) {
        let is_html = content_type
            .to_str()
            .map(|v| v.starts_with("text/html"))
            .unwrap_or(false);
        if !is_html {
            return Ok(None);
        }
    }
    let body = tokio::select! {
        b = response.text() => b?,
        _ = cancel.cancelled() => return Ok(None),
    };
    Ok(Some(body))
}

/// Pull visible text and outbound http(s) links out of an HTML body.
pub fn extract(base: &Url, body: &str) -> Page {
    let document = Html::parse_document(body);

    let text = document
        .select(&SEL_BODY)
        .next()
        .map(|node| node.text().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut links = Vec::new();
    for anchor in document.select(&SEL_ANCHOR) {
        if let Some(href) = anchor.value().attr("href") {
            if let Ok(link) = Url::parse(href).or_else(|_| base.join(href)) {
                if matches!(link.scheme(), "http" | "https") {
                    links.push(link);
                }
            }
        }
    }

    Page { text, links }
}
