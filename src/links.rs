use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::time::Duration;

use crate::config::{LOGO_SERVICE, SEARCH_URL};

pub enum Logo {
    Image(Vec<u8>),
    Badge(char),
}

pub fn interview_prep_url(title: &str) -> Result<Url> {
    let query = format!("{} interview questions", title.trim());
    Url::parse_with_params(SEARCH_URL, &[("q", query.as_str())])
        .context("Failed to build search URL")
}

/// Opens the prep search in the default browser; returns the URL either way.
pub fn open_prep(title: &str) -> Result<Url> {
    let url = interview_prep_url(title)?;
    if let Err(e) = webbrowser::open(url.as_str()) {
        log::warn!("could not open browser: {}", e);
    }
    Ok(url)
}

/// Best-effort company domain from a free-text title ("Acme Corp" -> "acmecorp.com").
pub fn guess_domain(title: &str) -> Option<String> {
    let name: String = title
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(format!("{}.com", name))
    }
}

pub fn logo_url(domain: &str) -> String {
    format!("{}/{}", LOGO_SERVICE, domain)
}

pub fn initial_badge(title: &str) -> char {
    title
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().next().unwrap_or(c))
        .unwrap_or('?')
}

pub fn http_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")
}

/// Fetches the company logo, falling back to the initial-letter badge on any failure.
pub fn fetch_logo(client: &reqwest::blocking::Client, title: &str) -> Logo {
    match try_fetch_logo(client, title) {
        Ok(bytes) => Logo::Image(bytes),
        Err(e) => {
            log::warn!("logo lookup for '{}' failed: {:#}", title, e);
            Logo::Badge(initial_badge(title))
        }
    }
}

fn try_fetch_logo(client: &reqwest::blocking::Client, title: &str) -> Result<Vec<u8>> {
    let domain = guess_domain(title).ok_or_else(|| anyhow!("No domain for '{}'", title))?;
    let response = client
        .get(logo_url(&domain))
        .send()
        .context("Logo request failed")?
        .error_for_status()?;
    let bytes = response.bytes()?;
    if bytes.is_empty() {
        return Err(anyhow!("Empty logo response"));
    }
    Ok(bytes.to_vec())
}
