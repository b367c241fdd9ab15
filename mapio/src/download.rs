use anyhow::{Context, Result};
use reqwest::blocking::Client;

use maputil::prettyprint_usize;

/// Builds the blocking HTTP client shared by every request in one run.
pub fn http_client(user_agent: &str) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .build()
        .context("building the HTTP client")
}

/// Downloads bytes from a URL, failing on any non-success status.
pub fn download_bytes<I: AsRef<str>>(client: &Client, url: I) -> Result<Vec<u8>> {
    let url = url.as_ref();
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("downloading {}", url))?;
    let resp = resp
        .error_for_status()
        .with_context(|| format!("downloading {}", url))?;
    let bytes = resp
        .bytes()
        .with_context(|| format!("reading the response from {}", url))?;
    debug!("downloaded {} bytes from {}", prettyprint_usize(bytes.len()), url);
    Ok(bytes.to_vec())
}
