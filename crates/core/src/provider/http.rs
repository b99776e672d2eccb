//! Shared HTTP plumbing for the remote dictionary providers.

use crate::{Error, Result};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the client shared by every remote provider.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {e}")))
}

/// Append `word` as a single, percent-encoded path segment of `base`.
pub fn endpoint(base: &str, word: &str, provider: &'static str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| Error::configuration(format!("Invalid {provider} base URL {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| Error::configuration(format!("{provider} base URL cannot carry a path")))?
        .pop_if_empty()
        .push(word);
    Ok(url)
}

/// GET `url` expecting a 2xx JSON body.
///
/// Transport errors, non-success statuses and undecodable payloads all
/// surface as [`Error::Provider`].
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    provider: &'static str,
) -> Result<T> {
    let response = client
        .get(url)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::provider(provider, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::provider(provider, format!("HTTP {status}")));
    }

    response
        .json()
        .await
        .map_err(|e| Error::provider(provider, format!("unparseable payload: {e}")))
}
