//! Flight-search fetch collaborator.
//!
//! Thin HTTP client for a hosted round-trip search API. Returns the raw
//! payload or an explicit error; it never retries — the pipeline records a
//! failed query as an empty bucket and moves on. The core's only contract
//! with this payload is best-effort extraction in [`crate::normalize`].

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::time::Duration;

use crate::config::FetchConfig;
use crate::models::QueryKey;

pub struct FlightsClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    api_key: String,
    limit: u32,
    stops: u32,
}

impl FlightsClient {
    /// Builds a client, resolving the API key from the environment variable
    /// named in the config. A missing key is a configuration error and
    /// fatal before any query executes.
    pub fn new(cfg: &FetchConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env)
            .with_context(|| format!("Missing required env var: {}", cfg.api_key_env))?;
        if api_key.trim().is_empty() {
            bail!("Env var {} is set but empty", cfg.api_key_env);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            host: cfg.host.clone(),
            api_key,
            limit: cfg.limit_per_query,
            stops: cfg.stops,
        })
    }

    /// One round-trip search for a planned query. The payload shape is
    /// provider-defined; callers hand it straight to the normalizer.
    pub async fn search_round_trip(&self, query: &QueryKey, currency: &str) -> Result<Value> {
        let url = format!("{}/flights/search-return", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .query(&[
                ("originSkyId", query.origin.as_str()),
                ("destinationSkyId", query.destination.as_str()),
                ("departureDate", &query.outbound_date.to_string()),
                ("returnDate", &query.inbound_date.to_string()),
                ("currency", currency),
                ("stops", &self.stops.to_string()),
                ("adults", "1"),
                ("cabinClass", "ECONOMY"),
                ("sort", "PRICE"),
                ("limit", &self.limit.to_string()),
            ])
            .send()
            .await
            .with_context(|| {
                format!(
                    "Search request failed for {} -> {} on {}",
                    query.origin, query.destination, query.outbound_date
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(500).collect();
            bail!(
                "Search returned {} for {} -> {} on {}: {}",
                status,
                query.origin,
                query.destination,
                query.outbound_date,
                snippet
            );
        }

        response
            .json::<Value>()
            .await
            .context("Search response was not valid JSON")
    }
}
