use crate::domain::model::{
    EnrichmentResult, Identifier, InsightsResponse, PriceChangeSection, PRICE_CHANGE_SECTION,
};
use crate::domain::ports::{ConfigProvider, EnrichmentSource};
use crate::utils::error::{EnrichError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ENDPOINT_BASE: &str = "https://www.carsales.com.au/mobiapi/carsales/v1/insights";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Client for the insights endpoint, `GET {base}/{identifier}`.
#[derive(Debug, Clone)]
pub struct InsightsClient {
    client: Client,
    base_url: String,
}

impl InsightsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = build_client(timeout, user_agent)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::new(
            config.endpoint_base(),
            config.request_timeout(),
            config.user_agent(),
        )
    }

    pub fn url_for(&self, identifier: &Identifier) -> String {
        format!("{}/{}", self.base_url, identifier)
    }
}

#[async_trait]
impl EnrichmentSource for InsightsClient {
    async fn fetch(&self, identifier: &Identifier) -> Result<EnrichmentResult> {
        let url = self.url_for(identifier);
        tracing::debug!("Making insights request to: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| EnrichError::NetworkError {
                identifier: identifier.to_string(),
                source,
            })?;

        let status = response.status();
        tracing::debug!("Insights response status for {}: {}", identifier, status);

        if !status.is_success() {
            return Err(EnrichError::HttpStatusError {
                identifier: identifier.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| EnrichError::NetworkError {
                identifier: identifier.to_string(),
                source,
            })?;

        parse_insights(identifier, &body)
    }
}

/// Picks the first `priceChangeHistoryDetail` section out of an insights body.
pub fn parse_insights(identifier: &Identifier, body: &str) -> Result<EnrichmentResult> {
    let response: InsightsResponse =
        serde_json::from_str(body).map_err(|e| EnrichError::ParseError {
            message: format!("insights response for {}: {}", identifier, e),
        })?;

    let Some(raw) = response
        .items
        .into_iter()
        .find(|item| item.get("sectionType").and_then(|v| v.as_str()) == Some(PRICE_CHANGE_SECTION))
    else {
        return Ok(EnrichmentResult::none());
    };

    let section: PriceChangeSection =
        serde_json::from_value(raw).map_err(|e| EnrichError::ParseError {
            message: format!("price change section for {}: {}", identifier, e),
        })?;

    Ok(EnrichmentResult::with_section(section))
}

pub fn build_client(timeout: Duration, user_agent: &str) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| EnrichError::ConfigError {
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Downloads a listing page to enrich.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let page_error = |message: String| EnrichError::PageLoadError {
        location: url.to_string(),
        message,
    };

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| page_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(page_error(format!("HTTP {}", status)));
    }

    response.text().await.map_err(|e| page_error(e.to_string()))
}
