use crate::adapters::html::HtmlPage;
use crate::adapters::http::{build_client, fetch_page, InsightsClient};
use crate::config::toml_config::TomlConfig;
use crate::core::page_profile::IdentifierPattern;
use crate::core::pipeline::EnrichmentPipeline;
use crate::core::rate_limit::RateLimiter;
use crate::domain::model::{PageType, RunReport};
use crate::domain::ports::{ConfigProvider, EnrichmentSource};
use crate::utils::error::{EnrichError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Which page to enrich and how to interpret it.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub input: Option<PathBuf>,
    pub url: Option<Url>,
    pub page_type: Option<PageType>,
}

impl PageRequest {
    /// Explicit page type wins, otherwise it is detected from the URL.
    pub fn resolve_page_type(&self) -> Result<PageType> {
        if let Some(page_type) = self.page_type {
            return Ok(page_type);
        }
        self.url
            .as_ref()
            .and_then(PageType::detect)
            .ok_or_else(|| EnrichError::MissingConfigError {
                field: "page_type (could not detect from URL)".to_string(),
            })
    }
}

pub struct EnrichmentEngine<S: EnrichmentSource> {
    config: TomlConfig,
    pipeline: EnrichmentPipeline<S>,
    http: Client,
}

impl EnrichmentEngine<InsightsClient> {
    pub fn from_config(config: TomlConfig) -> Result<Self> {
        let source = InsightsClient::from_config(&config)?;
        Self::new(config, source)
    }
}

impl<S: EnrichmentSource> EnrichmentEngine<S> {
    pub fn new(config: TomlConfig, source: S) -> Result<Self> {
        let http = build_client(config.request_timeout(), config.user_agent())?;
        let pipeline = EnrichmentPipeline::new(source, RateLimiter::from_config(&config));
        Ok(Self {
            config,
            pipeline,
            http,
        })
    }

    /// 讀取檔案或下載頁面並依頁面類型建立 `HtmlPage`
    pub async fn load_page(&self, request: &PageRequest) -> Result<HtmlPage> {
        let page_type = request.resolve_page_type()?;

        let html = match (&request.input, &request.url) {
            (Some(path), _) => {
                tracing::info!("📁 Loading page from: {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| EnrichError::PageLoadError {
                        location: path.display().to_string(),
                        message: e.to_string(),
                    })?
            }
            (None, Some(url)) => {
                tracing::info!("🌐 Fetching page: {}", url);
                fetch_page(&self.http, url.as_str()).await?
            }
            (None, None) => {
                return Err(EnrichError::MissingConfigError {
                    field: "input or url".to_string(),
                })
            }
        };

        let profile = self.config.profile(page_type).compile()?;
        let pattern = IdentifierPattern::new(self.config.identifier_pattern())?;
        let mut page = HtmlPage::parse(&html, profile).with_pattern(pattern);
        if let Some(url) = &request.url {
            page = page.with_page_url(url.clone());
        }

        tracing::debug!("Loaded {} page ({} bytes)", page_type, html.len());
        Ok(page)
    }

    pub async fn run(&mut self, page: &mut HtmlPage, cancel: &CancellationToken) -> RunReport {
        tracing::info!("Starting price history enrichment...");
        self.pipeline.run(page, cancel).await
    }

    /// Load, enrich, and hand back the page with its report.
    pub async fn run_request(
        &mut self,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<(HtmlPage, RunReport)> {
        let mut page = self.load_page(request).await?;
        let report = self.run(&mut page, cancel).await;
        Ok((page, report))
    }
}

/// Writes the enriched page to `path`, or stdout when no path is given.
pub async fn write_page(page: &HtmlPage, path: Option<&Path>) -> Result<()> {
    let html = page.to_html();
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, html).await?;
            tracing::info!("📁 Output saved to: {}", path.display());
        }
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(html.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

pub async fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    tracing::debug!("Report written to {}", path.display());
    Ok(())
}
