use crate::config::toml_config::TomlConfig;
use crate::core::engine::PageRequest;
use crate::domain::model::PageType;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{validate_path, validate_url, Validate};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PageTypeArg {
    /// Detect from the page URL
    Auto,
    SearchResults,
    SavedItems,
    Detail,
}

impl PageTypeArg {
    pub fn resolve(self) -> Option<PageType> {
        match self {
            PageTypeArg::Auto => None,
            PageTypeArg::SearchResults => Some(PageType::SearchResults),
            PageTypeArg::SavedItems => Some(PageType::SavedItems),
            PageTypeArg::Detail => Some(PageType::Detail),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "carsales-price-history")]
#[command(about = "Add price history panels to car-listing pages")]
pub struct CliConfig {
    /// Saved HTML page to enrich
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Page URL; fetched when no --input is given, otherwise used for page detection
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long, value_enum, default_value = "auto")]
    pub page_type: PageTypeArg,

    /// Where to write the enriched page (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the insights endpoint base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Override the delay between listings
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Override the request timeout
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// List discovered identifiers without fetching anything
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl CliConfig {
    /// 載入設定檔並套用命令列覆蓋
    pub fn load_config(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(endpoint) = &self.endpoint {
            tracing::info!("🔧 Endpoint overridden to: {}", endpoint);
            config.endpoint.base_url = endpoint.clone();
        }
        if let Some(delay_ms) = self.delay_ms {
            tracing::info!("🔧 Delay overridden to: {}ms", delay_ms);
            config.rate_limit.delay_ms = delay_ms;
        }
        if let Some(timeout) = self.timeout_secs {
            config.endpoint.timeout_seconds = timeout;
        }
    }

    pub fn page_request(&self) -> Result<PageRequest> {
        let url = self
            .url
            .as_deref()
            .map(|u| {
                Url::parse(u).map_err(|e| EnrichError::InvalidConfigValueError {
                    field: "url".to_string(),
                    value: u.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(PageRequest {
            input: self.input.clone(),
            url,
            page_type: self.page_type.resolve(),
        })
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.input.is_none() && self.url.is_none() {
            return Err(EnrichError::MissingConfigError {
                field: "--input or --url".to_string(),
            });
        }
        if let Some(url) = &self.url {
            validate_url("url", url)?;
        }
        for (field, path) in [
            ("input", &self.input),
            ("output", &self.output),
            ("report", &self.report),
            ("config", &self.config),
        ] {
            if let Some(path) = path {
                validate_path(field, &path.to_string_lossy())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_args() {
        let cli = CliConfig::try_parse_from(["carsales-price-history", "--input", "page.html"]).unwrap();
        assert_eq!(cli.page_type, PageTypeArg::Auto);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_requires_input_or_url() {
        let cli = CliConfig::try_parse_from(["carsales-price-history"]).unwrap();
        assert!(matches!(
            cli.validate().unwrap_err(),
            EnrichError::MissingConfigError { .. }
        ));
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = CliConfig::try_parse_from([
            "carsales-price-history",
            "--url",
            "https://www.carsales.com.au/saved-items",
            "--endpoint",
            "http://localhost:9000/insights",
            "--delay-ms",
            "10",
            "--timeout-secs",
            "3",
            "--page-type",
            "saved-items",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.endpoint.base_url, "http://localhost:9000/insights");
        assert_eq!(config.rate_limit.delay_ms, 10);
        assert_eq!(config.endpoint.timeout_seconds, 3);

        let request = cli.page_request().unwrap();
        assert_eq!(request.page_type, Some(PageType::SavedItems));
        assert!(request.url.is_some());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let cli = CliConfig::try_parse_from(["carsales-price-history", "--url", "not a url"]).unwrap();
        assert!(cli.validate().is_err());
        assert!(cli.page_request().is_err());
    }
}
