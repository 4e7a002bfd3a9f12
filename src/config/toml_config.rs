use crate::adapters::http::{DEFAULT_ENDPOINT_BASE, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::core::page_profile::{
    IdentifierPattern, PageProfile, ProfileOverrides, DEFAULT_IDENTIFIER_PATTERN,
};
use crate::core::rate_limit::DEFAULT_LISTING_DELAY;
use crate::domain::model::PageType;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub endpoint: EndpointConfig,
    pub rate_limit: RateLimitConfig,
    pub extraction: ExtractionConfig,
    pub pages: PagesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT_BASE.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub delay_ms: u64,
    pub jitter_ms: u64,
    pub backoff_on_failure: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_LISTING_DELAY.as_millis() as u64,
            jitter_ms: 0,
            backoff_on_failure: false,
        }
    }
}

impl RateLimitConfig {
    /// 低於預設間隔仍可通過驗證，只發出警告
    pub fn is_below_default_spacing(&self) -> bool {
        Duration::from_millis(self.delay_ms) < DEFAULT_LISTING_DELAY
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub identifier_pattern: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            identifier_pattern: DEFAULT_IDENTIFIER_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    pub search_results: ProfileOverrides,
    pub saved_items: ProfileOverrides,
    pub detail: ProfileOverrides,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EnrichError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EnrichError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${INSIGHTS_BASE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EnrichError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn profile(&self, page_type: PageType) -> PageProfile {
        let overrides = match page_type {
            PageType::SearchResults => &self.pages.search_results,
            PageType::SavedItems => &self.pages.saved_items,
            PageType::Detail => &self.pages.detail,
        };
        PageProfile::default_for(page_type).with_overrides(overrides)
    }

    pub fn pattern(&self) -> Result<IdentifierPattern> {
        IdentifierPattern::new(self.identifier_pattern())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("endpoint.base_url", &self.endpoint.base_url)?;
        validate_range("endpoint.timeout_seconds", self.endpoint.timeout_seconds, 1, 600)?;
        validate_non_empty_string("endpoint.user_agent", &self.endpoint.user_agent)?;
        validate_range("rate_limit.delay_ms", self.rate_limit.delay_ms, 0, 600_000)?;
        validate_range("rate_limit.jitter_ms", self.rate_limit.jitter_ms, 0, 600_000)?;
        if self.rate_limit.is_below_default_spacing() {
            tracing::warn!(
                "⚠️ rate_limit.delay_ms = {} is below the default {}ms spacing between insights requests",
                self.rate_limit.delay_ms,
                DEFAULT_LISTING_DELAY.as_millis()
            );
        }
        self.pattern()?;

        for page_type in PageType::ALL {
            self.profile(page_type).compile()?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn endpoint_base(&self) -> &str {
        &self.endpoint.base_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.endpoint.timeout_seconds)
    }

    fn user_agent(&self) -> &str {
        &self.endpoint.user_agent
    }

    fn listing_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limit.delay_ms)
    }

    fn delay_jitter(&self) -> Duration {
        Duration::from_millis(self.rate_limit.jitter_ms)
    }

    fn backoff_on_failure(&self) -> bool {
        self.rate_limit.backoff_on_failure
    }

    fn identifier_pattern(&self) -> &str {
        &self.extraction.identifier_pattern
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
