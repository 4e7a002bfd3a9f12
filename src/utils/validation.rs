use crate::utils::error::{EnrichError, Result};
use scraper::Selector;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(EnrichError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(EnrichError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 解析 CSS selector，失敗時轉成設定錯誤
pub fn parse_selector(field_name: &str, selector: &str) -> Result<Selector> {
    validate_non_empty_string(field_name, selector)?;
    Selector::parse(selector).map_err(|e| EnrichError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: selector.to_string(),
        reason: format!("Invalid CSS selector: {:?}", e),
    })
}

pub fn parse_pattern(field_name: &str, pattern: &str) -> Result<regex::Regex> {
    validate_non_empty_string(field_name, pattern)?;
    regex::Regex::new(pattern).map_err(|e| EnrichError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: pattern.to_string(),
        reason: format!("Invalid regular expression: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoint.base_url", "https://example.com").is_ok());
        assert!(validate_url("endpoint.base_url", "http://example.com").is_ok());
        assert!(validate_url("endpoint.base_url", "").is_err());
        assert!(validate_url("endpoint.base_url", "invalid-url").is_err());
        assert!(validate_url("endpoint.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("endpoint.timeout_seconds", 30, 1, 600).is_ok());
        assert!(validate_range("endpoint.timeout_seconds", 0, 1, 600).is_err());
    }

    #[test]
    fn test_parse_selector() {
        assert!(parse_selector("pages.search_results.listing_selector", "[class*='_listing-card']").is_ok());
        assert!(parse_selector("pages.search_results.listing_selector", "").is_err());
        assert!(parse_selector("pages.search_results.listing_selector", "a[href*=").is_err());
    }

    #[test]
    fn test_parse_pattern() {
        assert!(parse_pattern("extraction.identifier_pattern", r"SSE-AD-\d+").is_ok());
        assert!(parse_pattern("extraction.identifier_pattern", "SSE-(").is_err());
    }
}
