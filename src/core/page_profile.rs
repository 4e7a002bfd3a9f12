use crate::domain::model::{Identifier, PageType};
use crate::utils::error::{EnrichError, Result};
use crate::utils::validation::{parse_pattern, parse_selector};
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"SSE-AD-\d+";

/// Pulls listing identifiers out of hrefs, ids and page URLs.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    regex: Regex,
}

impl IdentifierPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: parse_pattern("extraction.identifier_pattern", pattern)?,
        })
    }

    /// First match wins.
    pub fn find(&self, haystack: &str) -> Option<Identifier> {
        self.regex
            .find(haystack)
            .map(|m| Identifier::new(m.as_str()))
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl Default for IdentifierPattern {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_IDENTIFIER_PATTERN).expect("default identifier pattern is valid"),
        }
    }
}

/// Where a listing's identifier is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierSource {
    /// href of the price-guide link inside the listing
    LinkHref,
    /// the listing element's own `id` attribute
    ElementId,
    /// the URL of the page itself
    PageUrl,
}

/// Fixed insertion point for the rendered fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorRule {
    AfterLink,
    AppendToContainer,
    BetweenGalleryAndBody,
}

/// Selector set for one page type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProfile {
    pub page_type: PageType,
    pub listing_selector: String,
    pub link_selector: Option<String>,
    pub container_selector: Option<String>,
    pub gallery_selector: Option<String>,
    pub body_selector: Option<String>,
    pub full_width: bool,
}

/// Partial profile as it appears under `[pages.*]` in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOverrides {
    pub listing_selector: Option<String>,
    pub link_selector: Option<String>,
    pub container_selector: Option<String>,
    pub gallery_selector: Option<String>,
    pub body_selector: Option<String>,
    pub full_width: Option<bool>,
}

impl PageProfile {
    pub fn default_for(page_type: PageType) -> Self {
        match page_type {
            PageType::SearchResults => Self {
                page_type,
                listing_selector: "[class*='_listing-card']".to_string(),
                link_selector: Some("a[href*='price-guide']".to_string()),
                container_selector: None,
                gallery_selector: None,
                body_selector: None,
                full_width: false,
            },
            PageType::SavedItems => Self {
                page_type,
                listing_selector: ".listing-item.card.topspot".to_string(),
                link_selector: None,
                container_selector: Some(".row".to_string()),
                gallery_selector: None,
                body_selector: None,
                full_width: true,
            },
            PageType::Detail => Self {
                page_type,
                listing_selector: "body".to_string(),
                link_selector: None,
                container_selector: None,
                gallery_selector: Some("[class*='gallery']".to_string()),
                body_selector: Some("[class*='details']".to_string()),
                full_width: false,
            },
        }
    }

    pub fn identifier_source(&self) -> IdentifierSource {
        match self.page_type {
            PageType::SearchResults => IdentifierSource::LinkHref,
            PageType::SavedItems => IdentifierSource::ElementId,
            PageType::Detail => IdentifierSource::PageUrl,
        }
    }

    pub fn anchor_rule(&self) -> AnchorRule {
        match self.page_type {
            PageType::SearchResults => AnchorRule::AfterLink,
            PageType::SavedItems => AnchorRule::AppendToContainer,
            PageType::Detail => AnchorRule::BetweenGalleryAndBody,
        }
    }

    pub fn with_overrides(mut self, overrides: &ProfileOverrides) -> Self {
        if let Some(s) = &overrides.listing_selector {
            self.listing_selector = s.clone();
        }
        if let Some(s) = &overrides.link_selector {
            self.link_selector = Some(s.clone());
        }
        if let Some(s) = &overrides.container_selector {
            self.container_selector = Some(s.clone());
        }
        if let Some(s) = &overrides.gallery_selector {
            self.gallery_selector = Some(s.clone());
        }
        if let Some(s) = &overrides.body_selector {
            self.body_selector = Some(s.clone());
        }
        if let Some(full_width) = overrides.full_width {
            self.full_width = full_width;
        }
        self
    }

    /// 編譯所有 selector；該頁面類型必要的 selector 缺少時回傳錯誤
    pub fn compile(&self) -> Result<CompiledProfile> {
        let prefix = format!("pages.{}", self.page_type.as_str());
        let required = |name: &str, value: &Option<String>| -> Result<Selector> {
            let field = format!("{}.{}", prefix, name);
            match value {
                Some(s) => parse_selector(&field, s),
                None => Err(EnrichError::MissingConfigError { field }),
            }
        };

        let listing = parse_selector(&format!("{}.listing_selector", prefix), &self.listing_selector)?;
        let (link, container, gallery, body) = match self.anchor_rule() {
            AnchorRule::AfterLink => (
                Some(required("link_selector", &self.link_selector)?),
                None,
                None,
                None,
            ),
            AnchorRule::AppendToContainer => (
                None,
                Some(required("container_selector", &self.container_selector)?),
                None,
                None,
            ),
            AnchorRule::BetweenGalleryAndBody => (
                None,
                None,
                Some(required("gallery_selector", &self.gallery_selector)?),
                Some(required("body_selector", &self.body_selector)?),
            ),
        };

        Ok(CompiledProfile {
            page_type: self.page_type,
            identifier_source: self.identifier_source(),
            anchor_rule: self.anchor_rule(),
            full_width: self.full_width,
            listing,
            link,
            container,
            gallery,
            body,
        })
    }
}

/// Parsed selectors, ready for querying a document.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub page_type: PageType,
    pub identifier_source: IdentifierSource,
    pub anchor_rule: AnchorRule,
    pub full_width: bool,
    pub listing: Selector,
    pub link: Option<Selector>,
    pub container: Option<Selector>,
    pub gallery: Option<Selector>,
    pub body: Option<Selector>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_pattern_first_match() {
        let pattern = IdentifierPattern::default();
        let id = pattern
            .find("/price-guide/SSE-AD-111?ref=SSE-AD-222")
            .unwrap();
        assert_eq!(id.as_str(), "SSE-AD-111");
        assert!(pattern.find("/price-guide/OAG-AD-1").is_none());
    }

    #[test]
    fn test_default_profiles_compile() {
        for page_type in PageType::ALL {
            let compiled = PageProfile::default_for(page_type).compile().unwrap();
            assert_eq!(compiled.page_type, page_type);
        }
    }

    #[test]
    fn test_saved_items_is_full_width() {
        assert!(PageProfile::default_for(PageType::SavedItems).full_width);
        assert!(!PageProfile::default_for(PageType::SearchResults).full_width);
    }

    #[test]
    fn test_overrides_replace_only_given_fields() {
        let overrides = ProfileOverrides {
            listing_selector: Some("article.card".to_string()),
            ..Default::default()
        };
        let profile = PageProfile::default_for(PageType::SearchResults).with_overrides(&overrides);
        assert_eq!(profile.listing_selector, "article.card");
        assert_eq!(profile.link_selector.as_deref(), Some("a[href*='price-guide']"));
    }

    #[test]
    fn test_missing_required_selector() {
        let mut profile = PageProfile::default_for(PageType::Detail);
        profile.body_selector = None;
        let err = profile.compile().unwrap_err();
        assert!(matches!(err, EnrichError::MissingConfigError { .. }));
    }
}
