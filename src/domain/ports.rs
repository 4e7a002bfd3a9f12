use crate::domain::model::{EnrichmentResult, Identifier, PageType, RenderedFragment};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Where enrichment data comes from; one call per listing.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn fetch(&self, identifier: &Identifier) -> Result<EnrichmentResult>;
}

/// A loaded page whose listings can be discovered and annotated.
pub trait ListingPage {
    type Listing: Copy + Debug;

    fn page_type(&self) -> PageType;

    /// Whether fragments on this page span the full row.
    fn full_width(&self) -> bool {
        false
    }

    /// Snapshot of listing elements in document order.
    fn discover(&self) -> Vec<Self::Listing>;

    fn extract_identifier(&self, listing: Self::Listing) -> Option<Identifier>;

    fn is_already_enriched(&self, listing: Self::Listing, identifier: &Identifier) -> bool;

    fn attach(&mut self, listing: Self::Listing, fragment: &RenderedFragment) -> Result<()>;
}

pub trait ConfigProvider: Send + Sync {
    fn endpoint_base(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn user_agent(&self) -> &str;
    fn listing_delay(&self) -> Duration;
    fn delay_jitter(&self) -> Duration;
    fn backoff_on_failure(&self) -> bool;
    fn identifier_pattern(&self) -> &str;
}
