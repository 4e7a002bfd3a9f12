pub mod control;
pub mod engine;
pub mod page_profile;
pub mod pipeline;
pub mod rate_limit;
pub mod render;

pub use crate::domain::model::{EnrichmentResult, Identifier, PageType, RenderedFragment, RunReport};
pub use crate::domain::ports::{ConfigProvider, EnrichmentSource, ListingPage};
pub use crate::utils::error::Result;
