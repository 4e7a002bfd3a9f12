pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{html::HtmlPage, http::InsightsClient};
pub use core::{
    control::RunToggle,
    engine::{EnrichmentEngine, PageRequest},
    pipeline::EnrichmentPipeline,
    rate_limit::RateLimiter,
};
pub use utils::error::{EnrichError, Result};
