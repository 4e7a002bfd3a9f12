// Adapters layer: concrete implementations for external systems (insights endpoint, HTML documents).

pub mod html;
pub mod http;
