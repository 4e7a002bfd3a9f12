// Domain layer: listing identifiers, enrichment data and the ports the pipeline talks through.

pub mod model;
pub mod ports;
