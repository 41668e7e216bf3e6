// src/integrations/catalog/mod.rs
pub mod gateway;
pub mod http_client;

pub use gateway::{CatalogGateway, PagedListing};
pub use http_client::{HttpCatalogGateway, DEFAULT_BASE_URL};

#[cfg(test)]
pub use gateway::MockCatalogGateway;
