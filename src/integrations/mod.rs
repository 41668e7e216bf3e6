// src/integrations/mod.rs
//
// External Integrations Module
//
// The catalog service is the only external system. The core talks to it
// through the CatalogGateway trait; the HTTP client is one implementation.

pub mod catalog;

pub use catalog::{CatalogGateway, HttpCatalogGateway, PagedListing, DEFAULT_BASE_URL};

#[cfg(test)]
pub use catalog::MockCatalogGateway;
