// src/integrations/catalog/gateway.rs
//
// Catalog Gateway - the contract the core needs from the catalog service
//
// CRITICAL RULES:
// - Every call may fail with a GatewayError carrying the catalog's detail text
// - The core never branches on status codes
// - Implementations decode rows into domain types; callers never see JSON

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{
    BuildId, BuildPayload, BuildRecord, Component, ComponentRef, PartCategory, SavedBuildSummary,
    SlotIds,
};
use crate::error::GatewayResult;

/// One page of a category listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedListing {
    pub items: Vec<Component>,
    pub total_pages: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// One page of `category`, 1-based
    async fn list_paged(
        &self,
        category: PartCategory,
        page: u32,
        page_size: u32,
    ) -> GatewayResult<PagedListing>;

    /// Keyword search with a price range in base currency
    async fn search(
        &self,
        category: PartCategory,
        term: &str,
        min_price: f64,
        max_price: f64,
    ) -> GatewayResult<Vec<Component>>;

    /// Parts of `category` compatible with the given filled slots
    async fn list_compatible(
        &self,
        category: PartCategory,
        other_slots: &SlotIds,
    ) -> GatewayResult<Vec<Component>>;

    /// PSUs able to feed the GPU and fit the case
    async fn list_psu_compatible(&self, gpu_id: i64, case_id: i64)
        -> GatewayResult<Vec<Component>>;

    async fn get_one(&self, category: PartCategory, id: i64) -> GatewayResult<Component>;

    async fn get_build(&self, build_id: BuildId) -> GatewayResult<BuildRecord>;

    /// Free-form verdict text for a pair of components
    async fn check_pair_compatibility(
        &self,
        left: ComponentRef,
        right: ComponentRef,
    ) -> GatewayResult<String>;

    /// Authoritative power draw of a persisted build, in watts
    async fn estimate_power(&self, build_id: BuildId) -> GatewayResult<f64>;

    async fn create_build(&self, payload: &BuildPayload) -> GatewayResult<BuildId>;

    async fn update_build(&self, build_id: BuildId, payload: &BuildPayload) -> GatewayResult<()>;

    async fn delete_build(&self, build_id: BuildId) -> GatewayResult<()>;

    async fn list_builds(&self) -> GatewayResult<Vec<SavedBuildSummary>>;
}
