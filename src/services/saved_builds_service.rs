// src/services/saved_builds_service.rs
//
// Saved Builds - overview and deletion
//
// CRITICAL RULES:
// - The overview reports part names only; prices come from the category
//   listings, matched by exact name
// - A listing that fails to load leaves its parts unpriced, never fails the overview

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{info, warn};
use tokio::task::JoinSet;

use crate::domain::{BuildId, PartCategory, PricedBuildSummary, PricedPart, SavedBuildSummary};
use crate::error::AppResult;
use crate::events::{BuildDeleted, EventBus};
use crate::integrations::CatalogGateway;

/// Overview of persisted builds
pub struct SavedBuildsService {
    gateway: Arc<dyn CatalogGateway>,
    event_bus: Arc<EventBus>,
}

impl SavedBuildsService {
    pub fn new(gateway: Arc<dyn CatalogGateway>, event_bus: Arc<EventBus>) -> Self {
        Self { gateway, event_bus }
    }

    /// Saved builds with each part priced from its category listing
    pub async fn list(&self) -> AppResult<Vec<PricedBuildSummary>> {
        let summaries = self.gateway.list_builds().await?;

        let categories: BTreeSet<PartCategory> = summaries
            .iter()
            .flat_map(|summary| summary.part_names())
            .map(|(category, _)| category)
            .collect();
        let prices = self.price_lists(categories).await;

        Ok(summaries
            .into_iter()
            .map(|summary| price_summary(summary, &prices))
            .collect())
    }

    /// Name → base price per category, listings fetched concurrently
    async fn price_lists(
        &self,
        categories: BTreeSet<PartCategory>,
    ) -> BTreeMap<PartCategory, BTreeMap<String, f64>> {
        let mut fetches = JoinSet::new();
        for category in categories {
            let gateway = Arc::clone(&self.gateway);
            fetches.spawn(async move {
                let result = gateway.list_paged(category, 1, PRICE_LOOKUP_LIMIT).await;
                (category, result)
            });
        }

        let mut prices = BTreeMap::new();
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok((category, Ok(listing))) => {
                    let mut by_name = BTreeMap::new();
                    for component in listing.items {
                        by_name.entry(component.name).or_insert(component.price);
                    }
                    prices.insert(category, by_name);
                }
                Ok((category, Err(e))) => {
                    warn!("Failed to load {} prices: {}", category, e);
                }
                Err(e) => warn!("Price lookup task aborted: {}", e),
            }
        }
        prices
    }

    pub async fn delete(&self, build_id: BuildId) -> AppResult<()> {
        self.gateway.delete_build(build_id).await?;
        info!("Deleted build {}", build_id);
        self.event_bus.emit(BuildDeleted::new(build_id));
        Ok(())
    }
}

/// Rows read from each category listing when pricing saved builds
pub const PRICE_LOOKUP_LIMIT: u32 = 100;

fn price_summary(
    summary: SavedBuildSummary,
    prices: &BTreeMap<PartCategory, BTreeMap<String, f64>>,
) -> PricedBuildSummary {
    let parts = summary
        .part_names()
        .into_iter()
        .map(|(category, name)| {
            let price = prices
                .get(&category)
                .and_then(|by_name| by_name.get(&name))
                .copied();
            PricedPart {
                category,
                name,
                price,
            }
        })
        .collect();
    PricedBuildSummary { summary, parts }
}
