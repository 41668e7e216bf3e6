// src/services/part_selection.rs
//
// Part Selection Query
//
// Decides how the catalog is fetched while a slot's part is being chosen.
//
// CRITICAL RULES:
// - Exactly one mode is active; entering a mode drops the others' state
// - Every transition stamps a fresh token; only the latest token is applied
// - Turning the compatibility filter off always lands on Browsing page 1
// - The psu filter needs both a gpu and a case, otherwise no call is made

use log::{debug, warn};
use serde::Serialize;

use crate::domain::{
    BuildSnapshot, Component, CurrencyConverter, Generation, GenerationCounter, PartCategory,
    SlotIds,
};
use crate::integrations::CatalogGateway;

pub const LOAD_FAILED: &str = "Failed to load parts.";
pub const COMPATIBLE_LOAD_FAILED: &str = "Failed to load compatible parts.";
pub const COMPATIBLE_PSU_LOAD_FAILED: &str = "Failed to load compatible PSUs.";
pub const SEARCH_FAILED: &str = "Search failed.";

/// Active listing mode; prices are in display currency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum QueryMode {
    Browsing {
        page: u32,
        total_pages: u32,
    },
    Searching {
        term: String,
        min_price: f64,
        max_price: f64,
    },
    CompatibilityFiltered {
        other_slots: SlotIds,
    },
}

impl QueryMode {
    fn first_page() -> Self {
        QueryMode::Browsing {
            page: 1,
            total_pages: 1,
        }
    }
}

/// Gateway call a request resolves to
#[derive(Debug, Clone, PartialEq)]
enum ListingKind {
    Paged { page: u32, page_size: u32 },
    /// Prices already converted to base currency
    Search {
        term: String,
        min_price: f64,
        max_price: f64,
    },
    Compatible { other_slots: SlotIds },
    PsuCompatible { gpu_id: i64, case_id: i64 },
    /// The psu filter without a gpu and a case: empty, no call
    Nothing,
}

/// A listing fetch stamped with the token of the transition that issued it
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    token: Generation,
    category: PartCategory,
    kind: ListingKind,
}

/// Result of a fetch, waiting to be applied
#[derive(Debug, Clone, PartialEq)]
pub struct ListingOutcome {
    pub token: Generation,
    pub items: Vec<Component>,
    pub total_pages: Option<u32>,
    pub error: Option<String>,
}

/// What the chooser currently shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingState {
    pub items: Vec<Component>,
    pub error: Option<String>,
    pub loading: bool,
}

impl ListingRequest {
    pub fn token(&self) -> Generation {
        self.token
    }

    pub fn category(&self) -> PartCategory {
        self.category
    }

    /// True when fetching makes no gateway call
    pub fn is_local(&self) -> bool {
        self.kind == ListingKind::Nothing
    }

    pub async fn fetch(self, gateway: &dyn CatalogGateway) -> ListingOutcome {
        let category = self.category;
        debug!("Listing {} {:?} (token {})", category, self.kind, self.token);

        let (result, failure) = match self.kind {
            ListingKind::Paged { page, page_size } => (
                gateway
                    .list_paged(category, page, page_size)
                    .await
                    .map(|listing| (listing.items, Some(listing.total_pages))),
                LOAD_FAILED,
            ),
            ListingKind::Search {
                term,
                min_price,
                max_price,
            } => (
                gateway
                    .search(category, &term, min_price, max_price)
                    .await
                    .map(|items| (items, None)),
                SEARCH_FAILED,
            ),
            ListingKind::Compatible { other_slots } => (
                gateway
                    .list_compatible(category, &other_slots)
                    .await
                    .map(|items| (items, None)),
                COMPATIBLE_LOAD_FAILED,
            ),
            ListingKind::PsuCompatible { gpu_id, case_id } => (
                gateway
                    .list_psu_compatible(gpu_id, case_id)
                    .await
                    .map(|items| (items, None)),
                COMPATIBLE_PSU_LOAD_FAILED,
            ),
            ListingKind::Nothing => (Ok((Vec::new(), None)), LOAD_FAILED),
        };

        match result {
            Ok((items, total_pages)) => ListingOutcome {
                token: self.token,
                items,
                total_pages,
                error: None,
            },
            Err(e) => {
                warn!("{} listing failed: {}", category, e);
                ListingOutcome {
                    token: self.token,
                    items: Vec::new(),
                    total_pages: None,
                    error: Some(failure.to_string()),
                }
            }
        }
    }
}

/// Part chooser state for one category
pub struct PartSelectionQuery {
    category: PartCategory,
    mode: QueryMode,
    page_size: u32,
    currency: CurrencyConverter,
    default_max_price: f64,
    tokens: GenerationCounter,
    latest: Generation,
    listing: ListingState,
}

impl PartSelectionQuery {
    pub fn new(
        category: PartCategory,
        page_size: u32,
        currency: CurrencyConverter,
        default_max_price: f64,
    ) -> Self {
        Self {
            category,
            mode: QueryMode::first_page(),
            page_size: page_size.max(1),
            currency,
            default_max_price,
            tokens: GenerationCounter::new(),
            latest: Generation::ZERO,
            listing: ListingState::default(),
        }
    }

    pub fn category(&self) -> PartCategory {
        self.category
    }

    pub fn mode(&self) -> &QueryMode {
        &self.mode
    }

    pub fn listing(&self) -> &ListingState {
        &self.listing
    }

    /// Default search bounds in display currency
    pub fn default_price_range(&self) -> (f64, f64) {
        (0.0, self.default_max_price)
    }

    /// Request for the current mode, superseding anything in flight
    pub fn request(&mut self) -> ListingRequest {
        let kind = match &self.mode {
            QueryMode::Browsing { page, .. } => ListingKind::Paged {
                page: *page,
                page_size: self.page_size,
            },
            QueryMode::Searching {
                term,
                min_price,
                max_price,
            } => ListingKind::Search {
                term: term.clone(),
                min_price: self.currency.to_base(*min_price),
                max_price: self.currency.to_base(*max_price),
            },
            QueryMode::CompatibilityFiltered { other_slots } => {
                self.compatible_kind(other_slots)
            }
        };

        self.latest = self.tokens.next();
        self.listing.loading = true;
        self.listing.error = None;

        ListingRequest {
            token: self.latest,
            category: self.category,
            kind,
        }
    }

    fn compatible_kind(&self, other_slots: &SlotIds) -> ListingKind {
        if self.category != PartCategory::Psu {
            return ListingKind::Compatible {
                other_slots: other_slots.clone(),
            };
        }
        match (
            other_slots.get(PartCategory::Gpu),
            other_slots.get(PartCategory::Case),
        ) {
            (Some(gpu_id), Some(case_id)) => ListingKind::PsuCompatible { gpu_id, case_id },
            _ => ListingKind::Nothing,
        }
    }

    // ========================================================================
    // TRANSITIONS
    // ========================================================================

    pub fn next_page(&mut self) -> Option<ListingRequest> {
        match self.mode {
            QueryMode::Browsing { page, .. } => self.go_to_page(page.saturating_add(1)),
            _ => None,
        }
    }

    pub fn previous_page(&mut self) -> Option<ListingRequest> {
        match self.mode {
            QueryMode::Browsing { page, .. } => self.go_to_page(page.saturating_sub(1)),
            _ => None,
        }
    }

    /// Move to `page`, clamped to [1, total pages]
    ///
    /// Only meaningful while browsing; returns None when the page stays put.
    pub fn go_to_page(&mut self, page: u32) -> Option<ListingRequest> {
        let QueryMode::Browsing {
            page: current,
            total_pages,
        } = self.mode
        else {
            return None;
        };

        let target = page.clamp(1, total_pages.max(1));
        if target == current {
            return None;
        }

        self.mode = QueryMode::Browsing {
            page: target,
            total_pages,
        };
        Some(self.request())
    }

    /// Enter Searching; leaves the compatibility filter and pagination
    pub fn search(
        &mut self,
        term: impl Into<String>,
        min_price: f64,
        max_price: f64,
    ) -> ListingRequest {
        self.mode = QueryMode::Searching {
            term: term.into(),
            min_price,
            max_price,
        };
        self.request()
    }

    /// Toggle the compatibility filter
    ///
    /// On: filter against the snapshot's slots other than this category.
    /// Off: Browsing page 1, whatever the previous mode was.
    pub fn set_compatibility_filter(
        &mut self,
        enabled: bool,
        snapshot: &BuildSnapshot,
    ) -> ListingRequest {
        self.mode = if enabled {
            QueryMode::CompatibilityFiltered {
                other_slots: snapshot.slot_ids_except(self.category),
            }
        } else {
            QueryMode::first_page()
        };
        self.request()
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self.mode, QueryMode::CompatibilityFiltered { .. })
    }

    /// Re-capture the other slots when filtering; nothing otherwise
    pub fn on_build_changed(&mut self, snapshot: &BuildSnapshot) -> Option<ListingRequest> {
        if !self.is_filtered() {
            return None;
        }
        self.mode = QueryMode::CompatibilityFiltered {
            other_slots: snapshot.slot_ids_except(self.category),
        };
        Some(self.request())
    }

    /// Back to Browsing page 1 with default search fields
    pub fn clear(&mut self) -> ListingRequest {
        self.mode = QueryMode::first_page();
        self.request()
    }

    // ========================================================================
    // RESULTS
    // ========================================================================

    /// Store `outcome` if its token is the latest
    pub fn apply(&mut self, outcome: ListingOutcome) -> bool {
        if !outcome.token.is_current(self.latest) {
            debug!(
                "Discarding stale {} listing {} (latest {})",
                self.category, outcome.token, self.latest
            );
            return false;
        }

        if let (QueryMode::Browsing { total_pages, .. }, Some(reported)) =
            (&mut self.mode, outcome.total_pages)
        {
            *total_pages = reported.max(1);
        }

        self.listing = ListingState {
            items: outcome.items,
            error: outcome.error,
            loading: false,
        };
        true
    }

    /// Fetch the current mode and apply it
    pub async fn refresh(&mut self, gateway: &dyn CatalogGateway) -> bool {
        let outcome = self.request().fetch(gateway).await;
        self.apply(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildConfiguration;
    use crate::error::GatewayError;
    use crate::integrations::{MockCatalogGateway, PagedListing};
    use mockall::predicate::eq;

    fn query(category: PartCategory) -> PartSelectionQuery {
        PartSelectionQuery::new(category, 10, CurrencyConverter::default(), 999_999.0)
    }

    fn browsing_page(query: &PartSelectionQuery) -> u32 {
        match query.mode() {
            QueryMode::Browsing { page, .. } => *page,
            other => panic!("expected browsing, got {:?}", other),
        }
    }

    fn paged(total_pages: u32) -> PagedListing {
        PagedListing {
            items: vec![Component::new(PartCategory::Cpu, 1, "cpu", 100.0)],
            total_pages,
        }
    }

    #[tokio::test]
    async fn test_paging_is_clamped() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_paged().returning(|_, _, _| Ok(paged(5)));

        let mut q = query(PartCategory::Cpu);
        assert!(q.refresh(&mock).await);
        assert!(q.previous_page().is_none());

        for _ in 0..4 {
            let request = q.next_page().unwrap();
            let outcome = request.fetch(&mock).await;
            q.apply(outcome);
        }
        assert_eq!(browsing_page(&q), 5);
        assert!(q.next_page().is_none());

        assert!(q.go_to_page(99).is_none());
        assert!(q.go_to_page(0).is_some());
        assert_eq!(browsing_page(&q), 1);
    }

    #[tokio::test]
    async fn test_filter_off_returns_to_first_page() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_paged().returning(|_, _, _| Ok(paged(8)));
        mock.expect_list_compatible().returning(|_, _| Ok(Vec::new()));

        let mut q = query(PartCategory::Cpu);
        q.refresh(&mock).await;
        let outcome = q.go_to_page(5).unwrap().fetch(&mock).await;
        q.apply(outcome);
        assert_eq!(browsing_page(&q), 5);

        let snapshot = BuildConfiguration::default().snapshot();
        q.set_compatibility_filter(true, &snapshot);
        assert!(q.is_filtered());

        q.set_compatibility_filter(false, &snapshot);
        assert_eq!(browsing_page(&q), 1);
    }

    #[tokio::test]
    async fn test_search_leaves_filter_and_converts_prices() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_search()
            .withf(|category, term, min, max| {
                *category == PartCategory::Gpu
                    && term == "rtx"
                    && min.abs() < 1e-9
                    && (max - 100.0).abs() < 1e-9
            })
            .times(1)
            .returning(|_, _, _, _| Ok(Vec::new()));

        let mut q = query(PartCategory::Gpu);
        let snapshot = BuildConfiguration::default().snapshot();
        q.set_compatibility_filter(true, &snapshot);

        let request = q.search("rtx", 0.0, 8870.0);
        assert!(!q.is_filtered());

        let outcome = request.fetch(&mock).await;
        assert!(q.apply(outcome));
        assert!(q.listing().error.is_none());
    }

    #[tokio::test]
    async fn test_filter_excludes_chosen_slot() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_compatible()
            .times(1)
            .returning(|category, others| {
                assert_eq!(category, PartCategory::Cpu);
                assert!(!others.contains(PartCategory::Cpu));
                assert_eq!(others.get(PartCategory::Motherboard), Some(2));
                Ok(Vec::new())
            });

        let mut config = BuildConfiguration::default();
        config.set_slot(Component::new(PartCategory::Cpu, 1, "cpu", 1.0));
        config.set_slot(Component::new(PartCategory::Motherboard, 2, "mb", 1.0));

        let mut q = query(PartCategory::Cpu);
        let outcome = q
            .set_compatibility_filter(true, &config.snapshot())
            .fetch(&mock)
            .await;
        assert!(q.apply(outcome));
    }

    #[tokio::test]
    async fn test_psu_filter_needs_gpu_and_case() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_psu_compatible().never();
        mock.expect_list_compatible().never();

        let mut config = BuildConfiguration::default();
        config.set_slot(Component::new(PartCategory::Gpu, 3, "gpu", 1.0));

        let mut q = query(PartCategory::Psu);
        let request = q.set_compatibility_filter(true, &config.snapshot());
        assert!(request.is_local());

        let outcome = request.fetch(&mock).await;
        q.apply(outcome);
        assert!(q.listing().items.is_empty());
        assert!(q.listing().error.is_none());
    }

    #[tokio::test]
    async fn test_psu_filter_with_gpu_and_case() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_psu_compatible()
            .with(eq(3), eq(6))
            .times(1)
            .returning(|_, _| Ok(vec![Component::new(PartCategory::Psu, 9, "850W", 1.0)]));

        let mut config = BuildConfiguration::default();
        config.set_slot(Component::new(PartCategory::Gpu, 3, "gpu", 1.0));
        config.set_slot(Component::new(PartCategory::Case, 6, "case", 1.0));

        let mut q = query(PartCategory::Psu);
        q.set_compatibility_filter(true, &config.snapshot());
        assert!(q.refresh(&mock).await);
        assert_eq!(q.listing().items.len(), 1);
    }

    #[tokio::test]
    async fn test_last_mode_wins() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_paged().returning(|_, _, _| Ok(paged(3)));
        mock.expect_search()
            .returning(|_, _, _, _| Ok(vec![Component::new(PartCategory::Cpu, 7, "hit", 1.0)]));

        let mut q = query(PartCategory::Cpu);
        let browse = q.request();
        let search = q.search("5600", 0.0, 999_999.0);

        let search_outcome = search.fetch(&mock).await;
        let browse_outcome = browse.fetch(&mock).await;

        assert!(q.apply(search_outcome));
        assert!(!q.apply(browse_outcome));
        assert_eq!(q.listing().items[0].id, 7);
    }

    #[tokio::test]
    async fn test_failures_use_mode_specific_messages() {
        let mut mock = MockCatalogGateway::new();
        mock.expect_list_paged()
            .returning(|_, _, _| Err(GatewayError::with_status(500, None)));
        mock.expect_search()
            .returning(|_, _, _, _| Err(GatewayError::new("boom")));

        let mut q = query(PartCategory::Memory);
        q.refresh(&mock).await;
        assert_eq!(q.listing().error.as_deref(), Some("Failed to load parts."));

        let outcome = q.search("ddr5", 0.0, 1000.0).fetch(&mock).await;
        q.apply(outcome);
        assert_eq!(q.listing().error.as_deref(), Some("Search failed."));
        assert!(q.listing().items.is_empty());
    }

    #[test]
    fn test_build_change_only_matters_when_filtered() {
        let mut q = query(PartCategory::Cpu);
        let mut config = BuildConfiguration::default();
        assert!(q.on_build_changed(&config.snapshot()).is_none());

        q.set_compatibility_filter(true, &config.snapshot());
        config.set_slot(Component::new(PartCategory::Motherboard, 2, "mb", 1.0));
        assert!(q.on_build_changed(&config.snapshot()).is_some());

        match q.mode() {
            QueryMode::CompatibilityFiltered { other_slots } => {
                assert_eq!(other_slots.get(PartCategory::Motherboard), Some(2))
            }
            other => panic!("expected filter, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_total_pages_reported_as_one() {
        let mut q = query(PartCategory::Cpu);
        let request = q.request();
        q.apply(ListingOutcome {
            token: request.token(),
            items: Vec::new(),
            total_pages: Some(0),
            error: None,
        });
        assert_eq!(
            q.mode(),
            &QueryMode::Browsing {
                page: 1,
                total_pages: 1
            }
        );
    }
}
