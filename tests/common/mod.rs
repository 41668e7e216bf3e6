// tests/common/mod.rs
//
// In-memory catalog for scenario tests
//
// Lookups for a held PSU id wait until the test releases them, so responses
// can be made to arrive out of order.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use rigsmith::{
    BuildId, BuildPayload, BuildRecord, CatalogGateway, Component, ComponentRef, GatewayError,
    GatewayResult, PagedListing, PartCategory, SavedBuildSummary, SlotIds,
};

#[derive(Default)]
pub struct FakeCatalog {
    parts: Mutex<BTreeMap<(PartCategory, i64), Component>>,
    builds: Mutex<BTreeMap<BuildId, BuildPayload>>,
    held: Mutex<HashMap<i64, Arc<Notify>>>,
    pub answered: AtomicUsize,
    pub compatible_calls: Mutex<Vec<(PartCategory, SlotIds)>>,
    pub power_estimate: Mutex<Option<f64>>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            power_estimate: Mutex::new(Some(450.0)),
            ..Self::default()
        })
    }

    pub fn add(&self, component: Component) {
        self.parts
            .lock()
            .unwrap()
            .insert((component.category, component.id), component);
    }

    pub fn part(&self, category: PartCategory, id: i64) -> Component {
        self.parts.lock().unwrap()[&(category, id)].clone()
    }

    /// Make lookups involving PSU `psu_id` wait for `release`
    pub fn hold_psu(&self, psu_id: i64) {
        self.held
            .lock()
            .unwrap()
            .insert(psu_id, Arc::new(Notify::new()));
    }

    pub fn release_psu(&self, psu_id: i64) {
        if let Some(gate) = self.held.lock().unwrap().get(&psu_id) {
            gate.notify_one();
        }
    }

    pub fn stored_build(&self, build_id: BuildId) -> Option<BuildPayload> {
        self.builds.lock().unwrap().get(&build_id).cloned()
    }

    /// Wait until `count` compatibility lookups have answered
    pub async fn wait_for_answers(&self, count: usize) {
        for _ in 0..200 {
            if self.answered.load(Ordering::SeqCst) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("only {} lookups answered", self.answered.load(Ordering::SeqCst));
    }

    fn attribute(&self, part: ComponentRef, key: &str) -> Option<String> {
        let parts = self.parts.lock().unwrap();
        parts
            .get(&(part.category, part.id))
            .and_then(|c| c.attribute(key))
            .and_then(|v| v.as_str().map(str::to_string).or_else(|| Some(v.to_string())))
    }

    fn verdict(&self, left: ComponentRef, right: ComponentRef) -> String {
        match (left.category, right.category) {
            (PartCategory::Cpu, PartCategory::Motherboard) => {
                let cpu = self.attribute(left, "socket");
                let board = self.attribute(right, "socket");
                match (cpu, board) {
                    (Some(a), Some(b)) if a == b => {
                        format!("Compatible: both support socket {}", a)
                    }
                    _ => "Incompatible socket".to_string(),
                }
            }
            (PartCategory::Gpu, PartCategory::Psu) => {
                format!("PSU {} is adequate for this GPU", right.id)
            }
            _ => "Compatible".to_string(),
        }
    }
}

#[async_trait]
impl CatalogGateway for FakeCatalog {
    async fn list_paged(
        &self,
        category: PartCategory,
        page: u32,
        page_size: u32,
    ) -> GatewayResult<PagedListing> {
        let all: Vec<Component> = self
            .parts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.category == category)
            .cloned()
            .collect();
        let size = page_size.max(1) as usize;
        let total_pages = all.len().div_ceil(size) as u32;
        let items = all
            .into_iter()
            .skip((page.saturating_sub(1)) as usize * size)
            .take(size)
            .collect();
        Ok(PagedListing { items, total_pages })
    }

    async fn search(
        &self,
        category: PartCategory,
        term: &str,
        min_price: f64,
        max_price: f64,
    ) -> GatewayResult<Vec<Component>> {
        let term = term.to_lowercase();
        Ok(self
            .parts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.category == category)
            .filter(|c| c.name.to_lowercase().contains(&term))
            .filter(|c| c.price >= min_price && c.price <= max_price)
            .cloned()
            .collect())
    }

    async fn list_compatible(
        &self,
        category: PartCategory,
        other_slots: &SlotIds,
    ) -> GatewayResult<Vec<Component>> {
        self.compatible_calls
            .lock()
            .unwrap()
            .push((category, other_slots.clone()));
        Ok(Vec::new())
    }

    async fn list_psu_compatible(
        &self,
        _gpu_id: i64,
        _case_id: i64,
    ) -> GatewayResult<Vec<Component>> {
        Ok(self
            .parts
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.category == PartCategory::Psu)
            .cloned()
            .collect())
    }

    async fn get_one(&self, category: PartCategory, id: i64) -> GatewayResult<Component> {
        self.parts
            .lock()
            .unwrap()
            .get(&(category, id))
            .cloned()
            .ok_or_else(|| GatewayError::with_status(404, Some("Item not found".to_string())))
    }

    async fn get_build(&self, build_id: BuildId) -> GatewayResult<BuildRecord> {
        let payload = self
            .stored_build(build_id)
            .ok_or_else(|| GatewayError::with_status(404, Some("Build not found".to_string())))?;
        let part_ids = PartCategory::ALL
            .into_iter()
            .filter_map(|c| payload.part_id(c).map(|id| (c, id)))
            .collect();
        Ok(BuildRecord {
            build_id,
            build_name: payload.build_name,
            part_ids,
        })
    }

    async fn check_pair_compatibility(
        &self,
        left: ComponentRef,
        right: ComponentRef,
    ) -> GatewayResult<String> {
        let gate = if right.category == PartCategory::Psu {
            self.held.lock().unwrap().get(&right.id).cloned()
        } else {
            None
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let verdict = self.verdict(left, right);
        self.answered.fetch_add(1, Ordering::SeqCst);
        Ok(verdict)
    }

    async fn estimate_power(&self, _build_id: BuildId) -> GatewayResult<f64> {
        let estimate = *self.power_estimate.lock().unwrap();
        estimate.ok_or_else(|| GatewayError::with_status(500, None))
    }

    async fn create_build(&self, payload: &BuildPayload) -> GatewayResult<BuildId> {
        let mut builds = self.builds.lock().unwrap();
        let build_id = builds.keys().max().copied().unwrap_or(0) + 1;
        builds.insert(build_id, payload.clone());
        Ok(build_id)
    }

    async fn update_build(&self, build_id: BuildId, payload: &BuildPayload) -> GatewayResult<()> {
        let mut builds = self.builds.lock().unwrap();
        match builds.get_mut(&build_id) {
            Some(stored) => {
                *stored = payload.clone();
                Ok(())
            }
            None => Err(GatewayError::with_status(404, Some("Build not found".to_string()))),
        }
    }

    async fn delete_build(&self, build_id: BuildId) -> GatewayResult<()> {
        self.builds
            .lock()
            .unwrap()
            .remove(&build_id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::with_status(404, Some("Build not found".to_string())))
    }

    async fn list_builds(&self) -> GatewayResult<Vec<SavedBuildSummary>> {
        Ok(self
            .builds
            .lock()
            .unwrap()
            .iter()
            .map(|(id, payload)| SavedBuildSummary {
                build_id: *id,
                build_name: payload.build_name.clone(),
                total_power_estimate: None,
                details: serde_json::Map::new(),
            })
            .collect())
    }
}

pub fn cpu(id: i64, socket: &str, tdp: i64) -> Component {
    Component::new(PartCategory::Cpu, id, format!("CPU {}", id), 200.0)
        .with_attribute("socket", socket)
        .with_attribute("tdp", tdp)
}

pub fn motherboard(id: i64, socket: &str) -> Component {
    Component::new(PartCategory::Motherboard, id, format!("Board {}", id), 150.0)
        .with_attribute("socket", socket)
}

pub fn gpu(id: i64, tdp_w: i64) -> Component {
    Component::new(PartCategory::Gpu, id, format!("GPU {}", id), 500.0).with_attribute("tdp_w", tdp_w)
}

pub fn psu(id: i64, watt: i64) -> Component {
    Component::new(PartCategory::Psu, id, format!("PSU {}W", watt), 90.0).with_attribute("watt", watt)
}

pub fn case(id: i64) -> Component {
    Component::new(PartCategory::Case, id, format!("Case {}", id), 80.0)
}
