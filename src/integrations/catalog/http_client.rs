// src/integrations/catalog/http_client.rs
//
// Catalog HTTP Client
//
// ARCHITECTURE:
// - JSON client for the catalog service
// - Maps catalog rows → domain types (NO domain mutation)
// - Used through the CatalogGateway trait only
//
// CRITICAL RULES:
// - This is INFRASTRUCTURE, not DOMAIN
// - Non-success responses surface the service's `detail` text verbatim
// - A single undecodable row is skipped, never fails the whole listing

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client, RequestBuilder};
use serde_json::Value;

use crate::domain::{
    BuildId, BuildPayload, BuildRecord, Component, ComponentRef, DomainError, PartCategory,
    SavedBuildSummary, SlotIds,
};
use crate::error::{AppResult, GatewayError, GatewayResult};
use crate::integrations::catalog::gateway::{CatalogGateway, PagedListing};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Catalog API Client
pub struct HttpCatalogGateway {
    base_url: String,
    http_client: Client,
}

impl HttpCatalogGateway {
    /// Create a client for the catalog at `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // INTERNAL: Request Execution
    // ========================================================================

    /// Send a request and return its JSON body (Null when empty)
    async fn execute(&self, request: RequestBuilder) -> GatewayResult<Value> {
        let response = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(GatewayError::transport)?;

        let status = response.status();
        debug!("catalog {} {}", status.as_u16(), response.url());

        let bytes = response.bytes().await.map_err(GatewayError::transport)?;
        let body: Option<Value> = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        if !status.is_success() {
            let detail = body.as_ref().and_then(detail_text);
            return Err(GatewayError::with_status(status.as_u16(), detail));
        }

        match body {
            Some(value) => Ok(value),
            None if bytes.is_empty() => Ok(Value::Null),
            None => Err(GatewayError::new("Catalog returned a malformed response")),
        }
    }

    async fn get(&self, path: &str) -> GatewayResult<Value> {
        self.execute(self.http_client.get(self.url(path))).await
    }
}

/// Human-readable text from an error body
///
/// The catalog answers `{"detail": "..."}`; request validation failures
/// answer `{"detail": [{"msg": "..."}, ...]}`.
fn detail_text(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join(", "))
        }
        Value::String(_) | Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn take_field(body: &mut Value, name: &str) -> GatewayResult<Value> {
    match body.get_mut(name).map(Value::take) {
        Some(Value::Null) | None => Err(GatewayError::new(format!(
            "Catalog response is missing `{}`",
            name
        ))),
        Some(value) => Ok(value),
    }
}

fn decode_error(err: DomainError) -> GatewayError {
    GatewayError::new(err.to_string())
}

fn components(category: PartCategory, rows: Value) -> GatewayResult<Vec<Component>> {
    let rows = match rows {
        Value::Array(rows) => rows,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(GatewayError::new(format!(
                "Expected a list of {} rows, got {}",
                category, other
            )))
        }
    };

    Ok(rows
        .into_iter()
        .filter_map(|row| match Component::from_catalog_row(category, row) {
            Ok(component) => Some(component),
            Err(e) => {
                warn!("Skipping catalog row: {}", e);
                None
            }
        })
        .collect())
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl CatalogGateway for HttpCatalogGateway {
    async fn list_paged(
        &self,
        category: PartCategory,
        page: u32,
        page_size: u32,
    ) -> GatewayResult<PagedListing> {
        let request = self
            .http_client
            .get(self.url(&format!("/fetch/{}", category.table_name())))
            .query(&[("page", page), ("limit", page_size)]);

        let mut body = self.execute(request).await?;
        let total_pages = body
            .get("total_pages")
            .and_then(Value::as_u64)
            .map(|n| n.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(1);

        Ok(PagedListing {
            items: components(category, take_field(&mut body, "data")?)?,
            total_pages,
        })
    }

    async fn search(
        &self,
        category: PartCategory,
        term: &str,
        min_price: f64,
        max_price: f64,
    ) -> GatewayResult<Vec<Component>> {
        let request = self
            .http_client
            .get(self.url(&format!("/search/{}", category.table_name())))
            .query(&[
                ("keyword", term.to_string()),
                ("min_price", min_price.to_string()),
                ("max_price", max_price.to_string()),
            ]);

        let mut body = self.execute(request).await?;
        components(category, body.get_mut("search_results").map(Value::take).unwrap_or_default())
    }

    async fn list_compatible(
        &self,
        category: PartCategory,
        other_slots: &SlotIds,
    ) -> GatewayResult<Vec<Component>> {
        let request = self
            .http_client
            .post(self.url(&format!("/parts/compatible/{}", category.table_name())))
            .json(&other_slots.build_state());

        let mut body = self.execute(request).await?;
        components(category, body.get_mut("compatible_parts").map(Value::take).unwrap_or_default())
    }

    async fn list_psu_compatible(
        &self,
        gpu_id: i64,
        case_id: i64,
    ) -> GatewayResult<Vec<Component>> {
        let request = self
            .http_client
            .post(self.url("/psus/compatibility"))
            .query(&[("gpu_id", gpu_id), ("case_id", case_id)]);

        let mut body = self.execute(request).await?;
        components(
            PartCategory::Psu,
            body.get_mut("compatible_psus").map(Value::take).unwrap_or_default(),
        )
    }

    async fn get_one(&self, category: PartCategory, id: i64) -> GatewayResult<Component> {
        let mut body = self
            .get(&format!("/fetch/{}/{}", category.table_name(), id))
            .await?;
        Component::from_catalog_row(category, take_field(&mut body, "item")?).map_err(decode_error)
    }

    async fn get_build(&self, build_id: BuildId) -> GatewayResult<BuildRecord> {
        let mut body = self.get(&format!("/fetch/builds/{}", build_id)).await?;
        BuildRecord::from_catalog_row(take_field(&mut body, "item")?).map_err(decode_error)
    }

    async fn check_pair_compatibility(
        &self,
        left: ComponentRef,
        right: ComponentRef,
    ) -> GatewayResult<String> {
        let path = format!(
            "/compatibility/{}/{}/{}/{}",
            left.category.key(),
            left.id,
            right.category.key(),
            right.id
        );
        let mut body = self.get(&path).await?;

        Ok(match take_field(&mut body, "compatibility")? {
            Value::String(message) => message,
            other => other.to_string(),
        })
    }

    async fn estimate_power(&self, build_id: BuildId) -> GatewayResult<f64> {
        let mut body = self.get(&format!("/power/{}", build_id)).await?;
        let value = take_field(&mut body, "total_power_estimate")?;
        number(&value).ok_or_else(|| {
            GatewayError::new(format!("Power estimate is not a number: {}", value))
        })
    }

    async fn create_build(&self, payload: &BuildPayload) -> GatewayResult<BuildId> {
        let request = self.http_client.post(self.url("/builds")).json(payload);

        let mut body = self.execute(request).await?;
        let value = take_field(&mut body, "build_id")?;
        number(&value)
            .map(|id| id as BuildId)
            .ok_or_else(|| GatewayError::new(format!("Build id is not a number: {}", value)))
    }

    async fn update_build(&self, build_id: BuildId, payload: &BuildPayload) -> GatewayResult<()> {
        let request = self
            .http_client
            .put(self.url(&format!("/builds/{}", build_id)))
            .json(payload);

        self.execute(request).await.map(|_| ())
    }

    async fn delete_build(&self, build_id: BuildId) -> GatewayResult<()> {
        let request = self
            .http_client
            .delete(self.url(&format!("/builds/{}", build_id)));

        self.execute(request).await.map(|_| ())
    }

    async fn list_builds(&self) -> GatewayResult<Vec<SavedBuildSummary>> {
        let mut body = self.get("/builds/details/all").await?;
        let rows = match body.get_mut("builds").map(Value::take) {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        };

        Ok(rows
            .into_iter()
            .filter_map(|row| match SavedBuildSummary::from_catalog_row(row) {
                Ok(summary) => Some(summary),
                Err(e) => {
                    warn!("Skipping saved build: {}", e);
                    None
                }
            })
            .collect())
    }
}
