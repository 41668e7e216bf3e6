// src/application/commands/part_commands.rs
//
// Part Chooser Command Handlers

use crate::application::error_handling::{ErrorResponse, ToErrorResponse};
use crate::application::{dto::*, state::AppState};
use crate::domain::{BuildId, PartCategory};
use crate::services::{BuilderSession, PartSelectionQuery};

fn listing(session: &BuilderSession, query: &PartSelectionQuery) -> ListingDto {
    ListingDto::new(
        query.category(),
        query.mode(),
        query.listing(),
        &session.settings().currency,
    )
}

/// One page of a category
pub async fn browse_parts(
    state: &AppState,
    category: &str,
    page: u32,
) -> Result<ListingDto, ErrorResponse> {
    let category = PartCategory::parse(category).to_error_response()?;
    let session = state.new_session();
    let mut query = session.open_part_chooser(category);

    query.refresh(session.gateway()).await;
    if let Some(request) = query.go_to_page(page) {
        let outcome = request.fetch(session.gateway()).await;
        query.apply(outcome);
    }

    Ok(listing(&session, &query))
}

/// Keyword search; prices in display currency, defaults to the full range
pub async fn search_parts(
    state: &AppState,
    category: &str,
    term: &str,
    min_price: Option<f64>,
    max_price: Option<f64>,
) -> Result<ListingDto, ErrorResponse> {
    let category = PartCategory::parse(category).to_error_response()?;
    let session = state.new_session();
    let mut query = session.open_part_chooser(category);

    let (default_min, default_max) = query.default_price_range();
    let request = query.search(
        term,
        min_price.unwrap_or(default_min),
        max_price.unwrap_or(default_max),
    );
    let outcome = request.fetch(session.gateway()).await;
    query.apply(outcome);

    Ok(listing(&session, &query))
}

/// Parts of `category` compatible with the rest of a saved build
pub async fn compatible_parts(
    state: &AppState,
    category: &str,
    build_id: BuildId,
) -> Result<ListingDto, ErrorResponse> {
    let category = PartCategory::parse(category).to_error_response()?;
    let mut session = state.new_session();
    session.load_build(build_id).await.to_error_response()?;

    let mut query = session.open_part_chooser(category);
    let request = query.set_compatibility_filter(true, &session.snapshot());
    let outcome = request.fetch(session.gateway()).await;
    query.apply(outcome);

    Ok(listing(&session, &query))
}
