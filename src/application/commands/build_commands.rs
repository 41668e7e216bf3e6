// src/application/commands/build_commands.rs
//
// Build Command Handlers
//
// RULES:
// - Accept plain arguments or DTOs
// - Call services
// - Return DTOs
// - Never contain business logic

use log::info;

use crate::application::error_handling::{ErrorResponse, ToErrorResponse};
use crate::application::{dto::*, state::AppState};
use crate::domain::{BuildId, PartCategory};
use crate::services::BuilderSession;

/// Load a saved build and wait for its compatibility report
pub async fn show_build(
    state: &AppState,
    build_id: BuildId,
) -> Result<BuildSheetDto, ErrorResponse> {
    let mut session = state.new_session();
    session.load_build(build_id).await.to_error_response()?;
    Ok(build_sheet(&session).await)
}

/// Create a build, or update `dto.build_id` when given
pub async fn save_build(
    state: &AppState,
    dto: SaveBuildDto,
) -> Result<SaveResultDto, ErrorResponse> {
    let mut session = state.new_session();

    if let Some(build_id) = dto.build_id {
        session.load_build(build_id).await.to_error_response()?;
    }
    session.set_name(dto.build_name);

    for (name, part_id) in &dto.parts {
        let category = PartCategory::parse(name).to_error_response()?;
        let component = session
            .gateway()
            .get_one(category, *part_id)
            .await
            .to_error_response()?;
        session.set_slot(component);
    }

    let outcome = session.save().await.to_error_response()?;
    info!("{}", outcome.message());
    Ok(SaveResultDto::from(outcome))
}

/// List saved builds
pub async fn list_saved_builds(state: &AppState) -> Result<Vec<SavedBuildDto>, ErrorResponse> {
    let builds = state
        .saved_builds_service
        .list()
        .await
        .to_error_response()?;

    let currency = state.config.currency();
    Ok(builds
        .into_iter()
        .map(|priced| SavedBuildDto::new(priced, &currency))
        .collect())
}

/// Delete a saved build
pub async fn delete_build(state: &AppState, build_id: BuildId) -> Result<(), ErrorResponse> {
    state
        .saved_builds_service
        .delete(build_id)
        .await
        .to_error_response()
}

pub(crate) async fn build_sheet(session: &BuilderSession) -> BuildSheetDto {
    let report = session.settled_report().await;
    BuildSheetDto::new(
        &session.snapshot(),
        &report,
        &session.power(),
        &session.settings().currency,
    )
}
