use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{required_text, CreateProjectRequest};
use crate::api::extractors::project::ProjectPath;
use crate::domain::models::project::{validate_telegram_token, Project, ProjectStatus};
use crate::error::AppError;
use crate::state::AppState;
use sqlx::types::Json as DbJson;
use std::sync::Arc;
use tracing::info;

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let name = required_text(payload.name, "name")?;
    let token = required_text(payload.telegram_token, "telegram_token")?;
    validate_telegram_token(&token)?;

    let mut project = Project::new(name, token);
    if let Some(design) = payload.design {
        project.design = DbJson(design);
    }
    if let Some(status) = payload.status {
        project.status = ProjectStatus::try_from(status)?;
    }

    let created = state.project_repo.create(&project).await?;
    info!("Project created: {} (bot {})", created.id, created.bot_identity());

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_projects(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.project_repo.list().await?))
}

pub async fn get_project(ProjectPath(project): ProjectPath) -> impl IntoResponse {
    Json(project)
}

pub async fn get_theme(ProjectPath(project): ProjectPath) -> impl IntoResponse {
    Json(project.design.0)
}

pub async fn list_spreads(
    State(state): State<Arc<AppState>>,
    ProjectPath(project): ProjectPath,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.spread_repo.list_by_project(&project.id).await?))
}

pub async fn list_packages(
    State(state): State<Arc<AppState>>,
    ProjectPath(project): ProjectPath,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.package_repo.list_active_by_project(&project.id).await?))
}
