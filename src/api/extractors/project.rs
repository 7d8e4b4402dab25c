use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use crate::domain::models::project::Project;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// Resolves the `{project_id}` path segment to an existing project.
pub struct ProjectPath(pub Project);

impl FromRequestParts<Arc<AppState>> for ProjectPath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let params: Path<HashMap<String, String>> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Validation("Invalid path parameters".into()))?;

        let project_id = params.get("project_id")
            .ok_or(AppError::Validation("Missing project id".into()))?;

        state.project_repo.find_by_id(project_id).await?
            .map(ProjectPath)
            .ok_or(AppError::NotFound("Project not found".into()))
    }
}
