use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{required, required_text, CreatePackageRequest};
use crate::domain::models::package::{Package, PackageEffect, PackageType};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

pub async fn create_package(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let project_id = required_text(payload.project, "project")?;
    let name = required_text(payload.name, "name")?;
    let package_type = PackageType::try_from(required_text(payload.package_type, "package_type")?)?;
    let price = required(payload.price, "price")?;
    if price < 0 {
        return Err(AppError::Validation("Price cannot be negative".into()));
    }
    let effect = PackageEffect::new(package_type, payload.num_readings, payload.subscription_days)?;

    state.project_repo.find_by_id(&project_id).await?
        .ok_or(AppError::NotFound("Project not found".into()))?;

    let mut package = Package::new(project_id, name, price, effect);
    if let Some(active) = payload.is_active {
        package.is_active = active;
    }

    Ok((StatusCode::CREATED, Json(state.package_repo.create(&package).await?)))
}
