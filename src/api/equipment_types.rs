//! Equipment type API endpoints (read-only)

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, models::EquipmentTypeWithCount};

use super::AuthenticatedUser;

/// List equipment types with active equipment counts
#[utoipa::path(
    get,
    path = "/equipment-types",
    tag = "equipment-types",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Equipment type list", body = Vec<EquipmentTypeWithCount>)
    )
)]
pub async fn list_equipment_types(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<EquipmentTypeWithCount>>> {
    let types = state.services.equipment_types.list().await?;
    Ok(Json(types))
}

/// Get equipment type by ID
#[utoipa::path(
    get,
    path = "/equipment-types/{id}",
    tag = "equipment-types",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment type ID")),
    responses(
        (status = 200, description = "Equipment type details", body = EquipmentTypeWithCount),
        (status = 404, description = "Equipment type not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_equipment_type(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<EquipmentTypeWithCount>> {
    let equipment_type = state.services.equipment_types.get_by_id(id).await?;
    Ok(Json(equipment_type))
}
