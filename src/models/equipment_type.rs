//! Equipment type model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Equipment type with its serial-number mask.
///
/// The mask is a fixed-length template; its length is the required serial
/// number length (see [`crate::mask`]).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentType {
    pub id: i32,
    pub name: String,
    pub serial_number_mask: String,
}

/// Equipment type together with its number of active equipment records
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentTypeWithCount {
    pub id: i32,
    pub name: String,
    pub serial_number_mask: String,
    pub equipment_count: i64,
}
