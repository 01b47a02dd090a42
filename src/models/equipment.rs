//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Owning equipment type
    pub equipment_type_id: i32,
    /// Owning type name (present on joined queries)
    #[sqlx(default)]
    pub equipment_type_name: Option<String>,
    /// Serial number matching the owning type's mask
    pub serial_number: String,
    /// Free-text notes, HTML-escaped before storage
    pub notes: Option<String>,
    /// Soft-delete flag; deleted records are excluded from active queries
    #[serde(skip_serializing, default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create equipment request.
///
/// Accepts either a `serial_numbers` batch or a single `serial_number`.
/// `equipment_type` is accepted as a raw JSON value so that a malformed
/// reference can be reported in the validation report rather than rejected
/// during deserialization.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEquipment {
    /// Equipment type id
    #[schema(value_type = Option<i32>)]
    pub equipment_type: Option<serde_json::Value>,
    /// Serial numbers for bulk registration
    pub serial_numbers: Option<Vec<String>>,
    /// Single serial number (used when `serial_numbers` is absent)
    pub serial_number: Option<String>,
    pub notes: Option<String>,
}

/// Update equipment request. Absent fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    /// New equipment type id
    #[schema(value_type = Option<i32>)]
    pub equipment_type: Option<serde_json::Value>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
}

/// Field changes staged by the update path, applied in a single UPDATE.
#[derive(Debug, Clone, Default)]
pub struct EquipmentChanges {
    pub equipment_type_id: Option<i32>,
    pub serial_number: Option<String>,
    pub notes: Option<String>,
}

impl EquipmentChanges {
    pub fn is_empty(&self) -> bool {
        self.equipment_type_id.is_none()
            && self.serial_number.is_none()
            && self.notes.is_none()
    }
}

/// Query parameters for listing active equipment
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct EquipmentFilter {
    /// Restrict to one equipment type
    pub equipment_type: Option<i32>,
    /// Substring match on serial number, notes or type name
    pub search: Option<String>,
}
