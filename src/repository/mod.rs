//! Repository layer for database operations

pub mod equipment;
pub mod equipment_types;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Equipment, EquipmentChanges, EquipmentFilter, EquipmentType},
};

/// Storage operations the registration engine depends on.
///
/// The engine only ever talks to this interface; the application-level
/// existence checks it performs are an early diagnostic, while the partial
/// unique index on active rows remains the authoritative guard against
/// concurrent registrations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquipmentStore: Send + Sync {
    /// Look up an equipment type by id
    async fn type_by_id(&self, id: i32) -> AppResult<Option<EquipmentType>>;

    /// Look up an active (non-deleted) equipment record by id
    async fn active_by_id(&self, id: i32) -> AppResult<Option<Equipment>>;

    /// Whether a serial number is already used by an active record of the
    /// given type. Exact, case-sensitive match. `exclude_id` omits one record
    /// (the record being updated).
    async fn serial_in_use(
        &self,
        equipment_type_id: i32,
        serial_number: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool>;

    /// Insert a whole batch in one statement. Returns the created records
    /// ordered by id ascending.
    async fn create_batch<'a>(
        &self,
        equipment_type_id: i32,
        serial_numbers: &[String],
        notes: Option<&'a str>,
    ) -> AppResult<Vec<Equipment>>;

    /// Apply staged field changes in a single UPDATE
    async fn apply_update(&self, id: i32, changes: &EquipmentChanges) -> AppResult<Equipment>;

    /// Flip the soft-delete flag
    async fn mark_deleted(&self, id: i32) -> AppResult<Equipment>;

    /// List active equipment, optionally filtered
    async fn list_active(&self, filter: &EquipmentFilter) -> AppResult<Vec<Equipment>>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub equipment: equipment::EquipmentRepository,
    pub equipment_types: equipment_types::EquipmentTypesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            equipment_types: equipment_types::EquipmentTypesRepository::new(pool.clone()),
            pool,
        }
    }
}
