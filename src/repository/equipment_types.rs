//! Equipment types repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::EquipmentTypeWithCount,
};

#[derive(Clone)]
pub struct EquipmentTypesRepository {
    pool: Pool<Postgres>,
}

impl EquipmentTypesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all equipment types with their active equipment counts
    pub async fn list_with_counts(&self) -> AppResult<Vec<EquipmentTypeWithCount>> {
        let rows = sqlx::query_as::<_, EquipmentTypeWithCount>(
            r#"
            SELECT t.id, t.name, t.serial_number_mask,
                   COUNT(e.id) FILTER (WHERE NOT e.is_deleted) AS equipment_count
            FROM equipment_types t
            LEFT JOIN equipment e ON e.equipment_type_id = t.id
            GROUP BY t.id, t.name, t.serial_number_mask
            ORDER BY t.id, t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get an equipment type with its active equipment count
    pub async fn get_with_count(&self, id: i32) -> AppResult<EquipmentTypeWithCount> {
        sqlx::query_as::<_, EquipmentTypeWithCount>(
            r#"
            SELECT t.id, t.name, t.serial_number_mask,
                   COUNT(e.id) FILTER (WHERE NOT e.is_deleted) AS equipment_count
            FROM equipment_types t
            LEFT JOIN equipment e ON e.equipment_type_id = t.id
            WHERE t.id = $1
            GROUP BY t.id, t.name, t.serial_number_mask
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment type {} not found", id)))
    }
}
