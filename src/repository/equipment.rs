//! Equipment repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::EquipmentStore;
use crate::{
    error::{AppError, AppResult, SerialNumberReport},
    models::{Equipment, EquipmentChanges, EquipmentFilter, EquipmentType},
};

/// Translate a unique-index violation on the active-serial index into the
/// same report shape the application-level pre-check produces. The index is
/// the safety net for registrations racing past the pre-check.
fn translate_unique_violation(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return AppError::SerialNumbers(SerialNumberReport::structural(
                "This serial number already exists for this equipment type",
            ));
        }
    }
    AppError::Database(e)
}

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EquipmentStore for EquipmentRepository {
    async fn type_by_id(&self, id: i32) -> AppResult<Option<EquipmentType>> {
        let row = sqlx::query_as::<_, EquipmentType>(
            "SELECT id, name, serial_number_mask FROM equipment_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn active_by_id(&self, id: i32) -> AppResult<Option<Equipment>> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT e.*, t.name AS equipment_type_name
            FROM equipment e
            JOIN equipment_types t ON t.id = e.equipment_type_id
            WHERE e.id = $1 AND NOT e.is_deleted
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn serial_in_use(
        &self,
        equipment_type_id: i32,
        serial_number: &str,
        exclude_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM equipment
                    WHERE equipment_type_id = $1 AND serial_number = $2
                      AND NOT is_deleted AND id != $3
                )
                "#,
            )
            .bind(equipment_type_id)
            .bind(serial_number)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM equipment
                    WHERE equipment_type_id = $1 AND serial_number = $2
                      AND NOT is_deleted
                )
                "#,
            )
            .bind(equipment_type_id)
            .bind(serial_number)
            .fetch_one(&self.pool)
            .await?
        };
        Ok(exists)
    }

    async fn create_batch<'a>(
        &self,
        equipment_type_id: i32,
        serial_numbers: &[String],
        notes: Option<&'a str>,
    ) -> AppResult<Vec<Equipment>> {
        let mut rows = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (equipment_type_id, serial_number, notes)
            SELECT $1::int4, sn, $3::varchar FROM UNNEST($2::varchar[]) AS sn
            RETURNING *
            "#,
        )
        .bind(equipment_type_id)
        .bind(serial_numbers)
        .bind(notes)
        .fetch_all(&self.pool)
        .await
        .map_err(translate_unique_violation)?;

        rows.sort_by_key(|e| e.id);
        Ok(rows)
    }

    async fn apply_update(&self, id: i32, changes: &EquipmentChanges) -> AppResult<Equipment> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(changes.equipment_type_id, "equipment_type_id");
        add_field!(changes.serial_number, "serial_number");
        add_field!(changes.notes, "notes");

        let _ = idx;
        let query = format!(
            "UPDATE equipment SET {} WHERE id = {} RETURNING *",
            sets.join(", "),
            id
        );

        let mut builder = sqlx::query_as::<_, Equipment>(&query).bind(now);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(changes.equipment_type_id);
        bind_field!(changes.serial_number);
        bind_field!(changes.notes);

        builder
            .fetch_optional(&self.pool)
            .await
            .map_err(translate_unique_violation)?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    async fn mark_deleted(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment SET is_deleted = TRUE, updated_at = $1
            WHERE id = $2 AND NOT is_deleted
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    async fn list_active(&self, filter: &EquipmentFilter) -> AppResult<Vec<Equipment>> {
        let rows = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT e.*, t.name AS equipment_type_name
            FROM equipment e
            JOIN equipment_types t ON t.id = e.equipment_type_id
            WHERE NOT e.is_deleted
              AND ($1::int4 IS NULL OR e.equipment_type_id = $1)
              AND ($2::varchar IS NULL
                   OR e.serial_number LIKE '%' || $2 || '%'
                   OR e.notes ILIKE '%' || $2 || '%'
                   OR t.name ILIKE '%' || $2 || '%')
            ORDER BY e.id, e.created_at
            "#,
        )
        .bind(filter.equipment_type)
        .bind(filter.search.as_deref())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
