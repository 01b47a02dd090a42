//! Business logic services

pub mod equipment;
pub mod equipment_types;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub equipment: equipment::EquipmentService,
    pub equipment_types: equipment_types::EquipmentTypeService,
    /// Pool handle for readiness probes
    pub pool: Pool<Postgres>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            equipment: equipment::EquipmentService::new(Arc::new(repository.equipment.clone())),
            equipment_types: equipment_types::EquipmentTypeService::new(
                repository.equipment_types.clone(),
            ),
            pool: repository.pool,
        }
    }
}
