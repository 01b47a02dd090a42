//! Equipment type service

use crate::{
    error::AppResult,
    models::EquipmentTypeWithCount,
    repository::equipment_types::EquipmentTypesRepository,
};

#[derive(Clone)]
pub struct EquipmentTypeService {
    repository: EquipmentTypesRepository,
}

impl EquipmentTypeService {
    pub fn new(repository: EquipmentTypesRepository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<EquipmentTypeWithCount>> {
        self.repository.list_with_counts().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<EquipmentTypeWithCount> {
        self.repository.get_with_count(id).await
    }
}
