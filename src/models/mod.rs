//! Data models for EquipTrack

pub mod equipment;
pub mod equipment_type;
pub mod user;

// Re-export commonly used types
pub use equipment::{CreateEquipment, Equipment, EquipmentChanges, EquipmentFilter, UpdateEquipment};
pub use equipment_type::{EquipmentType, EquipmentTypeWithCount};
pub use user::UserClaims;
