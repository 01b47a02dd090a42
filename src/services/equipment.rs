//! Equipment service: bulk registration, update and soft delete.
//!
//! Registration is all-or-nothing: every serial number in a batch is checked
//! for intra-batch duplicates, collisions with active records and mask
//! conformance, and the batch is inserted in a single statement only when no
//! item failed. Any failure aborts the whole batch with a per-item report.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, SerialNumberReport},
    mask,
    models::{Equipment, EquipmentChanges, EquipmentFilter, UpdateEquipment},
    repository::EquipmentStore,
};

const MSG_REQUIRED: &str = "Equipment type and serial numbers are required";
const MSG_TYPE_NOT_FOUND: &str = "Equipment type not found";
const MSG_NEW_TYPE_NOT_FOUND: &str = "New equipment type not found";
const MSG_INVALID_TYPE_REF: &str = "Invalid value for equipment_type, must be correct id(int)";
const MSG_DUPLICATE_IN_BATCH: &str = "Duplicate serial number in request";
const MSG_SERIAL_EXISTS: &str = "This serial number already exists for this equipment type";

/// Neutralize markup in free text before storage
fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Parse an equipment-type reference supplied as a raw JSON value.
/// Accepts an integer or a string holding one.
fn parse_type_ref(value: &serde_json::Value) -> Option<i32> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Clone)]
pub struct EquipmentService {
    store: Arc<dyn EquipmentStore>,
}

impl EquipmentService {
    pub fn new(store: Arc<dyn EquipmentStore>) -> Self {
        Self { store }
    }

    /// List active equipment
    pub async fn list(&self, filter: &EquipmentFilter) -> AppResult<Vec<Equipment>> {
        self.store.list_active(filter).await
    }

    /// Get an active equipment record by id
    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.store
            .active_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Register a batch of serial numbers for one equipment type.
    ///
    /// Steps, in order: structural checks (type reference present, batch
    /// non-empty, reference well-formed, type exists), intra-batch duplicate
    /// detection, then per-serial uniqueness and mask checks. Per-serial
    /// failures are accumulated into one report; if any item failed, nothing
    /// is persisted. On success the whole batch is inserted in a single
    /// statement and returned ordered by id.
    pub async fn register(
        &self,
        equipment_type: Option<&serde_json::Value>,
        serial_numbers: &[String],
        notes: Option<&str>,
    ) -> AppResult<Vec<Equipment>> {
        let type_ref = match equipment_type {
            Some(v) if !v.is_null() => v,
            _ => {
                return Err(AppError::SerialNumbers(SerialNumberReport::structural(
                    MSG_REQUIRED,
                )))
            }
        };
        if serial_numbers.is_empty() {
            return Err(AppError::SerialNumbers(SerialNumberReport::structural(
                MSG_REQUIRED,
            )));
        }

        let type_id = parse_type_ref(type_ref).ok_or_else(|| {
            AppError::SerialNumbers(SerialNumberReport::structural(MSG_INVALID_TYPE_REF))
        })?;
        let equipment_type = self.store.type_by_id(type_id).await?.ok_or_else(|| {
            AppError::SerialNumbers(SerialNumberReport::structural(MSG_TYPE_NOT_FOUND))
        })?;

        let notes = notes.map(escape_html);

        // Intra-batch duplicates abort before any per-serial processing,
        // one entry per distinct duplicated value.
        let mut report = SerialNumberReport::default();
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        let mut reported: HashSet<&str> = HashSet::new();
        for (i, sn) in serial_numbers.iter().enumerate() {
            match first_seen.get(sn.as_str()) {
                Some(&first) => {
                    if reported.insert(sn.as_str()) {
                        report.push(first, sn, vec![MSG_DUPLICATE_IN_BATCH.to_string()]);
                    }
                }
                None => {
                    first_seen.insert(sn.as_str(), i);
                }
            }
        }
        if !report.is_empty() {
            return Err(AppError::SerialNumbers(report));
        }

        for (i, sn) in serial_numbers.iter().enumerate() {
            if self
                .store
                .serial_in_use(equipment_type.id, sn, None)
                .await?
            {
                report.push(i, sn, vec![MSG_SERIAL_EXISTS.to_string()]);
                continue;
            }
            let errors = mask::evaluate(sn, &equipment_type.serial_number_mask)?;
            if !errors.is_empty() {
                report.push(i, sn, errors);
            }
        }
        if !report.is_empty() {
            return Err(AppError::SerialNumbers(report));
        }

        let created = self
            .store
            .create_batch(equipment_type.id, serial_numbers, notes.as_deref())
            .await?;
        tracing::info!(
            equipment_type_id = equipment_type.id,
            count = created.len(),
            "Registered equipment batch"
        );
        Ok(created)
    }

    /// Update an equipment record. Absent fields are left unchanged.
    ///
    /// The serial number is re-validated against the (possibly new) type's
    /// mask only when the serial number or the type changed; a notes-only
    /// update runs no validation. All staged changes are applied in one
    /// UPDATE, or nothing is persisted.
    pub async fn update(&self, id: i32, data: &UpdateEquipment) -> AppResult<Equipment> {
        let current = self.get_by_id(id).await?;

        let mut changes = EquipmentChanges::default();

        if let Some(ref notes) = data.notes {
            let escaped = escape_html(notes);
            if current.notes.as_deref() != Some(escaped.as_str()) {
                changes.notes = Some(escaped);
            }
        }

        let mut type_changed = false;
        let mut effective_type_id = current.equipment_type_id;
        if let Some(ref type_ref) = data.equipment_type {
            if !type_ref.is_null() {
                let new_id = parse_type_ref(type_ref).ok_or_else(|| {
                    AppError::SerialNumbers(SerialNumberReport::structural(MSG_INVALID_TYPE_REF))
                })?;
                if new_id != current.equipment_type_id {
                    type_changed = true;
                    effective_type_id = new_id;
                }
            }
        }

        let serial_number = data
            .serial_number
            .clone()
            .unwrap_or_else(|| current.serial_number.clone());
        let serial_changed = serial_number != current.serial_number;

        let mut sn_errors = Vec::new();
        if serial_changed || type_changed {
            let equipment_type =
                self.store.type_by_id(effective_type_id).await?.ok_or_else(|| {
                    AppError::SerialNumbers(SerialNumberReport::structural(
                        MSG_NEW_TYPE_NOT_FOUND,
                    ))
                })?;
            if type_changed {
                changes.equipment_type_id = Some(effective_type_id);
            }

            sn_errors = mask::evaluate(&serial_number, &equipment_type.serial_number_mask)?;
            if sn_errors.is_empty()
                && self
                    .store
                    .serial_in_use(effective_type_id, &serial_number, Some(id))
                    .await?
            {
                sn_errors.push(MSG_SERIAL_EXISTS.to_string());
            }
            changes.serial_number = Some(serial_number.clone());
        }

        if !sn_errors.is_empty() {
            let mut report = SerialNumberReport::default();
            report.push(0, &serial_number, sn_errors);
            return Err(AppError::SerialNumbers(report));
        }

        if changes.is_empty() {
            return Ok(current);
        }
        self.store.apply_update(id, &changes).await
    }

    /// Soft-delete an equipment record: flips the deletion flag and nothing
    /// else. The serial number becomes reusable since uniqueness checks only
    /// consider active records.
    pub async fn soft_delete(&self, id: i32) -> AppResult<Equipment> {
        let deleted = self.store.mark_deleted(id).await?;
        tracing::info!(equipment_id = id, "Soft-deleted equipment");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EquipmentType;
    use crate::repository::MockEquipmentStore;
    use chrono::Utc;
    use serde_json::json;

    fn laptop_type() -> EquipmentType {
        EquipmentType {
            id: 1,
            name: "Laptop".to_string(),
            serial_number_mask: "NNAA".to_string(),
        }
    }

    fn record(id: i32, serial: &str) -> Equipment {
        Equipment {
            id,
            equipment_type_id: 1,
            equipment_type_name: Some("Laptop".to_string()),
            serial_number: serial.to_string(),
            notes: None,
            is_deleted: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(store: MockEquipmentStore) -> EquipmentService {
        EquipmentService::new(Arc::new(store))
    }

    fn serials(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn report_of(err: AppError) -> SerialNumberReport {
        match err {
            AppError::SerialNumbers(report) => report,
            other => panic!("expected SerialNumbers, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_requires_type_and_serials() {
        let svc = service(MockEquipmentStore::new());

        let err = svc.register(None, &serials(&["12AB"]), None).await.unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors[0].index, 0);
        assert_eq!(report.serial_numbers_errors[0].error, vec![MSG_REQUIRED]);

        let err = svc.register(Some(&json!(1)), &[], None).await.unwrap_err();
        assert_eq!(report_of(err).serial_numbers_errors[0].error, vec![MSG_REQUIRED]);
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_type_reference() {
        let svc = service(MockEquipmentStore::new());
        let err = svc
            .register(Some(&json!("not-an-id")), &serials(&["12AB"]), None)
            .await
            .unwrap_err();
        assert_eq!(
            report_of(err).serial_numbers_errors[0].error,
            vec![MSG_INVALID_TYPE_REF]
        );
    }

    #[tokio::test]
    async fn test_register_accepts_numeric_string_reference() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_type_by_id()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Ok(Some(laptop_type())));
        store
            .expect_serial_in_use()
            .returning(|_, _, _| Ok(false));
        store
            .expect_create_batch()
            .times(1)
            .returning(|_, sns, _| {
                Ok(sns
                    .iter()
                    .enumerate()
                    .map(|(i, sn)| record(i as i32 + 1, sn))
                    .collect())
            });

        let svc = service(store);
        let created = svc
            .register(Some(&json!("1")), &serials(&["12AB"]), None)
            .await
            .unwrap();
        assert_eq!(created.len(), 1);
    }

    #[tokio::test]
    async fn test_register_unknown_type_is_a_structural_error() {
        let mut store = MockEquipmentStore::new();
        store.expect_type_by_id().returning(|_| Ok(None));

        let svc = service(store);
        let err = svc
            .register(Some(&json!(42)), &serials(&["12AB"]), None)
            .await
            .unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors.len(), 1);
        assert_eq!(report.serial_numbers_errors[0].index, 0);
        assert_eq!(report.serial_numbers_errors[0].serial_number, "");
        assert_eq!(report.serial_numbers_errors[0].error, vec![MSG_TYPE_NOT_FOUND]);
    }

    #[tokio::test]
    async fn test_register_duplicates_abort_before_any_check() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_type_by_id()
            .returning(|_| Ok(Some(laptop_type())));
        // No serial_in_use / create_batch expectations: the mock panics if
        // duplicate batches reach storage at all.

        let svc = service(store);
        let err = svc
            .register(Some(&json!(1)), &serials(&["12AB", "34CD", "12AB"]), None)
            .await
            .unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors.len(), 1);
        assert_eq!(report.serial_numbers_errors[0].serial_number, "12AB");
        assert_eq!(report.serial_numbers_errors[0].index, 0);
        assert_eq!(
            report.serial_numbers_errors[0].error,
            vec![MSG_DUPLICATE_IN_BATCH]
        );
    }

    #[tokio::test]
    async fn test_register_existing_active_serial_conflicts() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_type_by_id()
            .returning(|_| Ok(Some(laptop_type())));
        store
            .expect_serial_in_use()
            .withf(|type_id, sn, excl| *type_id == 1 && sn == "12AB" && excl.is_none())
            .times(1)
            .returning(|_, _, _| Ok(true));

        let svc = service(store);
        let err = svc
            .register(Some(&json!(1)), &serials(&["12AB"]), None)
            .await
            .unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors.len(), 1);
        assert_eq!(report.serial_numbers_errors[0].index, 0);
        assert_eq!(report.serial_numbers_errors[0].serial_number, "12AB");
        assert_eq!(report.serial_numbers_errors[0].error, vec![MSG_SERIAL_EXISTS]);
    }

    #[tokio::test]
    async fn test_register_one_invalid_item_aborts_whole_batch() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_type_by_id()
            .returning(|_| Ok(Some(laptop_type())));
        store
            .expect_serial_in_use()
            .times(4)
            .returning(|_, _, _| Ok(false));
        // create_batch must never be called: any failed item means nothing
        // is persisted.

        let svc = service(store);
        let err = svc
            .register(
                Some(&json!(1)),
                &serials(&["12AB", "34CD", "56EF", "12bb"]),
                None,
            )
            .await
            .unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors.len(), 1);
        assert_eq!(report.serial_numbers_errors[0].index, 3);
        assert_eq!(report.serial_numbers_errors[0].serial_number, "12bb");
        assert_eq!(
            report.serial_numbers_errors[0].error,
            vec![
                "Character at position 3 must be an uppercase letter",
                "Character at position 4 must be an uppercase letter",
            ]
        );
    }

    #[tokio::test]
    async fn test_register_success_inserts_batch_once_with_escaped_notes() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_type_by_id()
            .returning(|_| Ok(Some(laptop_type())));
        store
            .expect_serial_in_use()
            .times(2)
            .returning(|_, _, _| Ok(false));
        store
            .expect_create_batch()
            .withf(|type_id, sns, notes| {
                *type_id == 1
                    && sns == ["12AB".to_string(), "34CD".to_string()]
                    && *notes == Some("&lt;b&gt;rack 4&lt;/b&gt;")
            })
            .times(1)
            .returning(|_, sns, _| {
                Ok(sns
                    .iter()
                    .enumerate()
                    .map(|(i, sn)| record(i as i32 + 1, sn))
                    .collect())
            });

        let svc = service(store);
        let created = svc
            .register(
                Some(&json!(1)),
                &serials(&["12AB", "34CD"]),
                Some("<b>rack 4</b>"),
            )
            .await
            .unwrap();
        assert_eq!(created.len(), 2);
        assert!(created.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_register_invalid_mask_is_a_server_defect() {
        let mut store = MockEquipmentStore::new();
        store.expect_type_by_id().returning(|_| {
            Ok(Some(EquipmentType {
                id: 1,
                name: "Broken".to_string(),
                serial_number_mask: "NQ".to_string(),
            }))
        });
        store.expect_serial_in_use().returning(|_, _, _| Ok(false));

        let svc = service(store);
        let err = svc
            .register(Some(&json!(1)), &serials(&["12"]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidMask(_)));
    }

    #[tokio::test]
    async fn test_update_notes_only_skips_serial_validation() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_active_by_id()
            .withf(|id| *id == 7)
            .returning(|_| Ok(Some(record(7, "12AB"))));
        // No type_by_id / serial_in_use expectations: a notes-only update
        // must not re-run validation.
        store
            .expect_apply_update()
            .withf(|id, changes| {
                *id == 7
                    && changes.notes.as_deref() == Some("new notes")
                    && changes.serial_number.is_none()
                    && changes.equipment_type_id.is_none()
            })
            .times(1)
            .returning(|_, changes| {
                let mut updated = record(7, "12AB");
                updated.notes = changes.notes.clone();
                Ok(updated)
            });

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: None,
            serial_number: None,
            notes: Some("new notes".to_string()),
        };
        let updated = svc.update(7, &data).await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("new notes"));
    }

    #[tokio::test]
    async fn test_update_unchanged_fields_touch_nothing() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_active_by_id()
            .returning(|_| Ok(Some(record(7, "12AB"))));

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: Some(json!(1)), // same as current
            serial_number: Some("12AB".to_string()), // same as current
            notes: None,
        };
        let updated = svc.update(7, &data).await.unwrap();
        assert_eq!(updated.id, 7);
    }

    #[tokio::test]
    async fn test_update_changed_serial_is_validated() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_active_by_id()
            .returning(|_| Ok(Some(record(7, "12AB"))));
        store
            .expect_type_by_id()
            .withf(|id| *id == 1)
            .returning(|_| Ok(Some(laptop_type())));

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: None,
            serial_number: Some("bad".to_string()),
            notes: None,
        };
        let err = svc.update(7, &data).await.unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors[0].serial_number, "bad");
        assert_eq!(
            report.serial_numbers_errors[0].error,
            vec!["Serial number must be 4 characters long, current length: 3"]
        );
    }

    #[tokio::test]
    async fn test_update_changed_serial_checks_uniqueness_excluding_self() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_active_by_id()
            .returning(|_| Ok(Some(record(7, "12AB"))));
        store
            .expect_type_by_id()
            .returning(|_| Ok(Some(laptop_type())));
        store
            .expect_serial_in_use()
            .withf(|type_id, sn, excl| *type_id == 1 && sn == "34CD" && *excl == Some(7))
            .times(1)
            .returning(|_, _, _| Ok(true));

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: None,
            serial_number: Some("34CD".to_string()),
            notes: None,
        };
        let err = svc.update(7, &data).await.unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors[0].error, vec![MSG_SERIAL_EXISTS]);
    }

    #[tokio::test]
    async fn test_update_type_change_revalidates_unchanged_serial() {
        // New type has a different mask; the current serial no longer fits.
        let mut store = MockEquipmentStore::new();
        store
            .expect_active_by_id()
            .returning(|_| Ok(Some(record(7, "12AB"))));
        store
            .expect_type_by_id()
            .withf(|id| *id == 2)
            .returning(|_| {
                Ok(Some(EquipmentType {
                    id: 2,
                    name: "Scanner".to_string(),
                    serial_number_mask: "AANN".to_string(),
                }))
            });

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: Some(json!(2)),
            serial_number: None,
            notes: None,
        };
        let err = svc.update(7, &data).await.unwrap_err();
        let report = report_of(err);
        assert_eq!(report.serial_numbers_errors[0].serial_number, "12AB");
        assert_eq!(report.serial_numbers_errors[0].error.len(), 4);
    }

    #[tokio::test]
    async fn test_update_unknown_new_type() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_active_by_id()
            .returning(|_| Ok(Some(record(7, "12AB"))));
        store.expect_type_by_id().returning(|_| Ok(None));

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: Some(json!(99)),
            serial_number: None,
            notes: None,
        };
        let err = svc.update(7, &data).await.unwrap_err();
        assert_eq!(
            report_of(err).serial_numbers_errors[0].error,
            vec![MSG_NEW_TYPE_NOT_FOUND]
        );
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let mut store = MockEquipmentStore::new();
        store.expect_active_by_id().returning(|_| Ok(None));

        let svc = service(store);
        let data = UpdateEquipment {
            equipment_type: None,
            serial_number: None,
            notes: Some("x".to_string()),
        };
        let err = svc.update(7, &data).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_flips_flag_only() {
        let mut store = MockEquipmentStore::new();
        store
            .expect_mark_deleted()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|_| {
                let mut deleted = record(7, "12AB");
                deleted.is_deleted = true;
                Ok(deleted)
            });

        let svc = service(store);
        let deleted = svc.soft_delete(7).await.unwrap();
        assert!(deleted.is_deleted);
        assert_eq!(deleted.serial_number, "12AB");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'quotes'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;quotes&#x27;"
        );
        assert_eq!(escape_html("plain notes"), "plain notes");
    }

    #[test]
    fn test_parse_type_ref() {
        assert_eq!(parse_type_ref(&json!(3)), Some(3));
        assert_eq!(parse_type_ref(&json!("3")), Some(3));
        assert_eq!(parse_type_ref(&json!(" 3 ")), Some(3));
        assert_eq!(parse_type_ref(&json!("abc")), None);
        assert_eq!(parse_type_ref(&json!(3.5)), None);
        assert_eq!(parse_type_ref(&json!([3])), None);
        assert_eq!(parse_type_ref(&json!(i64::MAX)), None);
    }
}
