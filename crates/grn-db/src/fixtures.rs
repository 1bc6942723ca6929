//! Test fixtures shared by the repository and reconciler tests.

use chrono::Utc;
use grn_core::{
    CatalogItem, EntityType, Grn, GrnLineItem, GrnStatus, PaymentStatus, UidMetadata, UidRecord,
    UID_STATUS_AVAILABLE,
};
use uuid::Uuid;

use crate::pool::{Database, DbConfig};

pub const TENANT: &str = "tenant-1";

/// Fresh, migrated in-memory database.
pub async fn database() -> Database {
    Database::connect(DbConfig::in_memory()).await.unwrap()
}

pub fn catalog_item(code: &str, category: Option<&str>) -> CatalogItem {
    CatalogItem {
        id: Uuid::new_v4().to_string(),
        tenant_id: TENANT.to_string(),
        code: code.to_string(),
        name: format!("Item {code}"),
        category: category.map(str::to_string),
        created_at: Utc::now(),
    }
}

pub fn grn(number: &str, gross: i64, debit_note: i64, net_payable: i64, paid: Option<i64>) -> Grn {
    let now = Utc::now();
    Grn {
        id: Uuid::new_v4().to_string(),
        tenant_id: TENANT.to_string(),
        grn_number: number.to_string(),
        status: GrnStatus::Completed,
        gross_amount_cents: gross,
        debit_note_amount_cents: debit_note,
        net_payable_amount_cents: net_payable,
        paid_amount_cents: paid,
        payment_status: PaymentStatus::Unpaid,
        created_at: now,
        updated_at: now,
    }
}

pub fn line(grn_id: &str, item_code: &str, accepted_qty: i64, item_id: Option<&str>) -> GrnLineItem {
    GrnLineItem {
        id: Uuid::new_v4().to_string(),
        grn_id: grn_id.to_string(),
        item_code: item_code.to_string(),
        item_name: format!("Item {item_code}"),
        item_id: item_id.map(str::to_string),
        accepted_qty,
        rejected_qty: 0,
        rate_cents: 100,
        rejection_amount_cents: 0,
        batch_number: None,
    }
}

pub fn uid_record(grn_id: &str, uid: &str) -> UidRecord {
    UidRecord {
        id: Uuid::new_v4().to_string(),
        tenant_id: TENANT.to_string(),
        uid: uid.to_string(),
        entity_type: EntityType::RawMaterial,
        entity_id: None,
        grn_id: Some(grn_id.to_string()),
        batch_number: None,
        status: UID_STATUS_AVAILABLE.to_string(),
        location: "Warehouse".to_string(),
        lifecycle: Vec::new(),
        metadata: UidMetadata::default(),
        created_at: Utc::now(),
    }
}
