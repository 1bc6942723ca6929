//! # Reconciler
//!
//! Audits and repairs one GRN at a time.
//!
//! ## Run Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    reconcile("GRN-2025-11-001")                         │
//! │                                                                         │
//! │  1. REPAIR LINES (apply only)                                          │
//! │     BEGIN                                                              │
//! │       lines = SELECT ... FROM grn_items WHERE grn_id = ?               │
//! │       ids   = one batched catalog lookup for every NULL item_id        │
//! │       for each line:                                                   │
//! │         SAVEPOINT → UPDATE item_id → RELEASE   (Repaired)              │
//! │                   └─ error → ROLLBACK TO       (PersistenceFailed)     │
//! │         code not in catalog                    (NotFound, continue)    │
//! │     COMMIT                                                             │
//! │                                                                         │
//! │  2. GENERATE UIDS (only when the audit says Missing)                   │
//! │     BEGIN → accepted_qty inserts per line → COMMIT (all or nothing)    │
//! │                                                                         │
//! │  3. AUDIT UIDS (read-only)    Σ accepted_qty vs COUNT(uid_registry)    │
//! │                                                                         │
//! │  4. PAYMENT                   balance, status, debit-note cross-check  │
//! │     apply → write payment_status when the stored value disagrees       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step is idempotent: a second run over a repaired GRN changes
//! nothing.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use serde::Serialize;
use sqlx::{Acquire, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::UidSettings;
use crate::error::{DbError, DbResult};
use crate::repository::{catalog, grn as grns, uid as uids};
use grn_core::reconcile::{check_debit_note, reconcile_payment, DebitNoteCheck};
use grn_core::uid::{prefix, UidSequence};
use grn_core::validation::validate_grn_number;
use grn_core::{
    CatalogItem, EntityType, Grn, GrnLineItem, LifecycleEvent, PaymentReconciliation,
    PaymentStatus, UidAudit, UidAuditStatus, UidMetadata, UidRecord, UID_STATUS_AVAILABLE,
};

// =============================================================================
// Repair Report
// =============================================================================

/// What happened to one line during repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// The line already had a catalog reference; untouched.
    AlreadyLinked { item_id: String },
    /// The reference was filled in.
    Repaired { item_id: String },
    /// No catalog item carries the line's code.
    NotFound,
    /// The write was rejected; only this line was rolled back.
    PersistenceFailed { reason: String },
}

/// Outcome for one GRN line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRepair {
    pub line_id: String,
    pub item_code: String,
    #[serde(flatten)]
    pub outcome: RepairOutcome,
}

/// Result of [`Reconciler::repair_grn_items`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub grn_id: String,
    pub grn_number: String,
    pub lines: Vec<LineRepair>,
}

impl RepairReport {
    fn count(&self, pred: impl Fn(&RepairOutcome) -> bool) -> usize {
        self.lines.iter().filter(|l| pred(&l.outcome)).count()
    }

    /// Lines whose reference was filled in by this run.
    pub fn repaired(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::Repaired { .. }))
    }

    /// Lines whose code is not in the catalog.
    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::NotFound))
    }

    /// Lines whose write failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RepairOutcome::PersistenceFailed { .. }))
    }

    /// Every line ends up linked.
    pub fn is_clean(&self) -> bool {
        self.not_found() == 0 && self.failed() == 0
    }
}

// =============================================================================
// Payment Check
// =============================================================================

/// Result of [`Reconciler::reconcile_payment`] and
/// [`Reconciler::sync_payment_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentCheck {
    pub grn_id: String,

    /// `payment_status` as read from storage.
    pub stored_status: PaymentStatus,

    pub reconciliation: PaymentReconciliation,

    /// Stored status equals the derived one.
    pub status_matches: bool,

    pub debit_note: DebitNoteCheck,

    /// `payment_status` was rewritten by this run.
    pub status_updated: bool,
}

// =============================================================================
// UID Backfill Report
// =============================================================================

/// UIDs issued for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUids {
    pub line_id: String,
    pub item_code: String,
    pub entity_type: EntityType,
    pub count: i64,
    pub first_uid: String,
    pub last_uid: String,
}

/// A line left without UIDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line_id: String,
    pub item_code: String,
    pub reason: String,
}

/// Result of [`Reconciler::generate_missing_uids`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UidBackfillReport {
    pub grn_id: String,

    /// Audit status before generation. Anything but `Missing` means the
    /// run was a no-op.
    pub audit_status: UidAuditStatus,

    pub generated: Vec<GeneratedUids>,

    pub skipped: Vec<SkippedLine>,
}

impl UidBackfillReport {
    /// Total UIDs inserted.
    pub fn total_generated(&self) -> i64 {
        self.generated.iter().map(|g| g.count).sum()
    }
}

// =============================================================================
// Full Report
// =============================================================================

/// Which writes [`Reconciler::reconcile`] may perform.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Repair catalog references and correct the payment status.
    pub apply: bool,

    /// Generate UIDs for a GRN that has none.
    pub generate_uids: Option<UidSettings>,
}

impl ReconcileOptions {
    /// Audit and payment check only; writes nothing.
    pub fn read_only() -> Self {
        ReconcileOptions::default()
    }
}

/// Everything known about one GRN after a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrnReport {
    pub grn_id: String,
    pub grn_number: String,

    /// Item codes of lines still without a catalog reference.
    pub unlinked_lines: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid_backfill: Option<UidBackfillReport>,

    pub uid_audit: UidAudit,

    pub payment: PaymentCheck,
}

impl GrnReport {
    /// Anything left for a human to look at.
    pub fn needs_attention(&self) -> bool {
        let uids_ok = matches!(
            self.uid_audit.status,
            UidAuditStatus::Complete | UidAuditStatus::NothingAccepted
        );

        !self.unlinked_lines.is_empty()
            || !uids_ok
            || !(self.payment.status_matches || self.payment.status_updated)
            || !self.payment.reconciliation.net_payable_consistent
            || !self.payment.debit_note.consistent
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// GRN reconciliation service.
#[derive(Debug, Clone)]
pub struct Reconciler {
    pool: SqlitePool,
}

impl Reconciler {
    /// Creates a new Reconciler.
    pub fn new(pool: SqlitePool) -> Self {
        Reconciler { pool }
    }

    /// Runs the configured steps against the GRN with the given number.
    pub async fn reconcile(&self, grn_number: &str, options: &ReconcileOptions) -> DbResult<GrnReport> {
        let grn_number = validate_grn_number(grn_number)?;
        let grn = grns::get_by_number(&self.pool, &grn_number)
            .await?
            .ok_or_else(|| DbError::not_found("GRN", &grn_number))?;

        info!(
            grn_id = %grn.id,
            grn_number = %grn.grn_number,
            apply = options.apply,
            generate_uids = options.generate_uids.is_some(),
            "Reconciling GRN"
        );

        let repair = if options.apply {
            Some(self.repair_grn_items(&grn.id).await?)
        } else {
            None
        };

        let uid_backfill = match &options.generate_uids {
            Some(settings) => Some(self.generate_missing_uids(&grn.id, settings).await?),
            None => None,
        };

        let uid_audit = self.audit_uids(&grn.id).await?;

        let payment = if options.apply {
            self.sync_payment_status(&grn.id).await?
        } else {
            self.reconcile_payment(&grn.id).await?
        };

        let unlinked_lines = grns::list_items(&self.pool, &grn.id)
            .await?
            .into_iter()
            .filter(GrnLineItem::needs_repair)
            .map(|line| line.item_code)
            .collect();

        Ok(GrnReport {
            grn_id: grn.id,
            grn_number: grn.grn_number,
            unlinked_lines,
            repair,
            uid_backfill,
            uid_audit,
            payment,
        })
    }

    // =========================================================================
    // Line repair
    // =========================================================================

    /// Fills in missing catalog references on a GRN's lines.
    ///
    /// ## What This Does
    /// 1. Loads the lines inside one transaction
    /// 2. Resolves every unlinked code with one batched catalog query
    /// 3. Writes each reference inside its own savepoint
    ///
    /// A code missing from the catalog or a rejected write is recorded on
    /// that line and the remaining lines are still processed.
    ///
    /// ## Errors
    /// - [`DbError::NotFound`] if the GRN does not exist
    /// - [`DbError::PersistenceFailure`] if the transaction cannot commit
    pub async fn repair_grn_items(&self, grn_id: &str) -> DbResult<RepairReport> {
        let grn = self.require_grn(grn_id).await?;
        info!(grn_id = %grn.id, grn_number = %grn.grn_number, "Repairing GRN line references");

        let mut tx = self.pool.begin().await?;
        let lines = grns::list_items(&mut *tx, &grn.id).await?;

        let codes: Vec<String> = lines
            .iter()
            .filter(|line| line.needs_repair())
            .map(|line| line.item_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let known: HashMap<String, String> = catalog::fetch_by_codes(&mut *tx, &codes)
            .await?
            .into_iter()
            .map(|item| (item.code, item.id))
            .collect();

        let mut report = RepairReport {
            grn_id: grn.id.clone(),
            grn_number: grn.grn_number.clone(),
            lines: Vec::with_capacity(lines.len()),
        };

        for line in lines {
            let outcome = match (&line.item_id, known.get(&line.item_code)) {
                (Some(item_id), _) => RepairOutcome::AlreadyLinked {
                    item_id: item_id.clone(),
                },
                (None, None) => {
                    warn!(line_id = %line.id, item_code = %line.item_code, "No catalog item for code");
                    RepairOutcome::NotFound
                }
                (None, Some(item_id)) => match link_line(&mut tx, &line.id, item_id).await {
                    Ok(()) => {
                        debug!(line_id = %line.id, item_id = %item_id, "Line linked");
                        RepairOutcome::Repaired {
                            item_id: item_id.clone(),
                        }
                    }
                    Err(e) => {
                        warn!(line_id = %line.id, error = %e, "Line repair rolled back");
                        RepairOutcome::PersistenceFailed {
                            reason: e.to_string(),
                        }
                    }
                },
            };

            report.lines.push(LineRepair {
                line_id: line.id,
                item_code: line.item_code,
                outcome,
            });
        }

        tx.commit()
            .await
            .map_err(|e| DbError::persistence("grn", &grn.id, e))?;

        info!(
            grn_id = %grn.id,
            repaired = report.repaired(),
            not_found = report.not_found(),
            failed = report.failed(),
            "GRN repair finished"
        );

        Ok(report)
    }

    // =========================================================================
    // UID audit
    // =========================================================================

    /// Compares the GRN's accepted quantity with its UID count. Read-only.
    pub async fn audit_uids(&self, grn_id: &str) -> DbResult<UidAudit> {
        let grn = self.require_grn(grn_id).await?;
        self.audit_for(&grn).await
    }

    async fn audit_for(&self, grn: &Grn) -> DbResult<UidAudit> {
        let accepted = grns::accepted_total(&self.pool, &grn.id).await?;
        let count = uids::count_for_grn(&self.pool, &grn.id).await?;
        let audit = UidAudit::evaluate(grn.id.clone(), accepted, count);

        if audit.is_defect() {
            warn!(grn_number = %grn.grn_number, accepted, "GRN has accepted stock but no UIDs");
        } else {
            debug!(grn_number = %grn.grn_number, accepted, count, status = ?audit.status, "UID audit");
        }

        Ok(audit)
    }

    // =========================================================================
    // Payment
    // =========================================================================

    /// Recomputes balance and status from the stored amounts. Read-only.
    ///
    /// ## Errors
    /// [`DbError::InvalidAmount`] naming the GRN when a stored amount is
    /// negative or a line total overflows.
    pub async fn reconcile_payment(&self, grn_id: &str) -> DbResult<PaymentCheck> {
        let grn = self.require_grn(grn_id).await?;
        let lines = grns::list_items(&self.pool, &grn.id).await?;
        payment_check(&grn, &lines)
    }

    /// Like [`Reconciler::reconcile_payment`], then rewrites
    /// `payment_status` if it disagrees with the derived status.
    pub async fn sync_payment_status(&self, grn_id: &str) -> DbResult<PaymentCheck> {
        let mut check = self.reconcile_payment(grn_id).await?;

        if !check.status_matches {
            grns::update_payment_status(&self.pool, grn_id, check.reconciliation.status).await?;
            info!(
                grn_id = %grn_id,
                from = check.stored_status.as_str(),
                to = check.reconciliation.status.as_str(),
                "Payment status corrected"
            );
            check.status_updated = true;
        }

        Ok(check)
    }

    // =========================================================================
    // UID backfill
    // =========================================================================

    /// Issues one UID per accepted unit for a GRN that has none.
    ///
    /// Does nothing unless the audit status is `Missing`, so reruns are
    /// safe. Lines whose catalog item cannot be resolved (by `item_id`,
    /// then by code) are skipped and reported. All inserts share one
    /// transaction: any failed insert leaves the registry untouched.
    pub async fn generate_missing_uids(
        &self,
        grn_id: &str,
        settings: &UidSettings,
    ) -> DbResult<UidBackfillReport> {
        let grn = self.require_grn(grn_id).await?;
        let audit = self.audit_for(&grn).await?;

        let mut report = UidBackfillReport {
            grn_id: grn.id.clone(),
            audit_status: audit.status,
            generated: Vec::new(),
            skipped: Vec::new(),
        };

        if !audit.is_defect() {
            info!(grn_number = %grn.grn_number, status = ?audit.status, "No UID generation needed");
            return Ok(report);
        }

        info!(
            grn_number = %grn.grn_number,
            expected = audit.accepted_total,
            tenant = %settings.tenant_code,
            plant = %settings.plant_code,
            "Generating missing UIDs"
        );

        let mut tx = self.pool.begin().await?;

        let lines: Vec<GrnLineItem> = grns::list_items(&mut *tx, &grn.id)
            .await?
            .into_iter()
            .filter(|line| line.accepted_qty > 0)
            .collect();

        let ids: Vec<String> = lines
            .iter()
            .filter_map(|line| line.item_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let codes: Vec<String> = lines
            .iter()
            .map(|line| line.item_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let by_id: HashMap<String, CatalogItem> = catalog::fetch_by_ids(&mut *tx, &ids)
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();
        let by_code: HashMap<String, CatalogItem> = catalog::fetch_by_codes(&mut *tx, &codes)
            .await?
            .into_iter()
            .map(|item| (item.code.clone(), item))
            .collect();

        let now = Utc::now();
        let mut sequences: HashMap<EntityType, UidSequence> = HashMap::new();

        for line in &lines {
            let item = line
                .item_id
                .as_ref()
                .and_then(|id| by_id.get(id))
                .or_else(|| by_code.get(&line.item_code));

            let Some(item) = item else {
                warn!(line_id = %line.id, item_code = %line.item_code, "Skipping line without catalog item");
                report.skipped.push(SkippedLine {
                    line_id: line.id.clone(),
                    item_code: line.item_code.clone(),
                    reason: "no catalog item for line".to_string(),
                });
                continue;
            };

            let entity_type = item.entity_type();
            let sequence = match sequences.entry(entity_type) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let uid_prefix = prefix(&settings.tenant_code, &settings.plant_code, entity_type);
                    let last = uids::last_sequence(&mut *tx, &uid_prefix).await?;
                    entry.insert(UidSequence::after(
                        settings.tenant_code.as_str(),
                        settings.plant_code.as_str(),
                        entity_type,
                        last,
                    ))
                }
            };

            let mut first_uid = None;
            let mut last_uid = String::new();

            for _ in 0..line.accepted_qty {
                let code = sequence.next_code().ok_or_else(|| DbError::UidSequence {
                    prefix: sequence.prefix(),
                    reason: "sequence numbers exhausted".to_string(),
                })?;
                let record = UidRecord {
                    id: Uuid::new_v4().to_string(),
                    tenant_id: grn.tenant_id.clone(),
                    uid: code.clone(),
                    entity_type,
                    entity_id: Some(item.id.clone()),
                    grn_id: Some(grn.id.clone()),
                    batch_number: line.batch_number.clone(),
                    status: UID_STATUS_AVAILABLE.to_string(),
                    location: settings.location.clone(),
                    lifecycle: vec![LifecycleEvent::received(&settings.location, &grn.grn_number, now)],
                    metadata: UidMetadata {
                        item_code: Some(line.item_code.clone()),
                        item_name: Some(line.item_name.clone()),
                        grn_item_id: Some(line.id.clone()),
                    },
                    created_at: now,
                };

                uids::insert(&mut *tx, &record)
                    .await
                    .map_err(|e| DbError::persistence("uid_registry", &code, e))?;

                first_uid.get_or_insert_with(|| code.clone());
                last_uid = code;
            }

            debug!(
                line_id = %line.id,
                count = line.accepted_qty,
                first = first_uid.as_deref().unwrap_or_default(),
                last = %last_uid,
                "UIDs issued for line"
            );

            report.generated.push(GeneratedUids {
                line_id: line.id.clone(),
                item_code: line.item_code.clone(),
                entity_type,
                count: line.accepted_qty,
                first_uid: first_uid.unwrap_or_default(),
                last_uid,
            });
        }

        tx.commit()
            .await
            .map_err(|e| DbError::persistence("grn", &grn.id, e))?;

        info!(
            grn_number = %grn.grn_number,
            generated = report.total_generated(),
            skipped = report.skipped.len(),
            "UID generation finished"
        );

        Ok(report)
    }

    async fn require_grn(&self, grn_id: &str) -> DbResult<Grn> {
        grns::get_by_id(&self.pool, grn_id)
            .await?
            .ok_or_else(|| DbError::not_found("GRN", grn_id))
    }
}

/// Writes one line's reference inside a savepoint of `tx`.
async fn link_line(tx: &mut Transaction<'_, Sqlite>, line_id: &str, item_id: &str) -> DbResult<()> {
    let mut savepoint = tx.begin().await?;

    match grns::set_item_catalog_ref(&mut *savepoint, line_id, item_id).await {
        Ok(true) => {
            savepoint.commit().await?;
            Ok(())
        }
        Ok(false) => {
            savepoint.rollback().await?;
            Err(DbError::persistence("grn_item", line_id, "no row updated"))
        }
        Err(e) => {
            savepoint.rollback().await?;
            Err(DbError::persistence("grn_item", line_id, e))
        }
    }
}

fn payment_check(grn: &Grn, lines: &[GrnLineItem]) -> DbResult<PaymentCheck> {
    let reconciliation = reconcile_payment(&grn.payment_figures())
        .map_err(|e| DbError::invalid_amount(&grn.id, e))?;
    let debit_note =
        check_debit_note(grn.debit_note(), lines).map_err(|e| DbError::invalid_amount(&grn.id, e))?;

    if !reconciliation.net_payable_consistent {
        warn!(
            grn_number = %grn.grn_number,
            stored = %grn.net_payable(),
            expected = %reconciliation.expected_net_payable,
            "Net payable disagrees with gross minus debit note"
        );
    }

    Ok(PaymentCheck {
        grn_id: grn.id.clone(),
        stored_status: grn.payment_status,
        status_matches: grn.payment_status == reconciliation.status,
        reconciliation,
        debit_note,
        status_updated: false,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::pool::Database;
    use grn_core::Money;

    /// GRN with three unlinked lines: two known codes, one unknown.
    async fn seeded(db: &Database) -> (Grn, Vec<GrnLineItem>) {
        db.catalog()
            .insert(&fixtures::catalog_item("RM-CU-001", Some("RAW MATERIAL")))
            .await
            .unwrap();
        db.catalog()
            .insert(&fixtures::catalog_item("CP-PCB-010", Some("COMPONENT - PCB")))
            .await
            .unwrap();

        let grn = fixtures::grn("GRN-2025-11-001", 100_000, 10_000, 90_000, Some(90_000));
        db.grns().insert(&grn).await.unwrap();

        let lines = vec![
            fixtures::line(&grn.id, "RM-CU-001", 3, None),
            fixtures::line(&grn.id, "GHOST-999", 1, None),
            fixtures::line(&grn.id, "CP-PCB-010", 2, None),
        ];
        for line in &lines {
            db.grns().insert_item(line).await.unwrap();
        }
        (grn, lines)
    }

    fn settings() -> UidSettings {
        UidSettings::default()
    }

    #[tokio::test]
    async fn test_repair_links_known_codes_and_reports_misses() {
        let db = fixtures::database().await;
        let (grn, lines) = seeded(&db).await;

        let report = db.reconciler().repair_grn_items(&grn.id).await.unwrap();

        assert_eq!(report.lines.len(), 3);
        assert_eq!(report.repaired(), 2);
        assert_eq!(report.not_found(), 1);
        assert!(!report.is_clean());
        assert_eq!(report.lines[1].item_code, "GHOST-999");
        assert_eq!(report.lines[1].outcome, RepairOutcome::NotFound);

        let rm_id = db.catalog().find_id_by_code("RM-CU-001").await.unwrap();
        let stored = db.grns().list_items(&grn.id).await.unwrap();
        assert_eq!(stored[0].item_id, rm_id);
        assert!(stored[1].item_id.is_none());
        assert!(stored[2].item_id.is_some());
        assert_eq!(stored[0].id, lines[0].id);
    }

    #[tokio::test]
    async fn test_repair_is_idempotent() {
        let db = fixtures::database().await;
        let (grn, _) = seeded(&db).await;

        db.reconciler().repair_grn_items(&grn.id).await.unwrap();
        let before = db.grns().list_items(&grn.id).await.unwrap();

        let second = db.reconciler().repair_grn_items(&grn.id).await.unwrap();
        assert_eq!(second.repaired(), 0);
        assert_eq!(second.not_found(), 1);
        assert!(matches!(
            second.lines[0].outcome,
            RepairOutcome::AlreadyLinked { .. }
        ));

        let after = db.grns().list_items(&grn.id).await.unwrap();
        let ids = |lines: &[GrnLineItem]| lines.iter().map(|l| l.item_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&before), ids(&after));
    }

    #[tokio::test]
    async fn test_failed_write_only_rolls_back_that_line() {
        let db = fixtures::database().await;
        let (grn, _) = seeded(&db).await;

        sqlx::query(
            r#"
            CREATE TRIGGER lock_pcb_lines BEFORE UPDATE OF item_id ON grn_items
            WHEN NEW.item_code = 'CP-PCB-010'
            BEGIN
                SELECT RAISE(ABORT, 'line is locked');
            END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let report = db.reconciler().repair_grn_items(&grn.id).await.unwrap();

        assert_eq!(report.repaired(), 1);
        assert_eq!(report.failed(), 1);
        match &report.lines[2].outcome {
            RepairOutcome::PersistenceFailed { reason } => assert!(reason.contains("line is locked")),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let stored = db.grns().list_items(&grn.id).await.unwrap();
        assert!(stored[0].item_id.is_some());
        assert!(stored[2].item_id.is_none());
    }

    #[tokio::test]
    async fn test_repair_unknown_grn_is_not_found() {
        let db = fixtures::database().await;
        let err = db.reconciler().repair_grn_items("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_audit_flags_grn_without_uids() {
        let db = fixtures::database().await;
        let (grn, _) = seeded(&db).await;

        let audit = db.reconciler().audit_uids(&grn.id).await.unwrap();
        assert_eq!(audit.accepted_total, 6);
        assert_eq!(audit.uid_count, 0);
        assert!(audit.is_defect());

        // Read-only: nothing was written.
        assert_eq!(db.uids().count_for_grn(&grn.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_generate_missing_uids() {
        let db = fixtures::database().await;
        let (grn, lines) = seeded(&db).await;

        let report = db
            .reconciler()
            .generate_missing_uids(&grn.id, &settings())
            .await
            .unwrap();

        assert_eq!(report.audit_status, UidAuditStatus::Missing);
        assert_eq!(report.total_generated(), 5);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].item_code, "GHOST-999");

        let rm = &report.generated[0];
        assert_eq!(rm.entity_type, EntityType::RawMaterial);
        assert_eq!(rm.first_uid, "UID-SAIF-KOL-RM-000001-9T");
        assert!(rm.last_uid.starts_with("UID-SAIF-KOL-RM-000003-"));
        assert_eq!(report.generated[1].entity_type, EntityType::Component);

        let records = db.uids().list_for_grn(&grn.id).await.unwrap();
        assert_eq!(records.len(), 5);
        let first = records
            .iter()
            .find(|r| r.uid == "UID-SAIF-KOL-RM-000001-9T")
            .unwrap();
        assert_eq!(first.status, UID_STATUS_AVAILABLE);
        assert_eq!(first.lifecycle.len(), 1);
        assert_eq!(first.lifecycle[0].stage, "RECEIVED");
        assert_eq!(first.lifecycle[0].reference, "GRN-2025-11-001");
        assert_eq!(first.lifecycle[0].location, "Warehouse");
        assert_eq!(first.metadata.grn_item_id.as_deref(), Some(lines[0].id.as_str()));
        assert_eq!(first.metadata.item_code.as_deref(), Some("RM-CU-001"));

        let audit = db.reconciler().audit_uids(&grn.id).await.unwrap();
        assert_eq!(audit.status, UidAuditStatus::Short);
    }

    #[tokio::test]
    async fn test_generate_missing_uids_is_idempotent() {
        let db = fixtures::database().await;
        let (grn, _) = seeded(&db).await;

        db.reconciler()
            .generate_missing_uids(&grn.id, &settings())
            .await
            .unwrap();
        let second = db
            .reconciler()
            .generate_missing_uids(&grn.id, &settings())
            .await
            .unwrap();

        assert_ne!(second.audit_status, UidAuditStatus::Missing);
        assert_eq!(second.total_generated(), 0);
        assert_eq!(db.uids().count_for_grn(&grn.id).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_uid_sequence_continues_across_grns() {
        let db = fixtures::database().await;
        let item = fixtures::catalog_item("RM-1", None);
        db.catalog().insert(&item).await.unwrap();

        let first = fixtures::grn("GRN-2025-11-001", 0, 0, 0, None);
        let second = fixtures::grn("GRN-2025-11-002", 0, 0, 0, None);
        for grn in [&first, &second] {
            db.grns().insert(grn).await.unwrap();
            db.grns()
                .insert_item(&fixtures::line(&grn.id, "RM-1", 2, Some(&item.id)))
                .await
                .unwrap();
        }

        db.reconciler()
            .generate_missing_uids(&first.id, &settings())
            .await
            .unwrap();
        let report = db
            .reconciler()
            .generate_missing_uids(&second.id, &settings())
            .await
            .unwrap();

        assert!(report.generated[0].first_uid.starts_with("UID-SAIF-KOL-RM-000003-"));
        assert!(report.generated[0].last_uid.starts_with("UID-SAIF-KOL-RM-000004-"));
    }

    #[tokio::test]
    async fn test_uid_sequence_continues_past_999999() {
        let db = fixtures::database().await;
        let item = fixtures::catalog_item("RM-1", None);
        db.catalog().insert(&item).await.unwrap();

        let older = fixtures::grn("GRN-2025-10-001", 0, 0, 0, None);
        db.grns().insert(&older).await.unwrap();
        let mut issued = UidSequence::after("SAIF", "KOL", EntityType::RawMaterial, 999_998);
        for _ in 0..2 {
            let code = issued.next_code().unwrap();
            db.uids()
                .insert(&fixtures::uid_record(&older.id, &code))
                .await
                .unwrap();
        }

        let grn = fixtures::grn("GRN-2025-11-001", 0, 0, 0, None);
        db.grns().insert(&grn).await.unwrap();
        db.grns()
            .insert_item(&fixtures::line(&grn.id, "RM-1", 2, Some(&item.id)))
            .await
            .unwrap();

        let report = db
            .reconciler()
            .generate_missing_uids(&grn.id, &settings())
            .await
            .unwrap();

        assert_eq!(report.total_generated(), 2);
        assert!(report.generated[0].first_uid.starts_with("UID-SAIF-KOL-RM-1000001-"));
        assert!(report.generated[0].last_uid.starts_with("UID-SAIF-KOL-RM-1000002-"));
        assert_eq!(db.uids().count_for_grn(&grn.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_payment_check_and_sync() {
        let db = fixtures::database().await;
        let (grn, _) = seeded(&db).await;

        // Fully paid but stored as UNPAID.
        let check = db.reconciler().reconcile_payment(&grn.id).await.unwrap();
        assert!(check.reconciliation.balance.is_zero());
        assert!(check.reconciliation.should_be_paid);
        assert_eq!(check.reconciliation.status, PaymentStatus::Paid);
        assert!(!check.status_matches);
        assert!(!check.status_updated);

        let synced = db.reconciler().sync_payment_status(&grn.id).await.unwrap();
        assert!(synced.status_updated);
        let stored = db.grns().get_by_id(&grn.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Paid);

        let again = db.reconciler().sync_payment_status(&grn.id).await.unwrap();
        assert!(again.status_matches);
        assert!(!again.status_updated);
    }

    #[tokio::test]
    async fn test_partial_payment_balance() {
        let db = fixtures::database().await;
        let grn = fixtures::grn("GRN-2025-11-009", 100_000, 10_000, 90_000, None);
        db.grns().insert(&grn).await.unwrap();
        db.grns()
            .record_payment(&grn.id, Money::from_cents(50_000))
            .await
            .unwrap();

        let check = db.reconciler().sync_payment_status(&grn.id).await.unwrap();
        assert_eq!(check.reconciliation.balance.cents(), 40_000);
        assert!(!check.reconciliation.should_be_paid);
        assert_eq!(check.reconciliation.status, PaymentStatus::Partial);
        assert!(check.status_updated);
    }

    #[tokio::test]
    async fn test_negative_stored_amount_is_invalid_amount() {
        let db = fixtures::database().await;
        let grn = fixtures::grn("GRN-2025-11-010", 100_000, 0, 100_000, Some(-500));
        db.grns().insert(&grn).await.unwrap();

        let err = db.reconciler().reconcile_payment(&grn.id).await.unwrap_err();
        match err {
            DbError::InvalidAmount { grn_id, source } => {
                assert_eq!(grn_id, grn.id);
                assert_eq!(source.field(), "paid_amount");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reconcile_read_only_writes_nothing() {
        let db = fixtures::database().await;
        let (grn, _) = seeded(&db).await;

        let report = db
            .reconciler()
            .reconcile("GRN-2025-11-001", &ReconcileOptions::read_only())
            .await
            .unwrap();

        assert!(report.repair.is_none());
        assert!(report.uid_backfill.is_none());
        assert_eq!(report.unlinked_lines.len(), 3);
        assert!(report.uid_audit.is_defect());
        assert!(!report.payment.status_updated);
        assert!(report.needs_attention());

        let stored = db.grns().get_by_id(&grn.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
        assert!(db
            .grns()
            .list_items(&grn.id)
            .await
            .unwrap()
            .iter()
            .all(GrnLineItem::needs_repair));
    }

    #[tokio::test]
    async fn test_reconcile_apply_with_uids() {
        let db = fixtures::database().await;
        seeded(&db).await;

        let options = ReconcileOptions {
            apply: true,
            generate_uids: Some(settings()),
        };
        let report = db
            .reconciler()
            .reconcile(" GRN-2025-11-001 ", &options)
            .await
            .unwrap();

        assert_eq!(report.repair.as_ref().map(RepairReport::repaired), Some(2));
        assert_eq!(report.unlinked_lines, vec!["GHOST-999".to_string()]);
        assert_eq!(
            report.uid_backfill.as_ref().map(UidBackfillReport::total_generated),
            Some(5)
        );
        assert_eq!(report.uid_audit.uid_count, 5);
        assert!(report.payment.status_updated);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["grn_number"], "GRN-2025-11-001");
        assert_eq!(json["repair"]["lines"][1]["outcome"], "not_found");
        assert_eq!(json["payment"]["reconciliation"]["status"], "PAID");
    }

    #[tokio::test]
    async fn test_reconcile_unknown_or_malformed_number() {
        let db = fixtures::database().await;

        let err = db
            .reconciler()
            .reconcile("GRN-2099-01-001", &ReconcileOptions::read_only())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = db
            .reconciler()
            .reconcile("PO-1", &ReconcileOptions::read_only())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
