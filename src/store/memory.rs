//! In-memory store implementations.
//!
//! These back the crate's tests and any embedded deployment. The attachment
//! ledger serializes all mutations behind one lock, which discharges the
//! atomicity contract of [`AttachmentStore::apply_ledger`]: deltas and the
//! transaction append land together or not at all.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{watch, Mutex, RwLock};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Assessment, AttachmentType, InventoryRecord, Location, Transaction};
use crate::store::{
    AssessmentFilter, AssessmentStore, AttachmentStore, BalanceDelta, NewTransaction,
};

fn sort_newest_first(records: &mut [Assessment]) {
    records.sort_by(|a, b| b.date.cmp(&a.date));
}

fn matches_filter(assessment: &Assessment, filter: &AssessmentFilter) -> bool {
    if let Some(start) = filter.start_date {
        if assessment.date < start {
            return false;
        }
    }
    if let Some(end) = filter.end_date {
        if assessment.date > end {
            return false;
        }
    }
    if let Some(shift) = filter.shift {
        if assessment.shift != shift {
            return false;
        }
    }
    if let Some(level) = filter.skill_level {
        if assessment.skill_level != level {
            return false;
        }
    }
    if let Some(module) = filter.module_number {
        if assessment.module_number != module {
            return false;
        }
    }
    if let Some(machine_type) = filter.machine_type.as_deref() {
        if assessment.machine_type != machine_type {
            return false;
        }
    }
    if let Some(term) = filter.search_term.as_deref() {
        let needle = term.to_lowercase();
        if !assessment.epf.to_lowercase().contains(&needle)
            && !assessment.team_member.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

pub struct InMemoryAssessmentStore {
    records: RwLock<Vec<Assessment>>,
    snapshot_tx: watch::Sender<Vec<Assessment>>,
}

impl InMemoryAssessmentStore {
    pub fn new() -> Self {
        let (snapshot_tx, _) = watch::channel(Vec::new());
        Self {
            records: RwLock::new(Vec::new()),
            snapshot_tx,
        }
    }
}

impl Default for InMemoryAssessmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssessmentStore for InMemoryAssessmentStore {
    async fn insert(&self, assessment: Assessment) -> Result<(), ServiceError> {
        let mut records = self.records.write().await;
        records.push(assessment);
        let mut snapshot = records.clone();
        sort_newest_first(&mut snapshot);
        // send_replace updates the channel value even with no receivers, so
        // late subscribers see the current snapshot rather than the initial.
        self.snapshot_tx.send_replace(snapshot);
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Assessment>, ServiceError> {
        let mut out = self.records.read().await.clone();
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn fetch_filtered(
        &self,
        filter: &AssessmentFilter,
    ) -> Result<Vec<Assessment>, ServiceError> {
        let mut out: Vec<Assessment> = self
            .records
            .read()
            .await
            .iter()
            .filter(|a| matches_filter(a, filter))
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn fetch_by_worker(&self, epf: &str) -> Result<Vec<Assessment>, ServiceError> {
        let mut out: Vec<Assessment> = self
            .records
            .read()
            .await
            .iter()
            .filter(|a| a.epf == epf)
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn fetch_by_operation(
        &self,
        operation_id: &str,
    ) -> Result<Vec<Assessment>, ServiceError> {
        let mut out: Vec<Assessment> = self
            .records
            .read()
            .await
            .iter()
            .filter(|a| a.operation_id == operation_id)
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    async fn fetch_by_style(&self, style_id: &str) -> Result<Vec<Assessment>, ServiceError> {
        let mut out: Vec<Assessment> = self
            .records
            .read()
            .await
            .iter()
            .filter(|a| a.style_id == style_id)
            .cloned()
            .collect();
        sort_newest_first(&mut out);
        Ok(out)
    }

    fn subscribe(&self) -> watch::Receiver<Vec<Assessment>> {
        self.snapshot_tx.subscribe()
    }
}

#[derive(Default)]
struct LedgerState {
    /// Keyed by (attachment type id, location id); the lookup-or-create that
    /// keeps the pair unique happens under the ledger lock.
    balances: HashMap<(Uuid, Uuid), InventoryRecord>,
    /// Append-only, oldest first.
    transactions: Vec<Transaction>,
}

pub struct InMemoryAttachmentStore {
    attachment_types: DashMap<Uuid, AttachmentType>,
    locations: DashMap<Uuid, Location>,
    ledger: Mutex<LedgerState>,
    inventory_tx: watch::Sender<Vec<InventoryRecord>>,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        let (inventory_tx, _) = watch::channel(Vec::new());
        Self {
            attachment_types: DashMap::new(),
            locations: DashMap::new(),
            ledger: Mutex::new(LedgerState::default()),
            inventory_tx,
        }
    }
}

impl Default for InMemoryAttachmentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn inventory_snapshot(state: &LedgerState) -> Vec<InventoryRecord> {
    let mut out: Vec<InventoryRecord> = state.balances.values().cloned().collect();
    out.sort_by(|a, b| {
        a.attachment_type_code
            .cmp(&b.attachment_type_code)
            .then_with(|| a.location_name.cmp(&b.location_name))
    });
    out
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn insert_attachment_type(&self, ty: AttachmentType) -> Result<(), ServiceError> {
        if self
            .attachment_types
            .iter()
            .any(|existing| existing.code == ty.code)
        {
            return Err(ServiceError::Conflict(format!(
                "Attachment type code {} already exists",
                ty.code
            )));
        }
        self.attachment_types.insert(ty.id, ty);
        Ok(())
    }

    async fn attachment_types(&self) -> Result<Vec<AttachmentType>, ServiceError> {
        let mut out: Vec<AttachmentType> = self
            .attachment_types
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(out)
    }

    async fn find_attachment_type(
        &self,
        id: Uuid,
    ) -> Result<Option<AttachmentType>, ServiceError> {
        Ok(self.attachment_types.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_location(&self, location: Location) -> Result<(), ServiceError> {
        self.locations.insert(location.id, location);
        Ok(())
    }

    async fn locations(&self) -> Result<Vec<Location>, ServiceError> {
        let mut out: Vec<Location> = self
            .locations
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, ServiceError> {
        Ok(self.locations.get(&id).map(|e| e.value().clone()))
    }

    async fn apply_ledger(
        &self,
        deltas: &[BalanceDelta],
        transaction: NewTransaction,
    ) -> Result<Transaction, ServiceError> {
        let mut state = self.ledger.lock().await;
        let now = Utc::now();

        for delta in deltas {
            let key = (delta.attachment_type_id, delta.location_id);
            match state.balances.entry(key) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    record.quantity += delta.quantity;
                    record.last_updated = now;
                }
                Entry::Vacant(entry) => {
                    entry.insert(InventoryRecord {
                        id: Uuid::new_v4(),
                        attachment_type_id: delta.attachment_type_id,
                        attachment_type_code: delta.attachment_type_code.clone(),
                        location_id: delta.location_id,
                        location_name: delta.location_name.clone(),
                        quantity: delta.quantity,
                        last_updated: now,
                    });
                }
            }
        }

        let record = Transaction {
            id: Uuid::new_v4(),
            transaction_type: transaction.transaction_type,
            attachment_type_id: transaction.attachment_type_id,
            attachment_type_code: transaction.attachment_type_code,
            quantity: transaction.quantity,
            from_location_id: transaction.from_location_id,
            from_location_name: transaction.from_location_name,
            to_location_id: transaction.to_location_id,
            to_location_name: transaction.to_location_name,
            requested_by: transaction.requested_by,
            comment: transaction.comment,
            created_by: transaction.created_by,
            created_at: now,
        };
        state.transactions.push(record.clone());

        // Updates the channel value even with no live receivers.
        self.inventory_tx.send_replace(inventory_snapshot(&state));
        Ok(record)
    }

    async fn inventory(&self) -> Result<Vec<InventoryRecord>, ServiceError> {
        let state = self.ledger.lock().await;
        Ok(inventory_snapshot(&state))
    }

    async fn inventory_by_location(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<InventoryRecord>, ServiceError> {
        let state = self.ledger.lock().await;
        Ok(inventory_snapshot(&state)
            .into_iter()
            .filter(|r| r.location_id == location_id)
            .collect())
    }

    async fn transactions(&self) -> Result<Vec<Transaction>, ServiceError> {
        let state = self.ledger.lock().await;
        Ok(state.transactions.iter().rev().cloned().collect())
    }

    async fn transactions_by_attachment_type(
        &self,
        attachment_type_id: Uuid,
    ) -> Result<Vec<Transaction>, ServiceError> {
        let state = self.ledger.lock().await;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.attachment_type_id == attachment_type_id)
            .cloned()
            .collect())
    }

    fn subscribe_inventory(&self) -> watch::Receiver<Vec<InventoryRecord>> {
        self.inventory_tx.subscribe()
    }
}
