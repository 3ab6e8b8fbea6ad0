//! Repository abstraction over the hosted record store.
//!
//! Services depend only on these traits. Each collection supports a one-shot
//! fetch and a push-based subscription that carries the full current result
//! set on every change; both read modes return the same shape.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{
    Assessment, AttachmentType, InventoryRecord, Location, Shift, Transaction, TransactionType,
};

/// Equality and range predicates for assessment reads. Substring search runs
/// client-side against worker EPF and name after the store-side predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub shift: Option<Shift>,
    pub skill_level: Option<u8>,
    pub module_number: Option<u32>,
    pub machine_type: Option<String>,
    pub search_term: Option<String>,
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn insert(&self, assessment: Assessment) -> Result<(), ServiceError>;

    /// All assessments, newest first.
    async fn fetch_all(&self) -> Result<Vec<Assessment>, ServiceError>;

    async fn fetch_filtered(
        &self,
        filter: &AssessmentFilter,
    ) -> Result<Vec<Assessment>, ServiceError>;

    async fn fetch_by_worker(&self, epf: &str) -> Result<Vec<Assessment>, ServiceError>;

    async fn fetch_by_operation(&self, operation_id: &str)
        -> Result<Vec<Assessment>, ServiceError>;

    async fn fetch_by_style(&self, style_id: &str) -> Result<Vec<Assessment>, ServiceError>;

    /// Push-based read mode: the receiver always holds the full current
    /// snapshot, newest first, and is notified on every change.
    fn subscribe(&self) -> watch::Receiver<Vec<Assessment>>;
}

/// One signed balance adjustment against a (type, location) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub attachment_type_id: Uuid,
    pub attachment_type_code: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub quantity: i64,
}

/// Transaction fields supplied by the caller; id and timestamp are assigned
/// by the store at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub transaction_type: TransactionType,
    pub attachment_type_id: Uuid,
    pub attachment_type_code: String,
    pub quantity: i64,
    pub from_location_id: Option<Uuid>,
    pub from_location_name: Option<String>,
    pub to_location_id: Uuid,
    pub to_location_name: String,
    pub requested_by: String,
    pub comment: String,
    pub created_by: String,
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Adds a catalog entry; duplicate codes are a conflict.
    async fn insert_attachment_type(&self, ty: AttachmentType) -> Result<(), ServiceError>;

    async fn attachment_types(&self) -> Result<Vec<AttachmentType>, ServiceError>;

    async fn find_attachment_type(
        &self,
        id: Uuid,
    ) -> Result<Option<AttachmentType>, ServiceError>;

    async fn insert_location(&self, location: Location) -> Result<(), ServiceError>;

    async fn locations(&self) -> Result<Vec<Location>, ServiceError>;

    async fn find_location(&self, id: Uuid) -> Result<Option<Location>, ServiceError>;

    /// Applies every balance delta and appends the transaction as one atomic
    /// unit. Balances auto-create on first touch with quantity equal to the
    /// first delta; concurrent calls against the same pair serialize and
    /// never lose an update. On error nothing is written.
    async fn apply_ledger(
        &self,
        deltas: &[BalanceDelta],
        transaction: NewTransaction,
    ) -> Result<Transaction, ServiceError>;

    async fn inventory(&self) -> Result<Vec<InventoryRecord>, ServiceError>;

    async fn inventory_by_location(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<InventoryRecord>, ServiceError>;

    /// Transaction history, newest first.
    async fn transactions(&self) -> Result<Vec<Transaction>, ServiceError>;

    async fn transactions_by_attachment_type(
        &self,
        attachment_type_id: Uuid,
    ) -> Result<Vec<Transaction>, ServiceError>;

    fn subscribe_inventory(&self) -> watch::Receiver<Vec<InventoryRecord>>;
}
