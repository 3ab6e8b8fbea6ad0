use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry for a kind of sewing-machine attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentType {
    pub id: Uuid,
    /// Short unique code, denormalized onto inventory and transaction rows.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry for a physical storage or line location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Materialized balance for one (attachment type, location) pair.
///
/// At most one record exists per pair; the store enforces this via
/// lookup-or-create inside the ledger lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub attachment_type_id: Uuid,
    pub attachment_type_code: String,
    pub location_id: Uuid,
    pub location_name: String,
    pub quantity: i64,
    pub last_updated: DateTime<Utc>,
}

/// Kinds of ledger transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Issue,
    Return,
    Move,
    Add,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Issue => "issue",
            TransactionType::Return => "return",
            TransactionType::Move => "move",
            TransactionType::Add => "add",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issue" => Some(TransactionType::Issue),
            "return" => Some(TransactionType::Return),
            "move" => Some(TransactionType::Move),
            "add" => Some(TransactionType::Add),
            _ => None,
        }
    }
}

/// Append-only ledger history entry. Never mutated or deleted; location and
/// type names are denormalized, so renaming a catalog entry does not rewrite
/// historical rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
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
    pub created_at: DateTime<Utc>,
}
