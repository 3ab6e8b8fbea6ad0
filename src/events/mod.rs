use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::TransactionType;

/// Domain events emitted after each successful mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AssessmentRecorded {
        assessment_id: Uuid,
        epf: String,
        operation_id: String,
        skill_level: u8,
    },
    AttachmentTypeCreated {
        attachment_type_id: Uuid,
        code: String,
    },
    LocationCreated {
        location_id: Uuid,
        name: String,
    },
    LedgerTransactionApplied {
        transaction_id: Uuid,
        transaction_type: TransactionType,
        attachment_type_id: Uuid,
        quantity: i64,
    },
}

/// Cloneable handle for publishing events onto the application channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Builds a sender together with its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}
