use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{AttachmentType, InventoryRecord, Location, Transaction, TransactionType};
use crate::store::{AttachmentStore, BalanceDelta, NewTransaction};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAttachmentTypeCommand {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocationCommand {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Issue attachments out to a line location. One positive balance delta at
/// the destination; no source location.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IssueAttachmentCommand {
    pub attachment_type_id: Uuid,
    pub location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(min = 1, max = 100))]
    pub requested_by: String,
    #[validate(length(max = 500))]
    pub comment: String,
    #[validate(length(min = 1, max = 100))]
    pub created_by: String,
}

/// Return attachments from a line location back to stock.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReturnAttachmentCommand {
    pub attachment_type_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(max = 500))]
    pub comment: String,
    #[validate(length(min = 1, max = 100))]
    pub created_by: String,
}

/// Move attachments between two locations.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MoveAttachmentCommand {
    pub attachment_type_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(max = 500))]
    pub comment: String,
    #[validate(length(min = 1, max = 100))]
    pub created_by: String,
}

/// Restock a location with newly acquired attachments.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddStockCommand {
    pub attachment_type_id: Uuid,
    pub location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i64,
    #[validate(length(max = 500))]
    pub comment: String,
    #[validate(length(min = 1, max = 100))]
    pub created_by: String,
}

/// Default catalog shipped with a fresh installation: the five common presser
/// feet plus a main stock location and two line locations.
const DEFAULT_ATTACHMENT_TYPES: [(&str, &str, &str); 5] = [
    ("WA001", "Walking Foot Attachment", "For heavy fabrics"),
    ("WA006", "Zipper Foot", "For installing zippers"),
    ("WA011", "Button Hole Attachment", "For creating buttonholes"),
    ("WA022", "Hemming Foot", "For precise hems"),
    ("WA033", "Overlock Attachment", "For edge finishing"),
];

const DEFAULT_LOCATIONS: [(&str, &str); 3] = [
    ("Main Stock", "Central inventory storage"),
    ("Line 1", "Production Line 1"),
    ("Line 2", "Production Line 2"),
];

/// What [`AttachmentService::seed_default_catalog`] actually created; entries
/// that already existed are not counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSeedReport {
    pub attachment_types_created: usize,
    pub locations_created: usize,
}

/// Attachment store operations: catalog maintenance plus the four ledger
/// mutations. Every mutation validates, resolves its catalog references, and
/// applies balance deltas and the history append as one atomic store call.
#[derive(Clone)]
pub struct AttachmentService {
    store: Arc<dyn AttachmentStore>,
    event_sender: EventSender,
}

impl AttachmentService {
    pub fn new(store: Arc<dyn AttachmentStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    #[instrument(skip(self, command), fields(code = %command.code))]
    pub async fn add_attachment_type(
        &self,
        command: CreateAttachmentTypeCommand,
    ) -> Result<AttachmentType, ServiceError> {
        command.validate()?;
        let ty = AttachmentType {
            id: Uuid::new_v4(),
            code: command.code,
            name: command.name,
            description: command.description,
            created_at: Utc::now(),
        };
        self.store.insert_attachment_type(ty.clone()).await?;
        info!(attachment_type_id = %ty.id, "Attachment type created");
        self.event_sender
            .send(Event::AttachmentTypeCreated {
                attachment_type_id: ty.id,
                code: ty.code.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;
        Ok(ty)
    }

    #[instrument(skip(self, command), fields(name = %command.name))]
    pub async fn add_location(
        &self,
        command: CreateLocationCommand,
    ) -> Result<Location, ServiceError> {
        command.validate()?;
        let location = Location {
            id: Uuid::new_v4(),
            name: command.name,
            description: command.description,
            created_at: Utc::now(),
        };
        self.store.insert_location(location.clone()).await?;
        info!(location_id = %location.id, "Location created");
        self.event_sender
            .send(Event::LocationCreated {
                location_id: location.id,
                name: location.name.clone(),
            })
            .await
            .map_err(ServiceError::EventError)?;
        Ok(location)
    }

    /// Seeds the default attachment types and stock locations for a fresh
    /// installation. Idempotent: types whose code and locations whose name
    /// already exist are skipped, so re-running after a partial setup only
    /// fills the gaps.
    #[instrument(skip(self))]
    pub async fn seed_default_catalog(&self) -> Result<CatalogSeedReport, ServiceError> {
        let existing_codes: Vec<String> = self
            .store
            .attachment_types()
            .await?
            .into_iter()
            .map(|ty| ty.code)
            .collect();
        let existing_names: Vec<String> = self
            .store
            .locations()
            .await?
            .into_iter()
            .map(|loc| loc.name)
            .collect();

        let mut report = CatalogSeedReport::default();
        for (code, name, description) in DEFAULT_ATTACHMENT_TYPES {
            if existing_codes.iter().any(|c| c == code) {
                continue;
            }
            self.add_attachment_type(CreateAttachmentTypeCommand {
                code: code.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
            report.attachment_types_created += 1;
        }
        for (name, description) in DEFAULT_LOCATIONS {
            if existing_names.iter().any(|n| n == name) {
                continue;
            }
            self.add_location(CreateLocationCommand {
                name: name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
            report.locations_created += 1;
        }
        info!(
            attachment_types_created = report.attachment_types_created,
            locations_created = report.locations_created,
            "Default catalog seeded"
        );
        Ok(report)
    }

    pub async fn attachment_types(&self) -> Result<Vec<AttachmentType>, ServiceError> {
        self.store.attachment_types().await
    }

    pub async fn locations(&self) -> Result<Vec<Location>, ServiceError> {
        self.store.locations().await
    }

    #[instrument(skip(self, command), fields(quantity = command.quantity))]
    pub async fn issue(&self, command: IssueAttachmentCommand) -> Result<Transaction, ServiceError> {
        command.validate()?;
        let ty = self.resolve_type(command.attachment_type_id).await?;
        let to = self.resolve_location(command.location_id).await?;

        let deltas = [BalanceDelta {
            attachment_type_id: ty.id,
            attachment_type_code: ty.code.clone(),
            location_id: to.id,
            location_name: to.name.clone(),
            quantity: command.quantity,
        }];
        let transaction = self
            .store
            .apply_ledger(
                &deltas,
                NewTransaction {
                    transaction_type: TransactionType::Issue,
                    attachment_type_id: ty.id,
                    attachment_type_code: ty.code,
                    quantity: command.quantity,
                    from_location_id: None,
                    from_location_name: None,
                    to_location_id: to.id,
                    to_location_name: to.name,
                    requested_by: command.requested_by,
                    comment: command.comment,
                    created_by: command.created_by,
                },
            )
            .await?;
        self.emit_ledger_event(&transaction).await?;
        Ok(transaction)
    }

    #[instrument(skip(self, command), fields(quantity = command.quantity))]
    pub async fn return_attachment(
        &self,
        command: ReturnAttachmentCommand,
    ) -> Result<Transaction, ServiceError> {
        command.validate()?;
        let ty = self.resolve_type(command.attachment_type_id).await?;
        let from = self.resolve_location(command.from_location_id).await?;
        let to = self.resolve_location(command.to_location_id).await?;

        let deltas = [
            BalanceDelta {
                attachment_type_id: ty.id,
                attachment_type_code: ty.code.clone(),
                location_id: from.id,
                location_name: from.name.clone(),
                quantity: -command.quantity,
            },
            BalanceDelta {
                attachment_type_id: ty.id,
                attachment_type_code: ty.code.clone(),
                location_id: to.id,
                location_name: to.name.clone(),
                quantity: command.quantity,
            },
        ];
        let transaction = self
            .store
            .apply_ledger(
                &deltas,
                NewTransaction {
                    transaction_type: TransactionType::Return,
                    attachment_type_id: ty.id,
                    attachment_type_code: ty.code,
                    quantity: command.quantity,
                    from_location_id: Some(from.id),
                    from_location_name: Some(from.name),
                    to_location_id: to.id,
                    to_location_name: to.name,
                    requested_by: command.created_by.clone(),
                    comment: command.comment,
                    created_by: command.created_by,
                },
            )
            .await?;
        self.emit_ledger_event(&transaction).await?;
        Ok(transaction)
    }

    #[instrument(skip(self, command), fields(quantity = command.quantity))]
    pub async fn move_attachment(
        &self,
        command: MoveAttachmentCommand,
    ) -> Result<Transaction, ServiceError> {
        command.validate()?;
        let ty = self.resolve_type(command.attachment_type_id).await?;
        let from = self.resolve_location(command.from_location_id).await?;
        let to = self.resolve_location(command.to_location_id).await?;

        let deltas = [
            BalanceDelta {
                attachment_type_id: ty.id,
                attachment_type_code: ty.code.clone(),
                location_id: from.id,
                location_name: from.name.clone(),
                quantity: -command.quantity,
            },
            BalanceDelta {
                attachment_type_id: ty.id,
                attachment_type_code: ty.code.clone(),
                location_id: to.id,
                location_name: to.name.clone(),
                quantity: command.quantity,
            },
        ];
        let transaction = self
            .store
            .apply_ledger(
                &deltas,
                NewTransaction {
                    transaction_type: TransactionType::Move,
                    attachment_type_id: ty.id,
                    attachment_type_code: ty.code,
                    quantity: command.quantity,
                    from_location_id: Some(from.id),
                    from_location_name: Some(from.name),
                    to_location_id: to.id,
                    to_location_name: to.name,
                    requested_by: command.created_by.clone(),
                    comment: command.comment,
                    created_by: command.created_by,
                },
            )
            .await?;
        self.emit_ledger_event(&transaction).await?;
        Ok(transaction)
    }

    #[instrument(skip(self, command), fields(quantity = command.quantity))]
    pub async fn add_stock(&self, command: AddStockCommand) -> Result<Transaction, ServiceError> {
        command.validate()?;
        let ty = self.resolve_type(command.attachment_type_id).await?;
        let to = self.resolve_location(command.location_id).await?;

        let deltas = [BalanceDelta {
            attachment_type_id: ty.id,
            attachment_type_code: ty.code.clone(),
            location_id: to.id,
            location_name: to.name.clone(),
            quantity: command.quantity,
        }];
        let transaction = self
            .store
            .apply_ledger(
                &deltas,
                NewTransaction {
                    transaction_type: TransactionType::Add,
                    attachment_type_id: ty.id,
                    attachment_type_code: ty.code,
                    quantity: command.quantity,
                    from_location_id: None,
                    from_location_name: None,
                    to_location_id: to.id,
                    to_location_name: to.name,
                    requested_by: command.created_by.clone(),
                    comment: command.comment,
                    created_by: command.created_by,
                },
            )
            .await?;
        self.emit_ledger_event(&transaction).await?;
        Ok(transaction)
    }

    pub async fn inventory(&self) -> Result<Vec<InventoryRecord>, ServiceError> {
        self.store.inventory().await
    }

    pub async fn inventory_by_location(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<InventoryRecord>, ServiceError> {
        self.store.inventory_by_location(location_id).await
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, ServiceError> {
        self.store.transactions().await
    }

    pub async fn transactions_by_attachment_type(
        &self,
        attachment_type_id: Uuid,
    ) -> Result<Vec<Transaction>, ServiceError> {
        self.store
            .transactions_by_attachment_type(attachment_type_id)
            .await
    }

    pub fn subscribe_inventory(&self) -> watch::Receiver<Vec<InventoryRecord>> {
        self.store.subscribe_inventory()
    }

    async fn resolve_type(&self, id: Uuid) -> Result<AttachmentType, ServiceError> {
        self.store
            .find_attachment_type(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Attachment type {} not found", id)))
    }

    async fn resolve_location(&self, id: Uuid) -> Result<Location, ServiceError> {
        self.store
            .find_location(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Location {} not found", id)))
    }

    async fn emit_ledger_event(&self, transaction: &Transaction) -> Result<(), ServiceError> {
        info!(
            transaction_id = %transaction.id,
            transaction_type = transaction.transaction_type.as_str(),
            quantity = transaction.quantity,
            "Ledger transaction applied"
        );
        self.event_sender
            .send(Event::LedgerTransactionApplied {
                transaction_id: transaction.id,
                transaction_type: transaction.transaction_type,
                attachment_type_id: transaction.attachment_type_id,
                quantity: transaction.quantity,
            })
            .await
            .map_err(ServiceError::EventError)
    }
}
