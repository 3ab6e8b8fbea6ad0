use std::collections::HashMap;

use assert_matches::assert_matches;
use uuid::Uuid;

use skillset_api::config::AppConfig;
use skillset_api::errors::ServiceError;
use skillset_api::models::{AttachmentType, Location, TransactionType};
use skillset_api::services::attachments::{
    AddStockCommand, CatalogSeedReport, CreateAttachmentTypeCommand, CreateLocationCommand,
    IssueAttachmentCommand, MoveAttachmentCommand, ReturnAttachmentCommand,
};
use skillset_api::AppState;

struct Harness {
    state: AppState,
    _events: tokio::task::JoinHandle<()>,
}

fn harness() -> Harness {
    let (state, mut event_rx) = AppState::in_memory(AppConfig::default());
    // Drain events so mutations never back up on the channel.
    let drain = tokio::spawn(async move { while event_rx.recv().await.is_some() {} });
    Harness {
        state,
        _events: drain,
    }
}

async fn catalog(state: &AppState) -> (AttachmentType, Location, Location, Location) {
    let folder = state
        .attachments
        .add_attachment_type(CreateAttachmentTypeCommand {
            code: "FLD-12".to_string(),
            name: "12mm hem folder".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let line_a = state
        .attachments
        .add_location(CreateLocationCommand {
            name: "Line A".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let line_b = state
        .attachments
        .add_location(CreateLocationCommand {
            name: "Line B".to_string(),
            description: None,
        })
        .await
        .unwrap();
    let stock_c = state
        .attachments
        .add_location(CreateLocationCommand {
            name: "Stock C".to_string(),
            description: Some("Main store".to_string()),
        })
        .await
        .unwrap();
    (folder, line_a, line_b, stock_c)
}

#[tokio::test]
async fn ledger_replay_reconstructs_balances() {
    let h = harness();
    let (folder, line_a, line_b, stock_c) = catalog(&h.state).await;

    h.state
        .attachments
        .issue(IssueAttachmentCommand {
            attachment_type_id: folder.id,
            location_id: line_a.id,
            quantity: 10,
            requested_by: "Supervisor A".to_string(),
            comment: "New style setup".to_string(),
            created_by: "store@factory.test".to_string(),
        })
        .await
        .unwrap();
    h.state
        .attachments
        .return_attachment(ReturnAttachmentCommand {
            attachment_type_id: folder.id,
            from_location_id: line_a.id,
            to_location_id: line_b.id,
            quantity: 4,
            comment: "Style complete".to_string(),
            created_by: "store@factory.test".to_string(),
        })
        .await
        .unwrap();
    h.state
        .attachments
        .move_attachment(MoveAttachmentCommand {
            attachment_type_id: folder.id,
            from_location_id: line_b.id,
            to_location_id: stock_c.id,
            quantity: 3,
            comment: "Rebalance".to_string(),
            created_by: "store@factory.test".to_string(),
        })
        .await
        .unwrap();

    let inventory = h.state.attachments.inventory().await.unwrap();
    let by_location: HashMap<Uuid, i64> = inventory
        .iter()
        .map(|r| (r.location_id, r.quantity))
        .collect();
    assert_eq!(by_location[&line_a.id], 6);
    assert_eq!(by_location[&line_b.id], 1);
    assert_eq!(by_location[&stock_c.id], 3);

    let at_line_a = h
        .state
        .attachments
        .inventory_by_location(line_a.id)
        .await
        .unwrap();
    assert_eq!(at_line_a.len(), 1);
    assert_eq!(at_line_a[0].quantity, 6);
    assert_eq!(at_line_a[0].attachment_type_code, "FLD-12");

    let transactions = h.state.attachments.transactions().await.unwrap();
    assert_eq!(transactions.len(), 3);
    // Newest first.
    assert_eq!(transactions[0].transaction_type, TransactionType::Move);
    assert_eq!(transactions[2].transaction_type, TransactionType::Issue);

    // The balance for every location is reconstructable from the log alone.
    let mut replayed: HashMap<Uuid, i64> = HashMap::new();
    for txn in transactions.iter().rev() {
        if let Some(from) = txn.from_location_id {
            *replayed.entry(from).or_default() -= txn.quantity;
        }
        *replayed.entry(txn.to_location_id).or_default() += txn.quantity;
    }
    assert_eq!(replayed, by_location);
}

#[tokio::test]
async fn non_positive_quantities_are_rejected_without_effect() {
    let h = harness();
    let (folder, line_a, _line_b, stock_c) = catalog(&h.state).await;

    for quantity in [0, -5] {
        let err = h
            .state
            .attachments
            .issue(IssueAttachmentCommand {
                attachment_type_id: folder.id,
                location_id: line_a.id,
                quantity,
                requested_by: "Supervisor A".to_string(),
                comment: String::new(),
                created_by: "store@factory.test".to_string(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));

        let err = h
            .state
            .attachments
            .add_stock(AddStockCommand {
                attachment_type_id: folder.id,
                location_id: stock_c.id,
                quantity,
                comment: String::new(),
                created_by: "store@factory.test".to_string(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    assert!(h.state.attachments.inventory().await.unwrap().is_empty());
    assert!(h.state.attachments.transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_catalog_references_reject_with_nothing_written() {
    let h = harness();
    let (folder, line_a, _line_b, _stock_c) = catalog(&h.state).await;

    let err = h
        .state
        .attachments
        .issue(IssueAttachmentCommand {
            attachment_type_id: Uuid::new_v4(),
            location_id: line_a.id,
            quantity: 5,
            requested_by: "Supervisor A".to_string(),
            comment: String::new(),
            created_by: "store@factory.test".to_string(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    let err = h
        .state
        .attachments
        .issue(IssueAttachmentCommand {
            attachment_type_id: folder.id,
            location_id: Uuid::new_v4(),
            quantity: 5,
            requested_by: "Supervisor A".to_string(),
            comment: String::new(),
            created_by: "store@factory.test".to_string(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));

    assert!(h.state.attachments.inventory().await.unwrap().is_empty());
    assert!(h.state.attachments.transactions().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_attachment_type_codes_conflict() {
    let h = harness();
    h.state
        .attachments
        .add_attachment_type(CreateAttachmentTypeCommand {
            code: "FLD-12".to_string(),
            name: "12mm hem folder".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let err = h
        .state
        .attachments
        .add_attachment_type(CreateAttachmentTypeCommand {
            code: "FLD-12".to_string(),
            name: "Duplicate folder".to_string(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
    assert_eq!(h.state.attachments.attachment_types().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_mutations_against_one_pair_lose_no_update() {
    let h = harness();
    let (folder, line_a, _line_b, stock_c) = catalog(&h.state).await;

    // Seed stock so the interleaving mixes creates and increments.
    h.state
        .attachments
        .add_stock(AddStockCommand {
            attachment_type_id: folder.id,
            location_id: line_a.id,
            quantity: 100,
            comment: "Seed".to_string(),
            created_by: "store@factory.test".to_string(),
        })
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let attachments = h.state.attachments.clone();
        let type_id = folder.id;
        let line = line_a.id;
        tasks.push(tokio::spawn(async move {
            attachments
                .issue(IssueAttachmentCommand {
                    attachment_type_id: type_id,
                    location_id: line,
                    quantity: 2,
                    requested_by: "Supervisor A".to_string(),
                    comment: String::new(),
                    created_by: "store@factory.test".to_string(),
                })
                .await
                .unwrap();
        }));
        let attachments = h.state.attachments.clone();
        let type_id = folder.id;
        let from = line_a.id;
        let to = stock_c.id;
        tasks.push(tokio::spawn(async move {
            attachments
                .return_attachment(ReturnAttachmentCommand {
                    attachment_type_id: type_id,
                    from_location_id: from,
                    to_location_id: to,
                    quantity: 1,
                    comment: String::new(),
                    created_by: "store@factory.test".to_string(),
                })
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let inventory = h.state.attachments.inventory().await.unwrap();
    let by_location: HashMap<Uuid, i64> = inventory
        .iter()
        .map(|r| (r.location_id, r.quantity))
        .collect();
    // 100 seed + 20*2 issued - 20 returned out = 120; 20 returned into stock.
    assert_eq!(by_location[&line_a.id], 120);
    assert_eq!(by_location[&stock_c.id], 20);
    assert_eq!(h.state.attachments.transactions().await.unwrap().len(), 41);

    // Exactly one record per touched pair.
    assert_eq!(inventory.len(), 2);

    // Live subscription holds the same snapshot as a point-in-time read.
    let latest = h.state.attachments.subscribe_inventory().borrow().clone();
    assert_eq!(latest, inventory);
}

#[tokio::test]
async fn default_catalog_seeding_is_idempotent() {
    let h = harness();

    // Part of the catalog may already exist from a manual setup.
    h.state
        .attachments
        .add_attachment_type(CreateAttachmentTypeCommand {
            code: "WA006".to_string(),
            name: "Zipper Foot".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let report = h.state.attachments.seed_default_catalog().await.unwrap();
    assert_eq!(report.attachment_types_created, 4);
    assert_eq!(report.locations_created, 3);

    // Re-running creates nothing and duplicates nothing.
    let rerun = h.state.attachments.seed_default_catalog().await.unwrap();
    assert_eq!(rerun, CatalogSeedReport::default());

    let types = h.state.attachments.attachment_types().await.unwrap();
    assert_eq!(types.len(), 5);
    assert!(types.iter().any(|t| t.code == "WA001"));
    let locations = h.state.attachments.locations().await.unwrap();
    assert_eq!(locations.len(), 3);
    assert!(locations.iter().any(|l| l.name == "Main Stock"));
}

#[tokio::test]
async fn transaction_history_filters_by_attachment_type() {
    let h = harness();
    let (folder, line_a, _line_b, _stock_c) = catalog(&h.state).await;
    let guide = h
        .state
        .attachments
        .add_attachment_type(CreateAttachmentTypeCommand {
            code: "GDE-3".to_string(),
            name: "Edge guide".to_string(),
            description: None,
        })
        .await
        .unwrap();

    for type_id in [folder.id, guide.id, folder.id] {
        h.state
            .attachments
            .add_stock(AddStockCommand {
                attachment_type_id: type_id,
                location_id: line_a.id,
                quantity: 1,
                comment: String::new(),
                created_by: "store@factory.test".to_string(),
            })
            .await
            .unwrap();
    }

    let folder_history = h
        .state
        .attachments
        .transactions_by_attachment_type(folder.id)
        .await
        .unwrap();
    assert_eq!(folder_history.len(), 2);
    assert!(folder_history
        .iter()
        .all(|t| t.attachment_type_code == "FLD-12"));
}
