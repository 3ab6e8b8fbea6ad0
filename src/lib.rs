//! Skillset API Library
//!
//! Skill-assessment analytics plus an attachment inventory ledger for a
//! garment-factory industrial-engineering team. The crate owns the derived
//! metric formulas, the dashboard aggregations, and the ledger mutation
//! protocol; persistence sits behind the [`store`] traits.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod analytics;
pub mod config;
pub mod errors;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use tokio::sync::mpsc;

use events::{Event, EventSender};
use services::{AnalyticsService, AssessmentService, AttachmentService};
use store::{AssessmentStore, AttachmentStore};

/// Shared application state wiring the services to their stores.
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub assessments: AssessmentService,
    pub analytics: AnalyticsService,
    pub attachments: AttachmentService,
}

impl AppState {
    /// Builds the full service graph over the given stores. Returns the
    /// receiving end of the event channel for the caller to drain.
    pub fn new(
        config: config::AppConfig,
        assessment_store: Arc<dyn AssessmentStore>,
        attachment_store: Arc<dyn AttachmentStore>,
    ) -> (Self, mpsc::Receiver<Event>) {
        let (event_sender, event_rx) = EventSender::channel(config.event_buffer_size);
        let state = Self {
            assessments: AssessmentService::new(assessment_store.clone(), event_sender.clone()),
            analytics: AnalyticsService::new(assessment_store),
            attachments: AttachmentService::new(attachment_store, event_sender.clone()),
            event_sender,
            config,
        };
        (state, event_rx)
    }

    /// In-memory-backed state, used by tests and embedded deployments.
    pub fn in_memory(config: config::AppConfig) -> (Self, mpsc::Receiver<Event>) {
        Self::new(
            config,
            Arc::new(store::memory::InMemoryAssessmentStore::new()),
            Arc::new(store::memory::InMemoryAttachmentStore::new()),
        )
    }
}
