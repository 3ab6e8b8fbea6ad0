use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Assessment, Shift};
use crate::store::{AssessmentFilter, AssessmentStore};

/// Raw trial inputs for one assessment. Derived metric fields are always
/// recomputed on record; caller-supplied values for them are not accepted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordAssessmentCommand {
    #[validate(length(min = 1, max = 50))]
    pub epf: String,
    #[validate(length(min = 1, max = 100))]
    pub team_member: String,
    #[validate(length(min = 1, max = 50))]
    pub style_id: String,
    #[validate(length(min = 1, max = 100))]
    pub style_name: String,
    #[validate(length(min = 1, max = 50))]
    pub operation_id: String,
    #[validate(length(min = 1, max = 100))]
    pub operation_name: String,
    #[validate(length(min = 1, max = 50))]
    pub machine_type: String,
    pub smv: f64,
    pub shift: Shift,
    #[validate(range(min = 1))]
    pub module_number: u32,
    pub timer_values: Vec<f64>,
    pub number_of_good_garments: u32,
    #[validate(length(min = 1, max = 100))]
    pub responsible_ie: String,
    /// Defaults to now when absent.
    pub date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 100))]
    pub created_by: String,
}

impl RecordAssessmentCommand {
    /// Checks the trial-shape constraints the derive macro cannot express.
    fn check_trial_inputs(&self) -> Result<(), ServiceError> {
        if self.smv < 0.0 {
            return Err(ServiceError::ValidationError(
                "SMV must not be negative".to_string(),
            ));
        }
        if self.timer_values.is_empty() {
            return Err(ServiceError::ValidationError(
                "At least one timer reading is required".to_string(),
            ));
        }
        if self.timer_values.iter().any(|&t| t <= 0.0 || !t.is_finite()) {
            return Err(ServiceError::ValidationError(
                "Timer readings must be positive".to_string(),
            ));
        }
        if self.number_of_good_garments as usize > self.timer_values.len() {
            return Err(ServiceError::ValidationError(
                "Good garment count cannot exceed the number of timed runs".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read/write access to the assessment collection.
#[derive(Clone)]
pub struct AssessmentService {
    store: Arc<dyn AssessmentStore>,
    event_sender: EventSender,
}

impl AssessmentService {
    pub fn new(store: Arc<dyn AssessmentStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Records one completed trial, recomputing every derived field from the
    /// raw inputs before it is stored.
    #[instrument(skip(self, command), fields(epf = %command.epf, operation = %command.operation_id))]
    pub async fn record(
        &self,
        command: RecordAssessmentCommand,
    ) -> Result<Assessment, ServiceError> {
        command.validate()?;
        command.check_trial_inputs()?;

        let mut assessment = Assessment {
            id: Uuid::new_v4(),
            epf: command.epf,
            team_member: command.team_member,
            style_id: command.style_id,
            style_name: command.style_name,
            operation_id: command.operation_id,
            operation_name: command.operation_name,
            machine_type: command.machine_type,
            smv: command.smv,
            shift: command.shift,
            module_number: command.module_number,
            timer_values: command.timer_values,
            number_of_good_garments: command.number_of_good_garments,
            ssv: 0.0,
            average_time: 0.0,
            efficiency: 0.0,
            ftt: 0.0,
            skill_level: 1,
            responsible_ie: command.responsible_ie,
            date: command.date.unwrap_or_else(Utc::now),
            created_by: command.created_by,
        };
        assessment.recompute_derived_fields();

        self.store.insert(assessment.clone()).await?;
        info!(
            assessment_id = %assessment.id,
            skill_level = assessment.skill_level,
            "Assessment recorded"
        );

        self.event_sender
            .send(Event::AssessmentRecorded {
                assessment_id: assessment.id,
                epf: assessment.epf.clone(),
                operation_id: assessment.operation_id.clone(),
                skill_level: assessment.skill_level,
            })
            .await
            .map_err(ServiceError::EventError)?;

        Ok(assessment)
    }

    /// All assessments, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Assessment>, ServiceError> {
        self.store.fetch_all().await
    }

    #[instrument(skip(self, filter))]
    pub async fn list_filtered(
        &self,
        filter: &AssessmentFilter,
    ) -> Result<Vec<Assessment>, ServiceError> {
        self.store.fetch_filtered(filter).await
    }

    #[instrument(skip(self))]
    pub async fn by_worker(&self, epf: &str) -> Result<Vec<Assessment>, ServiceError> {
        self.store.fetch_by_worker(epf).await
    }

    #[instrument(skip(self))]
    pub async fn by_operation(&self, operation_id: &str) -> Result<Vec<Assessment>, ServiceError> {
        self.store.fetch_by_operation(operation_id).await
    }

    #[instrument(skip(self))]
    pub async fn by_style(&self, style_id: &str) -> Result<Vec<Assessment>, ServiceError> {
        self.store.fetch_by_style(style_id).await
    }

    /// Live read mode; each received value is the full current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Assessment>> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryAssessmentStore;
    use assert_matches::assert_matches;

    fn command() -> RecordAssessmentCommand {
        RecordAssessmentCommand {
            epf: "EPF-1001".to_string(),
            team_member: "Amara Silva".to_string(),
            style_id: "ST-01".to_string(),
            style_name: "Crew Tee".to_string(),
            operation_id: "OP-14".to_string(),
            operation_name: "Attach collar".to_string(),
            machine_type: "SNLS".to_string(),
            smv: 0.75,
            shift: Shift::A,
            module_number: 3,
            timer_values: vec![40.0, 50.0],
            number_of_good_garments: 2,
            responsible_ie: "IE Perera".to_string(),
            date: None,
            created_by: "ie@factory.test".to_string(),
        }
    }

    fn service() -> (AssessmentService, tokio::sync::mpsc::Receiver<Event>) {
        let (event_sender, rx) = EventSender::channel(16);
        let store = Arc::new(InMemoryAssessmentStore::new());
        (AssessmentService::new(store, event_sender), rx)
    }

    #[tokio::test]
    async fn record_recomputes_derived_fields() {
        let (service, mut events) = service();
        let stored = service.record(command()).await.unwrap();

        // smv 0.75 -> ssv 45s; mean(40, 50) = 45 -> efficiency 100; ftt 100.
        assert_eq!(stored.ssv, 45.0);
        assert_eq!(stored.average_time, 45.0);
        assert_eq!(stored.efficiency, 100.0);
        assert_eq!(stored.ftt, 100.0);
        assert_eq!(stored.skill_level, 4);
        assert!(stored.derived_fields_consistent());

        assert_matches!(
            events.recv().await,
            Some(Event::AssessmentRecorded { skill_level: 4, .. })
        );
    }

    #[tokio::test]
    async fn record_rejects_empty_timer_sequence() {
        let (service, _events) = service();
        let mut cmd = command();
        cmd.timer_values.clear();
        let err = service.record(cmd).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));

        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_rejects_good_count_above_runs() {
        let (service, _events) = service();
        let mut cmd = command();
        cmd.number_of_good_garments = 3;
        let err = service.record(cmd).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[tokio::test]
    async fn filtered_reads_match_store_predicates() {
        let (service, _events) = service();
        service.record(command()).await.unwrap();
        let mut other = command();
        other.epf = "EPF-2002".to_string();
        other.team_member = "Bimal Fernando".to_string();
        other.shift = Shift::B;
        service.record(other).await.unwrap();

        let shift_b = service
            .list_filtered(&AssessmentFilter {
                shift: Some(Shift::B),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(shift_b.len(), 1);
        assert_eq!(shift_b[0].epf, "EPF-2002");

        let searched = service
            .list_filtered(&AssessmentFilter {
                search_term: Some("amara".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].epf, "EPF-1001");

        assert_eq!(service.by_worker("EPF-1001").await.unwrap().len(), 1);
    }
}
