use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::analytics::{
    self, EfficiencyTrendPoint, KpiSummary, MachineTypePerformance, OperationPerformance,
    ShiftComparison, SkillLevelCount, SkillsMatrix, SkillsMatrixFilter, StylePerformance,
    WorkerPerformance,
};
use crate::errors::ServiceError;
use crate::store::{AssessmentFilter, AssessmentStore};

/// Combined dashboard view assembled from one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub kpis: KpiSummary,
    pub skill_level_distribution: Vec<SkillLevelCount>,
    pub shift_comparison: ShiftComparison,
    pub generated_at: DateTime<Utc>,
}

/// Analytics over the assessment collection. Every method fetches one
/// point-in-time snapshot and runs the pure reductions from
/// [`crate::analytics`] on it; repeated calls never share mutable state.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn AssessmentStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn AssessmentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardReport, ServiceError> {
        let snapshot = self.store.fetch_all().await?;
        info!(records = snapshot.len(), "Generating dashboard report");
        Ok(DashboardReport {
            kpis: analytics::kpi_summary(&snapshot),
            skill_level_distribution: analytics::skill_level_distribution(&snapshot),
            shift_comparison: analytics::shift_comparison(&snapshot),
            generated_at: Utc::now(),
        })
    }

    pub async fn kpi_summary(&self) -> Result<KpiSummary, ServiceError> {
        Ok(analytics::kpi_summary(&self.store.fetch_all().await?))
    }

    pub async fn worker_performance(&self) -> Result<Vec<WorkerPerformance>, ServiceError> {
        Ok(analytics::worker_performance(&self.store.fetch_all().await?))
    }

    pub async fn operation_performance(&self) -> Result<Vec<OperationPerformance>, ServiceError> {
        Ok(analytics::operation_performance(
            &self.store.fetch_all().await?,
        ))
    }

    pub async fn style_performance(&self) -> Result<Vec<StylePerformance>, ServiceError> {
        Ok(analytics::style_performance(&self.store.fetch_all().await?))
    }

    pub async fn machine_type_performance(
        &self,
    ) -> Result<Vec<MachineTypePerformance>, ServiceError> {
        Ok(analytics::machine_type_performance(
            &self.store.fetch_all().await?,
        ))
    }

    pub async fn skill_level_distribution(&self) -> Result<Vec<SkillLevelCount>, ServiceError> {
        Ok(analytics::skill_level_distribution(
            &self.store.fetch_all().await?,
        ))
    }

    pub async fn shift_comparison(&self) -> Result<ShiftComparison, ServiceError> {
        Ok(analytics::shift_comparison(&self.store.fetch_all().await?))
    }

    pub async fn efficiency_trend(&self) -> Result<Vec<EfficiencyTrendPoint>, ServiceError> {
        Ok(analytics::efficiency_trend(&self.store.fetch_all().await?))
    }

    /// Skills matrix for the subset selected by `filter`. The shift and
    /// machine-type predicates are pushed down to the store; search and
    /// module filtering happen in the reduction.
    #[instrument(skip(self, filter))]
    pub async fn skills_matrix(
        &self,
        filter: &SkillsMatrixFilter,
    ) -> Result<SkillsMatrix, ServiceError> {
        let snapshot = self
            .store
            .fetch_filtered(&AssessmentFilter {
                shift: filter.shift,
                machine_type: filter.machine_type.clone(),
                ..Default::default()
            })
            .await?;
        Ok(analytics::skills_matrix(&snapshot, filter))
    }
}
