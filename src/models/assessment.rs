use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::metrics;

/// Production shift the assessment was taken on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    A,
    B,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::A => "A",
            Shift::B => "B",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Shift::A),
            "B" => Some(Shift::B),
            _ => None,
        }
    }
}

/// One completed timed trial for a worker on an operation.
///
/// The `ssv`, `average_time`, `efficiency`, `ftt` and `skill_level` fields are
/// derived from the raw trial inputs and stored alongside them. They are a
/// cache: writers recompute them, readers that care about correctness can
/// verify with [`Assessment::derived_fields_consistent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: Uuid,
    /// Worker payroll number, unique per worker.
    pub epf: String,
    pub team_member: String,
    pub style_id: String,
    pub style_name: String,
    pub operation_id: String,
    pub operation_name: String,
    pub machine_type: String,
    /// Standard minute value for the operation.
    pub smv: f64,
    pub shift: Shift,
    pub module_number: u32,
    /// Timer readings in seconds, one per trial run.
    pub timer_values: Vec<f64>,
    pub number_of_good_garments: u32,
    pub ssv: f64,
    pub average_time: f64,
    pub efficiency: f64,
    pub ftt: f64,
    pub skill_level: u8,
    pub responsible_ie: String,
    pub date: DateTime<Utc>,
    pub created_by: String,
}

impl Assessment {
    /// Recomputes every derived field from the raw trial inputs.
    pub fn recompute_derived_fields(&mut self) {
        self.ssv = metrics::ssv(self.smv);
        self.average_time = metrics::average_time(&self.timer_values);
        self.efficiency = metrics::efficiency(self.ssv, self.average_time);
        self.ftt = metrics::ftt(self.number_of_good_garments, self.timer_values.len());
        self.skill_level = metrics::skill_level(self.ftt, self.efficiency);
    }

    /// Checks the stored derived fields against a fresh recomputation.
    pub fn derived_fields_consistent(&self) -> bool {
        let mut fresh = self.clone();
        fresh.recompute_derived_fields();
        self.ssv == fresh.ssv
            && self.average_time == fresh.average_time
            && self.efficiency == fresh.efficiency
            && self.ftt == fresh.ftt
            && self.skill_level == fresh.skill_level
    }
}
