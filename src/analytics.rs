//! Aggregation reductions over assessment snapshots.
//!
//! Every function here takes an unordered slice of assessments and produces a
//! deterministic result: groups are built in first-seen order, sorts are
//! stable, and empty groups yield zero-valued summaries instead of NaN.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Assessment, Shift};

/// Dashboard KPI roll-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_assessments: usize,
    pub average_efficiency: f64,
    pub average_ftt: f64,
    pub total_workers: usize,
    pub active_styles: usize,
    pub active_operations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPerformance {
    pub epf: String,
    pub name: String,
    pub total_assessments: usize,
    pub avg_efficiency: f64,
    pub avg_ftt: f64,
    /// Skill level of the newest assessment by date.
    pub current_skill_level: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPerformance {
    pub operation_id: String,
    pub operation_name: String,
    pub machine_type: String,
    pub smv: f64,
    pub avg_efficiency: f64,
    pub total_assessments: usize,
    pub avg_completion_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePerformance {
    pub style_id: String,
    pub style_name: String,
    pub total_assessments: usize,
    pub operations_count: usize,
    pub avg_efficiency: f64,
    pub avg_ftt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineTypePerformance {
    pub machine_type: String,
    pub operations_count: usize,
    pub total_assessments: usize,
    pub avg_efficiency: f64,
    pub avg_ftt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillLevelCount {
    pub level: u8,
    pub count: usize,
}

/// One day's point on the efficiency trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTrendPoint {
    pub date: NaiveDate,
    pub avg_efficiency: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftBucket {
    pub count: usize,
    pub avg_efficiency: f64,
    pub avg_ftt: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftComparison {
    pub shift_a: ShiftBucket,
    pub shift_b: ShiftBucket,
}

/// Filters applied when building the skills matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsMatrixFilter {
    pub shift: Option<Shift>,
    pub machine_type: Option<String>,
    /// Case-insensitive substring match against worker EPF or name.
    pub search: Option<String>,
    pub module_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationColumn {
    pub operation_id: String,
    pub operation_name: String,
}

/// Matrix columns for one machine type, operations sorted by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineTypeGroup {
    pub machine_type: String,
    pub operations: Vec<OperationColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSkillRow {
    pub epf: String,
    pub name: String,
    pub module_number: u32,
    /// operation id -> best skill level observed for that operation.
    pub skills: HashMap<String, u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillsMatrix {
    pub machine_type_groups: Vec<MachineTypeGroup>,
    pub rows: Vec<WorkerSkillRow>,
}

/// Partitions assessments by a string key, preserving first-seen key order.
fn group_by<'a, K>(
    assessments: &'a [Assessment],
    key: K,
) -> Vec<(String, Vec<&'a Assessment>)>
where
    K: Fn(&Assessment) -> &str,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&Assessment>)> = Vec::new();
    for assessment in assessments {
        let k = key(assessment);
        match index.get(k).copied() {
            Some(i) => groups[i].1.push(assessment),
            None => {
                index.insert(k.to_string(), groups.len());
                groups.push((k.to_string(), vec![assessment]));
            }
        }
    }
    groups
}

fn mean<'a, I, F>(items: I, len: usize, f: F) -> f64
where
    I: Iterator<Item = &'a Assessment>,
    F: Fn(&Assessment) -> f64,
{
    if len == 0 {
        return 0.0;
    }
    items.map(f).sum::<f64>() / len as f64
}

fn distinct_count<'a, I, F>(items: I, f: F) -> usize
where
    I: Iterator<Item = &'a Assessment>,
    F: Fn(&Assessment) -> &str,
{
    let mut seen: Vec<&str> = items.map(f).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

/// KPI roll-up over the whole snapshot; all-zero for empty input.
pub fn kpi_summary(assessments: &[Assessment]) -> KpiSummary {
    if assessments.is_empty() {
        return KpiSummary::default();
    }
    let n = assessments.len();
    KpiSummary {
        total_assessments: n,
        average_efficiency: mean(assessments.iter(), n, |a| a.efficiency),
        average_ftt: mean(assessments.iter(), n, |a| a.ftt),
        total_workers: distinct_count(assessments.iter(), |a| &a.epf),
        active_styles: distinct_count(assessments.iter(), |a| &a.style_id),
        active_operations: distinct_count(assessments.iter(), |a| &a.operation_id),
    }
}

/// Per-worker summaries, sorted by mean efficiency descending.
pub fn worker_performance(assessments: &[Assessment]) -> Vec<WorkerPerformance> {
    let mut out: Vec<WorkerPerformance> = group_by(assessments, |a| &a.epf)
        .into_iter()
        .map(|(epf, mut group)| {
            // Newest record carries the display name and current skill level.
            group.sort_by(|a, b| b.date.cmp(&a.date));
            let latest = group[0];
            let n = group.len();
            WorkerPerformance {
                epf,
                name: latest.team_member.clone(),
                total_assessments: n,
                avg_efficiency: mean(group.iter().copied(), n, |a| a.efficiency),
                avg_ftt: mean(group.iter().copied(), n, |a| a.ftt),
                current_skill_level: latest.skill_level,
            }
        })
        .collect();
    out.sort_by(|a, b| b.avg_efficiency.total_cmp(&a.avg_efficiency));
    out
}

/// Per-operation summaries, sorted by mean efficiency descending.
///
/// Name, machine type and SMV are taken from an arbitrary member; operations
/// are assumed homogeneous per id.
pub fn operation_performance(assessments: &[Assessment]) -> Vec<OperationPerformance> {
    let mut out: Vec<OperationPerformance> = group_by(assessments, |a| &a.operation_id)
        .into_iter()
        .map(|(operation_id, group)| {
            let first = group[0];
            let n = group.len();
            OperationPerformance {
                operation_id,
                operation_name: first.operation_name.clone(),
                machine_type: first.machine_type.clone(),
                smv: first.smv,
                avg_efficiency: mean(group.iter().copied(), n, |a| a.efficiency),
                total_assessments: n,
                avg_completion_time: mean(group.iter().copied(), n, |a| a.average_time),
            }
        })
        .collect();
    out.sort_by(|a, b| b.avg_efficiency.total_cmp(&a.avg_efficiency));
    out
}

/// Per-style summaries, sorted by mean efficiency descending.
pub fn style_performance(assessments: &[Assessment]) -> Vec<StylePerformance> {
    let mut out: Vec<StylePerformance> = group_by(assessments, |a| &a.style_id)
        .into_iter()
        .map(|(style_id, group)| {
            let first = group[0];
            let n = group.len();
            StylePerformance {
                style_id,
                style_name: first.style_name.clone(),
                total_assessments: n,
                operations_count: distinct_count(group.iter().copied(), |a| &a.operation_id),
                avg_efficiency: mean(group.iter().copied(), n, |a| a.efficiency),
                avg_ftt: mean(group.iter().copied(), n, |a| a.ftt),
            }
        })
        .collect();
    out.sort_by(|a, b| b.avg_efficiency.total_cmp(&a.avg_efficiency));
    out
}

/// Per-machine-type summaries, keyed by the label itself: two operations or
/// styles sharing a label merge into one bucket.
pub fn machine_type_performance(assessments: &[Assessment]) -> Vec<MachineTypePerformance> {
    let mut out: Vec<MachineTypePerformance> = group_by(assessments, |a| &a.machine_type)
        .into_iter()
        .map(|(machine_type, group)| {
            let n = group.len();
            MachineTypePerformance {
                machine_type,
                operations_count: distinct_count(group.iter().copied(), |a| &a.operation_id),
                total_assessments: n,
                avg_efficiency: mean(group.iter().copied(), n, |a| a.efficiency),
                avg_ftt: mean(group.iter().copied(), n, |a| a.ftt),
            }
        })
        .collect();
    out.sort_by(|a, b| b.avg_efficiency.total_cmp(&a.avg_efficiency));
    out
}

/// Histogram over the four fixed skill levels; zero-count levels stay present.
pub fn skill_level_distribution(assessments: &[Assessment]) -> Vec<SkillLevelCount> {
    let mut counts = [0usize; 4];
    for assessment in assessments {
        if (1..=4).contains(&assessment.skill_level) {
            counts[assessment.skill_level as usize - 1] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| SkillLevelCount {
            level: i as u8 + 1,
            count,
        })
        .collect()
}

/// Mean efficiency per calendar day, chronological. Days with no assessments
/// are absent rather than zero-filled; empty input yields an empty series.
pub fn efficiency_trend(assessments: &[Assessment]) -> Vec<EfficiencyTrendPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for assessment in assessments {
        let bucket = days.entry(assessment.date.date_naive()).or_insert((0.0, 0));
        bucket.0 += assessment.efficiency;
        bucket.1 += 1;
    }
    days.into_iter()
        .map(|(date, (total, count))| EfficiencyTrendPoint {
            date,
            avg_efficiency: total / count as f64,
            count,
        })
        .collect()
}

fn shift_bucket(assessments: &[&Assessment]) -> ShiftBucket {
    let n = assessments.len();
    if n == 0 {
        return ShiftBucket::default();
    }
    ShiftBucket {
        count: n,
        avg_efficiency: mean(assessments.iter().copied(), n, |a| a.efficiency),
        avg_ftt: mean(assessments.iter().copied(), n, |a| a.ftt),
    }
}

/// Two-bucket comparison between shifts A and B.
pub fn shift_comparison(assessments: &[Assessment]) -> ShiftComparison {
    let shift_a: Vec<&Assessment> = assessments.iter().filter(|a| a.shift == Shift::A).collect();
    let shift_b: Vec<&Assessment> = assessments.iter().filter(|a| a.shift == Shift::B).collect();
    ShiftComparison {
        shift_a: shift_bucket(&shift_a),
        shift_b: shift_bucket(&shift_b),
    }
}

/// Builds the skills matrix for a filtered subset of assessments.
///
/// Each cell holds the MAXIMUM skill level the worker has shown on that
/// operation across all matching records. Column groups keep machine types in
/// first-seen order with operations name-sorted inside each group; rows keep
/// first-seen worker order.
pub fn skills_matrix(assessments: &[Assessment], filter: &SkillsMatrixFilter) -> SkillsMatrix {
    let subset: Vec<&Assessment> = assessments
        .iter()
        .filter(|a| filter.shift.map_or(true, |s| a.shift == s))
        .filter(|a| {
            filter
                .machine_type
                .as_deref()
                .map_or(true, |mt| a.machine_type == mt)
        })
        .collect();

    // Column groups: machine type -> distinct operations.
    let mut group_index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<OperationColumn>)> = Vec::new();
    for a in &subset {
        let i = match group_index.get(a.machine_type.as_str()).copied() {
            Some(i) => i,
            None => {
                group_index.insert(&a.machine_type, groups.len());
                groups.push((a.machine_type.clone(), Vec::new()));
                groups.len() - 1
            }
        };
        if !groups[i].1.iter().any(|op| op.operation_id == a.operation_id) {
            groups[i].1.push(OperationColumn {
                operation_id: a.operation_id.clone(),
                operation_name: a.operation_name.clone(),
            });
        }
    }
    let machine_type_groups = groups
        .into_iter()
        .map(|(machine_type, mut operations)| {
            operations.sort_by(|a, b| {
                a.operation_name
                    .cmp(&b.operation_name)
                    .then_with(|| a.operation_id.cmp(&b.operation_id))
            });
            MachineTypeGroup {
                machine_type,
                operations,
            }
        })
        .collect();

    // Rows: one per worker, max-wins cell merge.
    let mut row_index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<WorkerSkillRow> = Vec::new();
    for a in &subset {
        let i = match row_index.get(a.epf.as_str()).copied() {
            Some(i) => i,
            None => {
                row_index.insert(&a.epf, rows.len());
                rows.push(WorkerSkillRow {
                    epf: a.epf.clone(),
                    name: a.team_member.clone(),
                    module_number: a.module_number,
                    skills: HashMap::new(),
                });
                rows.len() - 1
            }
        };
        let cell = rows[i].skills.entry(a.operation_id.clone()).or_insert(0);
        if a.skill_level > *cell {
            *cell = a.skill_level;
        }
    }

    if let Some(search) = filter.search.as_deref() {
        let needle = search.to_lowercase();
        rows.retain(|row| {
            row.epf.to_lowercase().contains(&needle) || row.name.to_lowercase().contains(&needle)
        });
    }
    if let Some(module) = filter.module_number {
        rows.retain(|row| row.module_number == module);
    }

    SkillsMatrix {
        machine_type_groups,
        rows,
    }
}
