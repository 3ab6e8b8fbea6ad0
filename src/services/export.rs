//! Flattening of assessments into the fixed spreadsheet-export column set.
//! Producing the actual file is the exporter's job; this module only owns the
//! column list and row formatting.

use crate::metrics::skill_level_label;
use crate::models::Assessment;

/// Column headers, in export order.
pub const EXPORT_COLUMNS: [&str; 13] = [
    "Date",
    "EPF",
    "Worker Name",
    "Style",
    "Operation",
    "Machine Type",
    "SMV",
    "Efficiency (%)",
    "FTT (%)",
    "Skill Level",
    "Shift",
    "Module",
    "Responsible IE",
];

/// One display row per assessment, fields stringified the way the report
/// views render them.
pub fn export_rows(assessments: &[Assessment]) -> Vec<Vec<String>> {
    assessments
        .iter()
        .map(|a| {
            vec![
                a.date.format("%Y-%m-%d").to_string(),
                a.epf.clone(),
                a.team_member.clone(),
                a.style_name.clone(),
                a.operation_name.clone(),
                a.machine_type.clone(),
                a.smv.to_string(),
                format!("{:.2}", a.efficiency),
                format!("{:.2}", a.ftt),
                skill_level_label(a.skill_level).to_string(),
                a.shift.as_str().to_string(),
                a.module_number.to_string(),
                a.responsible_ie.clone(),
            ]
        })
        .collect()
}
