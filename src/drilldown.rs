use serde::Serialize;

use crate::models::{GetOrEmpty, LabeledSeries, NamedSeries, NestedCountMap, Report, WeekRisk};
use crate::series;
use crate::weeks;

/// Everything the dashboard shows for one selected student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDrilldown {
    pub id: String,
    pub label: String,
    pub qualification: String,
    pub modules: LabeledSeries<u64>,
    pub weeks: LabeledSeries<u64>,
    pub risk_by_week: WeekRisk,
    pub risk_by_module: Vec<(String, String)>,
}

impl StudentDrilldown {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
            && self.weeks.is_empty()
            && self.risk_by_week.weeks.is_empty()
            && self.risk_by_module.is_empty()
    }
}

/// Trims and drops a spreadsheet float suffix: `" 25302469.0 "` becomes `"25302469"`.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.rfind('.') {
        Some(dot) if dot > 0 && is_zero_run(&trimmed[dot + 1..]) => {
            trimmed[..dot].to_string()
        }
        _ => trimmed.to_string(),
    }
}

fn is_zero_run(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c == '0')
}

/// Maps typed search text to a student id: an exact label first, then the text as an id.
pub fn resolve_student(report: &Report, typed: &str) -> Option<String> {
    if let Some(student) = report.student_lookup.iter().find(|s| s.label == typed) {
        return Some(student.id.clone());
    }
    let id = normalize_id(typed);
    (!id.is_empty()).then_some(id)
}

pub fn drilldown(report: &Report, sid: &str) -> StudentDrilldown {
    let student = report.student(sid);

    let modules = report
        .ps_modules_att
        .get_or_empty(sid)
        .iter()
        .map(|(module, count)| (module.clone(), *count))
        .collect();

    let mut risk_by_module: Vec<(String, String)> = report
        .ps_risk_module_max
        .get_or_empty(sid)
        .iter()
        .map(|(module, risk)| (module.clone(), risk.clone()))
        .collect();
    risk_by_module.sort();

    StudentDrilldown {
        id: sid.to_string(),
        label: student
            .map(|s| s.label.clone())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| sid.to_string()),
        qualification: student.map(|s| s.qualification.clone()).unwrap_or_default(),
        modules,
        weeks: series::weekly_series(report.ps_weeks_att.get_or_empty(sid)),
        risk_by_week: risk_series(report.ps_week_risk_counts.get_or_empty(sid)),
        risk_by_module,
    }
}

/// One line per risk level over the student's ordered weeks, zero filled.
fn risk_series(by_week: &NestedCountMap) -> WeekRisk {
    let ordered = weeks::order_weeks(by_week.keys().cloned());

    let mut names: Vec<&String> = Vec::new();
    for week in &ordered {
        for name in by_week.get_or_empty(week).keys() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    let series = names
        .into_iter()
        .map(|name| NamedSeries {
            name: name.clone(),
            data: ordered
                .iter()
                .map(|week| by_week.get_or_empty(week).get(name).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    WeekRisk {
        weeks: ordered,
        series,
    }
}
