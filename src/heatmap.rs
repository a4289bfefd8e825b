use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{GetOrEmpty, Report, Student, StudentCells, WeekCells};
use crate::modules::non_empty;
use crate::risk;
use crate::weeks;

pub const DEFAULT_TOP_N: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HeatSort {
    #[default]
    #[value(name = "total_desc")]
    TotalDesc,
    #[value(name = "name_asc")]
    NameAsc,
    #[value(name = "id_asc")]
    IdAsc,
}

/// How a heatmap cell is shaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HeatMode {
    #[default]
    Binary,
    Rate,
}

#[derive(Debug, Clone)]
pub struct HeatmapQuery {
    pub module: String,
    pub qualification: Option<String>,
    pub sort: HeatSort,
    pub top_n: usize,
    /// Inclusive bounds on the week number.
    pub from_week: Option<u64>,
    pub to_week: Option<u64>,
}

impl HeatmapQuery {
    pub fn new(module: impl Into<String>) -> Self {
        HeatmapQuery {
            module: module.into(),
            qualification: None,
            sort: HeatSort::default(),
            top_n: DEFAULT_TOP_N,
            from_week: None,
            to_week: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub id: String,
    pub name: String,
    pub qualification: String,
    pub week_flags: BTreeMap<String, u8>,
    pub total: u32,
    pub rate_percent: u32,
    /// Columns with at least one scheduled row for this student.
    pub scheduled_weeks: u32,
}

impl HeatmapRow {
    pub fn flag(&self, week: &str) -> u8 {
        self.week_flags.get(week).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapResult {
    pub module: String,
    pub weeks: Vec<String>,
    pub rows: Vec<HeatmapRow>,
}

impl HeatmapResult {
    /// True when no week column survived, e.g. after a week range excluded everything.
    pub fn has_no_weeks(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Row-major cell values for drawing: flags in binary mode, the row's overall
    /// rate as a fraction in rate mode.
    pub fn matrix(&self, mode: HeatMode) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                self.weeks
                    .iter()
                    .map(|week| match mode {
                        HeatMode::Binary => f64::from(row.flag(week)),
                        HeatMode::Rate => f64::from(row.rate_percent) / 100.0,
                    })
                    .collect()
            })
            .collect()
    }
}

/// Week columns for a module: every week any qualifying student has a cell for,
/// or the report's week list when there are none.
pub fn module_weeks(report: &Report, module: &str, qualification: Option<&str>) -> Vec<String> {
    let index = report.student_index();
    let cells: &StudentCells = report.module_heatmap.get_or_empty(module);

    let mut union: BTreeSet<&String> = cells
        .iter()
        .filter(|(sid, _)| qualifies(&index, sid, qualification))
        .flat_map(|(_, week_cells)| week_cells.keys())
        .collect();

    if union.is_empty() {
        union = report.weeks.iter().collect();
    }
    weeks::order_weeks(union.into_iter().cloned())
}

pub fn build_heatmap(report: &Report, query: &HeatmapQuery) -> HeatmapResult {
    let qualification = non_empty(query.qualification.as_deref());
    let index = report.student_index();
    let cells: &StudentCells = report.module_heatmap.get_or_empty(&query.module);

    let columns: Vec<String> = module_weeks(report, &query.module, qualification)
        .into_iter()
        .filter(|week| weeks::in_range(week, query.from_week, query.to_week))
        .collect();

    let mut rows: Vec<HeatmapRow> = cells
        .iter()
        .filter(|(sid, _)| qualifies(&index, sid, qualification))
        .map(|(sid, week_cells)| {
            let student = index.get(sid.as_str());
            build_row(
                sid,
                student.map(|s| s.name.as_str()).unwrap_or_default(),
                student.map(|s| s.qualification.as_str()).unwrap_or_default(),
                week_cells,
                &columns,
            )
        })
        .collect();

    sort_rows(&mut rows, query.sort);
    rows.truncate(query.top_n);

    HeatmapResult {
        module: query.module.clone(),
        weeks: columns,
        rows,
    }
}

fn build_row(
    sid: &str,
    name: &str,
    qualification: &str,
    week_cells: &WeekCells,
    columns: &[String],
) -> HeatmapRow {
    let mut week_flags = BTreeMap::new();
    let mut total = 0u32;
    let mut scheduled_weeks = 0u32;

    for week in columns {
        let cell = week_cells.get(week);
        // A missing cell is "no session", shown as no absence.
        let flag = u8::from(cell.is_some_and(|c| c.is_absent()));
        if cell.is_some_and(|c| c.is_scheduled()) {
            scheduled_weeks += 1;
        }
        total += u32::from(flag);
        week_flags.insert(week.clone(), flag);
    }

    HeatmapRow {
        id: sid.to_string(),
        name: name.to_string(),
        qualification: qualification.to_string(),
        week_flags,
        total,
        rate_percent: risk::rate_percent(total as usize, columns.len()),
        scheduled_weeks,
    }
}

fn sort_rows(rows: &mut [HeatmapRow], sort: HeatSort) {
    match sort {
        HeatSort::TotalDesc => {
            rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.id.cmp(&b.id)))
        }
        HeatSort::NameAsc => rows.sort_by_cached_key(|row| {
            (row.name.to_lowercase(), row.name.clone(), row.id.clone())
        }),
        HeatSort::IdAsc => rows.sort_by(|a, b| a.id.cmp(&b.id)),
    }
}

fn qualifies(index: &BTreeMap<&str, &Student>, sid: &str, qualification: Option<&str>) -> bool {
    match qualification {
        None => true,
        Some(wanted) => index
            .get(sid)
            .map(|s| s.qualification.as_str())
            .unwrap_or_default()
            == wanted,
    }
}
