use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category label to count, e.g. risk severity or module name.
pub type CountMap = BTreeMap<String, u64>;
/// Outer key (week or qualification) to a count map.
pub type NestedCountMap = BTreeMap<String, CountMap>;
/// Week label to cell for one student in one module.
pub type WeekCells = BTreeMap<String, Cell>;
/// Student id to that student's week cells.
pub type StudentCells = BTreeMap<String, WeekCells>;

/// One `(absenceCount, totalRows)` tuple, stored as a two element array in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "(u32, u32)")]
pub struct Cell {
    pub absences: u32,
    pub total_rows: u32,
}

impl From<(u32, u32)> for Cell {
    fn from((absences, total_rows): (u32, u32)) -> Self {
        Cell {
            absences,
            total_rows,
        }
    }
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        self.absences > 0
    }

    /// A cell with no rows is an unscheduled week, not a week with zero absences.
    pub fn is_scheduled(&self) -> bool {
        self.total_rows > 0
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Student {
    pub id: String,
    pub label: String,
    pub name: String,
    #[serde(alias = "qual")]
    pub qualification: String,
}

/// Entry of a precomputed "top absentees" list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopStudent {
    pub id: String,
    pub label: String,
    pub count: u64,
    pub rate: f64,
    #[serde(alias = "qual")]
    pub qualification: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedSeries {
    pub name: String,
    pub data: Vec<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekRisk {
    pub weeks: Vec<String>,
    pub series: Vec<NamedSeries>,
}

pub const STUDENTS_UNAVAILABLE: &str =
    "Student analytics unavailable: the report has no student column.";

/// Students with more than one record, and a sample of their rows.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepeatedStudents {
    pub top_counts: CountMap,
    pub preview_rows: Vec<BTreeMap<String, String>>,
}

/// The precomputed dashboard payload. Every field may be missing from the JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Report {
    pub total_records: u64,
    pub unique_students: Option<u64>,

    pub risk_counts: CountMap,
    pub resolved_counts: CountMap,
    pub by_reason: CountMap,

    pub weeks: Vec<String>,
    pub modules: Vec<String>,

    pub by_module: CountMap,
    pub by_module_attendance: CountMap,
    pub by_week_attendance: CountMap,
    pub by_week_module_all: NestedCountMap,
    pub by_week_module_attendance: NestedCountMap,
    pub by_module_all_by_qual: NestedCountMap,
    pub by_module_att_by_qual: NestedCountMap,
    pub by_week_module_all_by_qual: BTreeMap<String, NestedCountMap>,
    pub by_week_module_att_by_qual: BTreeMap<String, NestedCountMap>,

    pub week_risk: WeekRisk,
    pub resolved_rate: BTreeMap<String, f64>,

    pub student_enabled: bool,
    pub student_lookup: Vec<Student>,
    pub ps_modules_att: NestedCountMap,
    pub ps_weeks_att: NestedCountMap,
    pub ps_risk_module_max: BTreeMap<String, BTreeMap<String, String>>,
    pub ps_week_risk_counts: BTreeMap<String, NestedCountMap>,
    pub module_top_students_att: BTreeMap<String, Vec<TopStudent>>,
    pub global_top_students_att: Vec<TopStudent>,

    pub module_heatmap: BTreeMap<String, StudentCells>,
    pub repeated_students: RepeatedStudents,
}

impl Report {
    pub fn student(&self, id: &str) -> Option<&Student> {
        self.student_lookup.iter().find(|s| s.id == id)
    }

    /// Index of `student_lookup` by id. Later duplicates do not override earlier ones.
    pub fn student_index(&self) -> BTreeMap<&str, &Student> {
        let mut index = BTreeMap::new();
        for student in &self.student_lookup {
            index.entry(student.id.as_str()).or_insert(student);
        }
        index
    }
}

/// Parallel label/value vectors, the shape every chart in the dashboard consumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledSeries<V> {
    pub labels: Vec<String>,
    pub values: Vec<V>,
}

impl<V> Default for LabeledSeries<V> {
    fn default() -> Self {
        LabeledSeries {
            labels: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<V> LabeledSeries<V> {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.labels.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl<V> FromIterator<(String, V)> for LabeledSeries<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let (labels, values) = iter.into_iter().unzip();
        LabeledSeries { labels, values }
    }
}

/// Values with a shared, immutable empty instance.
pub trait Empty: 'static {
    fn empty() -> &'static Self;
}

macro_rules! impl_empty {
    ($($ty:ty => $init:expr),* $(,)?) => {
        $(
            impl Empty for $ty {
                fn empty() -> &'static Self {
                    static EMPTY: $ty = $init;
                    &EMPTY
                }
            }
        )*
    };
}

impl_empty! {
    CountMap => BTreeMap::new(),
    NestedCountMap => BTreeMap::new(),
    WeekCells => BTreeMap::new(),
    StudentCells => BTreeMap::new(),
    BTreeMap<String, String> => BTreeMap::new(),
    Vec<TopStudent> => Vec::new(),
}

/// Lookup that resolves a missing key to the empty value instead of failing.
pub trait GetOrEmpty<V> {
    fn get_or_empty(&self, key: &str) -> &V;
}

impl<V: Empty> GetOrEmpty<V> for BTreeMap<String, V> {
    fn get_or_empty(&self, key: &str) -> &V {
        self.get(key).unwrap_or_else(|| V::empty())
    }
}
