use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::models::{CountMap, GetOrEmpty, LabeledSeries, NestedCountMap, Report};
use crate::series;

/// Which rows a module count is taken over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    #[default]
    All,
    Attendance,
}

/// Truncation applied to a ranked list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    Top(usize),
}

impl Scope {
    pub fn limit(&self) -> Option<usize> {
        match self {
            Scope::All => None,
            Scope::Top(n) => Some(*n),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    /// Accepts `all`, `topN` and the dashboard's `topN_att` spelling.
    /// A `top` prefix without a usable number means no truncation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if value.is_empty() || value == "all" {
            return Ok(Scope::All);
        }

        let Some(rest) = value.strip_prefix("top") else {
            return Err(format!("unknown scope `{s}`, expected `all` or `topN`"));
        };
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Scope::Top(n)),
            _ => Ok(Scope::All),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => f.write_str("all"),
            Scope::Top(n) => write!(f, "top{n}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModuleQuery {
    pub week: Option<String>,
    pub basis: Basis,
    pub qualification: Option<String>,
    pub scope: Scope,
}

/// Picks the module count map for a query. First matching branch wins:
/// attendance by qualification, attendance, all by qualification, then all.
pub fn resolve_counts<'a>(report: &'a Report, query: &ModuleQuery) -> &'a CountMap {
    let week = non_empty(query.week.as_deref());
    let qualification = non_empty(query.qualification.as_deref());

    match (query.basis, qualification) {
        (Basis::Attendance, Some(qual)) => by_week_or_global(
            report.by_week_module_att_by_qual.get_or_empty(qual),
            report.by_module_att_by_qual.get_or_empty(qual),
            week,
        ),
        (Basis::Attendance, None) => by_week_or_global(
            &report.by_week_module_attendance,
            &report.by_module_attendance,
            week,
        ),
        (Basis::All, Some(qual)) => by_week_or_global(
            report.by_week_module_all_by_qual.get_or_empty(qual),
            report.by_module_all_by_qual.get_or_empty(qual),
            week,
        ),
        (Basis::All, None) => {
            by_week_or_global(&report.by_week_module_all, &report.by_module, week)
        }
    }
}

/// Module counts for the query, ranked and truncated to its scope.
pub fn module_counts(report: &Report, query: &ModuleQuery) -> LabeledSeries<u64> {
    let mut ranked = series::ranked_counts(resolve_counts(report, query));
    if let Some(n) = query.scope.limit() {
        ranked.labels.truncate(n);
        ranked.values.truncate(n);
    }
    ranked
}

fn by_week_or_global<'a>(
    per_week: &'a NestedCountMap,
    global: &'a CountMap,
    week: Option<&str>,
) -> &'a CountMap {
    match week {
        Some(week) => per_week.get_or_empty(week),
        None => global,
    }
}

/// A blank filter is unset. Anything else is kept as typed and matched exactly.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> CountMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn nested(outer: &str, inner: CountMap) -> NestedCountMap {
        [(outer.to_string(), inner)].into_iter().collect()
    }

    /// Every branch holds a distinct single module so the chosen map is obvious.
    fn sample_report() -> Report {
        Report {
            by_module: counts(&[("all-global", 1)]),
            by_module_attendance: counts(&[("att-global", 1)]),
            by_week_module_all: nested("Week 1", counts(&[("all-week", 1)])),
            by_week_module_attendance: nested("Week 1", counts(&[("att-week", 1)])),
            by_module_all_by_qual: nested("BSc", counts(&[("all-qual", 1)])),
            by_module_att_by_qual: nested("BSc", counts(&[("att-qual", 1)])),
            by_week_module_all_by_qual: [(
                "BSc".to_string(),
                nested("Week 1", counts(&[("all-qual-week", 1)])),
            )]
            .into_iter()
            .collect(),
            by_week_module_att_by_qual: [(
                "BSc".to_string(),
                nested("Week 1", counts(&[("att-qual-week", 1)])),
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    fn resolved(basis: Basis, week: Option<&str>, qual: Option<&str>) -> Vec<String> {
        let query = ModuleQuery {
            week: week.map(str::to_string),
            basis,
            qualification: qual.map(str::to_string),
            scope: Scope::All,
        };
        module_counts(&sample_report(), &query).labels
    }

    #[test]
    fn resolution_covers_every_branch() {
        assert_eq!(resolved(Basis::Attendance, Some("Week 1"), Some("BSc")), vec!["att-qual-week"]);
        assert_eq!(resolved(Basis::Attendance, None, Some("BSc")), vec!["att-qual"]);
        assert_eq!(resolved(Basis::Attendance, Some("Week 1"), None), vec!["att-week"]);
        assert_eq!(resolved(Basis::Attendance, None, None), vec!["att-global"]);
        assert_eq!(resolved(Basis::All, Some("Week 1"), Some("BSc")), vec!["all-qual-week"]);
        assert_eq!(resolved(Basis::All, None, Some("BSc")), vec!["all-qual"]);
        assert_eq!(resolved(Basis::All, Some("Week 1"), None), vec!["all-week"]);
        assert_eq!(resolved(Basis::All, None, None), vec!["all-global"]);
    }

    #[test]
    fn blank_filters_count_as_unset() {
        assert_eq!(resolved(Basis::All, Some("  "), Some("")), vec!["all-global"]);
    }

    #[test]
    fn padded_filters_are_not_trimmed() {
        assert!(resolved(Basis::All, None, Some(" BSc ")).is_empty());
        assert!(resolved(Basis::All, Some("Week 1 "), None).is_empty());
    }

    #[test]
    fn missing_nested_maps_resolve_to_empty() {
        assert!(resolved(Basis::Attendance, Some("Week 7"), Some("BSc")).is_empty());
        assert!(resolved(Basis::All, None, Some("MSc")).is_empty());
        let series = module_counts(&Report::default(), &ModuleQuery::default());
        assert_eq!(series, LabeledSeries::default());
    }

    #[test]
    fn ties_break_by_label() {
        let report = Report {
            by_module: counts(&[("A", 5), ("B", 9), ("C", 5)]),
            ..Default::default()
        };
        let series = module_counts(&report, &ModuleQuery::default());
        assert_eq!(series.labels, vec!["B", "A", "C"]);
        assert_eq!(series.values, vec![9, 5, 5]);
    }

    #[test]
    fn top_scope_truncates() {
        let report = Report {
            by_module_attendance: counts(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)]),
            ..Default::default()
        };
        let query = ModuleQuery {
            basis: Basis::Attendance,
            scope: Scope::Top(3),
            ..Default::default()
        };
        assert_eq!(module_counts(&report, &query).labels, vec!["D", "C", "B"]);
    }

    #[test]
    fn parses_scope_spellings() {
        assert_eq!("all".parse::<Scope>(), Ok(Scope::All));
        assert_eq!("top5".parse::<Scope>(), Ok(Scope::Top(5)));
        assert_eq!("top10_att".parse::<Scope>(), Ok(Scope::Top(10)));
        assert_eq!("top".parse::<Scope>(), Ok(Scope::All));
        assert!("bottom3".parse::<Scope>().is_err());
        assert_eq!(Scope::Top(3).to_string(), "top3");
    }
}
