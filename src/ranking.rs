use serde::Serialize;

use crate::models::{GetOrEmpty, Report, TopStudent};
use crate::modules::non_empty;
use crate::risk::{self, RateBand};

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RankBasis {
    #[default]
    Count,
    Rate,
}

#[derive(Debug, Clone)]
pub struct RankQuery {
    pub module: Option<String>,
    pub qualification: Option<String>,
    pub band: Option<RateBand>,
    pub by: RankBasis,
    pub limit: usize,
}

impl Default for RankQuery {
    fn default() -> Self {
        RankQuery {
            module: None,
            qualification: None,
            band: None,
            by: RankBasis::default(),
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStudent {
    pub id: String,
    pub label: String,
    pub count: u64,
    pub rate: f64,
}

impl From<&TopStudent> for RankedStudent {
    fn from(entry: &TopStudent) -> Self {
        RankedStudent {
            id: entry.id.clone(),
            label: entry.label.clone(),
            count: entry.count,
            rate: entry.rate,
        }
    }
}

/// Ranks the precomputed absentee list for a module, or the global one.
pub fn rank_students(report: &Report, query: &RankQuery) -> Vec<RankedStudent> {
    let source: &Vec<TopStudent> = match non_empty(query.module.as_deref()) {
        Some(module) => report.module_top_students_att.get_or_empty(module),
        None => &report.global_top_students_att,
    };
    let qualification = non_empty(query.qualification.as_deref());

    let mut ranked: Vec<&TopStudent> = source
        .iter()
        .filter(|entry| qualification.map_or(true, |q| matches_qualification(entry, q)))
        .filter(|entry| query.band.map_or(true, |band| risk::band_of(entry.rate) == band))
        .collect();

    // Stable: equal keys keep the precomputed order.
    match query.by {
        RankBasis::Count => ranked.sort_by(|a, b| b.count.cmp(&a.count)),
        RankBasis::Rate => ranked.sort_by(|a, b| b.rate.total_cmp(&a.rate)),
    }

    ranked
        .into_iter()
        .take(query.limit)
        .map(RankedStudent::from)
        .collect()
}

/// The structured field decides when it is set; otherwise the `[...]` tag in the label.
pub fn matches_qualification(entry: &TopStudent, wanted: &str) -> bool {
    match entry.qualification.as_deref() {
        Some(field) if !field.trim().is_empty() => field == wanted,
        _ => label_tag(&entry.label) == Some(wanted),
    }
}

/// Last bracketed group of a label, e.g. `BSc IT` in `"2530 — Ada Obi [BSc IT]"`.
pub fn label_tag(label: &str) -> Option<&str> {
    let close = label.rfind(']')?;
    let open = label[..close].rfind('[')?;
    let tag = label[open + 1..close].trim();
    (!tag.is_empty()).then_some(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(
        id: &str,
        count: u64,
        rate: f64,
        qualification: Option<&str>,
        tag: Option<&str>,
    ) -> TopStudent {
        let label = match tag {
            Some(tag) => format!("{id} — Student {id} [{tag}]"),
            None => format!("{id} — Student {id}"),
        };
        TopStudent {
            id: id.to_string(),
            label,
            count,
            rate,
            qualification: qualification.map(str::to_string),
        }
    }

    fn sample_report() -> Report {
        Report {
            global_top_students_att: vec![
                entry("S1", 12, 80.0, Some("BSc"), None),
                entry("S2", 9, 45.0, None, Some("BSc")),
                entry("S3", 9, 90.0, Some("Dip"), Some("BSc")),
                entry("S4", 3, 10.0, Some("BSc"), None),
                entry("S5", 2, 75.0, None, None),
            ],
            module_top_students_att: [(
                "CS101".to_string(),
                vec![entry("M1", 4, 50.0, None, None), entry("M2", 7, 20.0, None, None)],
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    fn ids(ranked: &[RankedStudent]) -> Vec<&str> {
        ranked.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn ranks_global_by_count_keeping_source_order_on_ties() {
        let ranked = rank_students(&sample_report(), &RankQuery::default());
        assert_eq!(ids(&ranked), vec!["S1", "S2", "S3", "S4", "S5"]);
    }

    #[test]
    fn ranks_by_rate() {
        let query = RankQuery {
            by: RankBasis::Rate,
            limit: 3,
            ..Default::default()
        };
        let ranked = rank_students(&sample_report(), &query);
        assert_eq!(ids(&ranked), vec!["S3", "S1", "S5"]);
    }

    #[test]
    fn module_scope_uses_module_list() {
        let query = RankQuery {
            module: Some("CS101".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&rank_students(&sample_report(), &query)), vec!["M2", "M1"]);

        let missing = RankQuery {
            module: Some("ZZ999".to_string()),
            ..Default::default()
        };
        assert!(rank_students(&sample_report(), &missing).is_empty());
    }

    #[test]
    fn qualification_field_wins_over_label_tag() {
        let query = RankQuery {
            qualification: Some("BSc".to_string()),
            ..Default::default()
        };
        // S3 is tagged BSc in its label but its field says Dip.
        assert_eq!(ids(&rank_students(&sample_report(), &query)), vec!["S1", "S2", "S4"]);
    }

    #[test]
    fn unmatched_qualification_is_empty_not_error() {
        let query = RankQuery {
            qualification: Some("PhD".to_string()),
            ..Default::default()
        };
        assert!(rank_students(&sample_report(), &query).is_empty());
    }

    #[test]
    fn band_filter() {
        let query = RankQuery {
            band: Some(RateBand::High),
            ..Default::default()
        };
        assert_eq!(ids(&rank_students(&sample_report(), &query)), vec!["S1", "S3", "S5"]);
    }

    #[test]
    fn qualification_and_band_filters_commute() {
        let report = sample_report();
        let source = &report.global_top_students_att;

        for band in [RateBand::Low, RateBand::Moderate, RateBand::High] {
            for qual in ["BSc", "Dip", "PhD"] {
                let ranked = rank_students(
                    &report,
                    &RankQuery {
                        qualification: Some(qual.to_string()),
                        band: Some(band),
                        limit: usize::MAX,
                        ..Default::default()
                    },
                );

                let band_then_qual: Vec<&str> = source
                    .iter()
                    .filter(|e| risk::band_of(e.rate) == band)
                    .filter(|e| matches_qualification(e, qual))
                    .map(|e| e.id.as_str())
                    .collect();
                let qual_then_band: Vec<&str> = source
                    .iter()
                    .filter(|e| matches_qualification(e, qual))
                    .filter(|e| risk::band_of(e.rate) == band)
                    .map(|e| e.id.as_str())
                    .collect();

                // The fixture is already in count order, so ranking keeps it.
                assert_eq!(ids(&ranked), band_then_qual, "{band} {qual}");
                assert_eq!(ids(&ranked), qual_then_band, "{band} {qual}");
            }
        }
    }

    #[test]
    fn qualification_must_match_exactly() {
        let query = RankQuery {
            qualification: Some(" BSc ".to_string()),
            ..Default::default()
        };
        assert!(rank_students(&sample_report(), &query).is_empty());

        let blank = RankQuery {
            qualification: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(rank_students(&sample_report(), &blank).len(), 5);
    }

    #[test]
    fn limit_truncates() {
        let query = RankQuery {
            limit: 2,
            ..Default::default()
        };
        assert_eq!(rank_students(&sample_report(), &query).len(), 2);
    }

    #[test]
    fn extracts_label_tags() {
        assert_eq!(label_tag("1 — Ada [BSc IT]"), Some("BSc IT"));
        assert_eq!(label_tag("1 — Ada [old] [Dip]"), Some("Dip"));
        assert_eq!(label_tag("1 — Ada []"), None);
        assert_eq!(label_tag("1 — Ada"), None);
    }
}
