use std::fmt::{Display, Write};

use chrono::{DateTime, Utc};

use crate::models::{LabeledSeries, Report, STUDENTS_UNAVAILABLE};
use crate::modules::{self, Basis, ModuleQuery, Scope};
use crate::ranking::{self, RankQuery};
use crate::risk;
use crate::series;

/// Markdown digest of the dashboard: overview, risk mix, reasons, weekly trend,
/// top modules and top absentees.
pub fn build_summary(report: &Report, source: &str, generated_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Dashboard Report");
    let _ = writeln!(
        output,
        "Generated from {} on {}",
        source,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Records: {}", report.total_records);
    match report.unique_students {
        Some(count) => {
            let _ = writeln!(output, "- Students: {count}");
        }
        None => {
            let _ = writeln!(output, "- Students: not available");
        }
    }
    let _ = writeln!(output, "- Modules: {}", report.modules.len());
    let _ = writeln!(output, "- Weeks: {}", report.weeks.len());

    write_section(
        &mut output,
        "Risk Mix",
        &series::ranked_counts(&report.risk_counts),
        "No risk levels recorded.",
    );
    write_section(
        &mut output,
        "Top Reasons",
        &series::ranked_counts(&report.by_reason),
        "No reasons recorded.",
    );
    write_section(
        &mut output,
        "Resolution Status",
        &series::ranked_counts(&report.resolved_counts),
        "No resolution data recorded.",
    );
    write_section(
        &mut output,
        "Non-attendance by Week",
        &series::weekly_series(&report.by_week_attendance),
        "No non-attendance recorded.",
    );

    let resolved = series::weekly_series(&report.resolved_rate);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Resolved Rate by Week");
    if resolved.is_empty() {
        let _ = writeln!(output, "No resolution data recorded.");
    } else {
        for (week, rate) in resolved.iter() {
            let _ = writeln!(output, "- {week}: {rate:.1}%");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk by Week");
    if report.week_risk.weeks.is_empty() || report.week_risk.series.is_empty() {
        let _ = writeln!(output, "No weekly risk data recorded.");
    } else {
        let _ = writeln!(output, "Weeks: {}", report.week_risk.weeks.join(", "));
        for line in &report.week_risk.series {
            let data: Vec<String> = line.data.iter().map(u64::to_string).collect();
            let _ = writeln!(output, "- {}: {}", line.name, data.join(" "));
        }
    }

    let top_modules = modules::module_counts(
        report,
        &ModuleQuery {
            basis: Basis::Attendance,
            scope: Scope::Top(10),
            ..Default::default()
        },
    );
    write_section(
        &mut output,
        "Modules with Most Non-attendance",
        &top_modules,
        "No module attendance data recorded.",
    );

    let students = ranking::rank_students(report, &RankQuery::default());
    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Missing the Most Sessions");
    if !report.student_enabled {
        let _ = writeln!(output, "{STUDENTS_UNAVAILABLE}");
    } else if students.is_empty() {
        let _ = writeln!(output, "No student absences recorded.");
    } else {
        for student in &students {
            let _ = writeln!(
                output,
                "- {}: {} absences ({:.0}%, {})",
                student.label,
                student.count,
                student.rate,
                risk::band_of(student.rate)
            );
        }
    }

    let repeated = &report.repeated_students;
    write_section(
        &mut output,
        "Repeated Students",
        &series::ranked_counts(&repeated.top_counts),
        "No student appears more than once.",
    );
    if !repeated.preview_rows.is_empty() {
        let _ = writeln!(output, "({} sample rows in the report)", repeated.preview_rows.len());
    }

    output
}

fn write_section<V: Display>(
    output: &mut String,
    title: &str,
    series: &LabeledSeries<V>,
    empty_line: &str,
) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");

    if series.is_empty() {
        let _ = writeln!(output, "{empty_line}");
        return;
    }
    for (label, value) in series.iter() {
        let _ = writeln!(output, "- {label}: {value}");
    }
}
