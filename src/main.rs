use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod drilldown;
mod export;
mod heatmap;
mod loader;
mod models;
mod modules;
mod ranking;
mod report;
mod risk;
mod series;
mod weeks;

use heatmap::{HeatMode, HeatSort, HeatmapQuery};
use modules::{Basis, ModuleQuery, Scope};
use ranking::{RankBasis, RankQuery};
use risk::RateBand;

#[derive(Parser)]
#[command(name = "attendance-insights")]
#[command(about = "Query an attendance analytics report from the command line", long_about = None)]
struct Cli {
    /// Report JSON file (falls back to ATTENDANCE_REPORT)
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank modules by absence count
    Modules {
        /// Restrict to one week label; all weeks when omitted
        #[arg(long)]
        week: Option<String>,
        #[arg(long, value_enum, default_value_t = Basis::All)]
        basis: Basis,
        #[arg(long)]
        qualification: Option<String>,
        /// `all`, `top3`, `top5`, `top10` or any `topN`
        #[arg(long, default_value = "all")]
        scope: Scope,
    },
    /// Student by week absence matrix for one module
    Heatmap {
        #[arg(long)]
        module: String,
        #[arg(long)]
        qualification: Option<String>,
        #[arg(long, value_enum, default_value_t = HeatSort::TotalDesc)]
        sort: HeatSort,
        #[arg(long, default_value_t = heatmap::DEFAULT_TOP_N)]
        top_n: usize,
        /// First week number to include
        #[arg(long)]
        from_week: Option<u64>,
        /// Last week number to include
        #[arg(long)]
        to_week: Option<u64>,
        #[arg(long, value_enum, default_value_t = HeatMode::Binary)]
        mode: HeatMode,
        /// Write the selection as CSV; without a value writes heatmap_<module>.csv
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        csv: Option<String>,
    },
    /// Students with the most absences
    Students {
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        qualification: Option<String>,
        #[arg(long, value_enum)]
        band: Option<RateBand>,
        #[arg(long, value_enum, default_value_t = RankBasis::Count)]
        by: RankBasis,
        #[arg(long, default_value_t = ranking::DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Drill down into one student by id or label
    Student {
        #[arg(value_name = "ID_OR_LABEL")]
        query: String,
    },
    /// Generate a markdown report
    Summary {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry().with(stderr_layer).init();

    let cli = Cli::parse();
    let path = loader::report_path(cli.report)?;
    let report = loader::load_report(&path)?;

    match cli.command {
        Commands::Modules {
            week,
            basis,
            qualification,
            scope,
        } => {
            let query = ModuleQuery {
                week,
                basis,
                qualification,
                scope,
            };
            debug!(?query, "Module counts");
            let counts = modules::module_counts(&report, &query);

            if cli.json {
                return print_json(&counts);
            }
            if counts.is_empty() {
                println!("No module counts for this selection.");
                return Ok(());
            }
            println!("Modules by absences ({basis:?}, {scope}):");
            for (module, count) in counts.iter() {
                println!("- {module}: {count}");
            }
        }
        Commands::Heatmap {
            module,
            qualification,
            sort,
            top_n,
            from_week,
            to_week,
            mode,
            csv,
        } => {
            let query = HeatmapQuery {
                qualification,
                sort,
                top_n,
                from_week,
                to_week,
                ..HeatmapQuery::new(module)
            };
            debug!(?query, "Heatmap");
            let result = heatmap::build_heatmap(&report, &query);

            if let Some(target) = csv {
                let out = if target.is_empty() {
                    export::default_file_name(&result.module)
                } else {
                    PathBuf::from(target)
                };
                export::write_csv_file(&out, &result)?;
                info!(path = %out.display(), rows = result.rows.len(), "Heatmap CSV written");
            }

            if cli.json {
                return print_json(&result);
            }
            if result.rows.is_empty() {
                println!("No data for this module.");
                return Ok(());
            }
            if result.has_no_weeks() {
                println!("No weeks fall inside the selected range.");
                return Ok(());
            }

            println!("{} absences by week: {}", result.module, result.weeks.join(", "));
            for (row, cells) in result.rows.iter().zip(result.matrix(mode)) {
                let cells: Vec<String> = cells
                    .iter()
                    .map(|v| match mode {
                        HeatMode::Binary => format!("{v:.0}"),
                        HeatMode::Rate => format!("{v:.2}"),
                    })
                    .collect();
                println!(
                    "- {} {} [{}] total {} ({}%)",
                    row.id,
                    row.name,
                    cells.join(" "),
                    row.total,
                    row.rate_percent
                );
            }
        }
        Commands::Students {
            module,
            qualification,
            band,
            by,
            limit,
        } => {
            if !report.student_enabled {
                println!("{}", models::STUDENTS_UNAVAILABLE);
                return Ok(());
            }
            let query = RankQuery {
                module,
                qualification,
                band,
                by,
                limit,
            };
            debug!(?query, "Student ranking");
            let students = ranking::rank_students(&report, &query);

            if cli.json {
                return print_json(&students);
            }
            if students.is_empty() {
                println!("No students match this selection.");
                return Ok(());
            }
            println!("Students missing the most sessions:");
            for student in &students {
                println!(
                    "- {} ({} absences, {:.0}% {})",
                    student.label,
                    student.count,
                    student.rate,
                    risk::band_of(student.rate)
                );
            }
        }
        Commands::Student { query } => {
            if !report.student_enabled {
                println!("{}", models::STUDENTS_UNAVAILABLE);
                return Ok(());
            }
            let sid = drilldown::resolve_student(&report, &query)
                .context("pick a student by id or label")?;
            let view = drilldown::drilldown(&report, &sid);

            if cli.json {
                return print_json(&view);
            }
            print_drilldown(&view);
        }
        Commands::Summary { out } => {
            let summary =
                report::build_summary(&report, &path.display().to_string(), chrono::Utc::now());
            std::fs::write(&out, summary)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_drilldown(view: &drilldown::StudentDrilldown) {
    if view.qualification.is_empty() {
        println!("Selected: {}", view.label);
    } else {
        println!("Selected: {} · Qualification: {}", view.label, view.qualification);
    }
    if view.is_empty() {
        println!("No attendance data for this student.");
        return;
    }

    if !view.modules.is_empty() {
        println!("Non-attendance by module:");
        for (module, count) in view.modules.iter() {
            println!("- {module}: {count}");
        }
    }
    if !view.weeks.is_empty() {
        println!("Non-attendance by week:");
        for (week, count) in view.weeks.iter() {
            println!("- {week}: {count}");
        }
    }
    if !view.risk_by_week.series.is_empty() {
        println!("Risk by week ({}):", view.risk_by_week.weeks.join(", "));
        for line in &view.risk_by_week.series {
            let data: Vec<String> = line.data.iter().map(u64::to_string).collect();
            println!("- {}: {}", line.name, data.join(" "));
        }
    }
    if view.risk_by_module.is_empty() {
        println!("No risk information for this student.");
    } else {
        println!("Max risk by module:");
        for (module, risk) in &view.risk_by_module {
            println!("- {module}: {risk}");
        }
    }
}
