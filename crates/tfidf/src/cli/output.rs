//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, CellAlignment, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use tfidf_pipeline::{RunReport, StageReport};

/// JSON output for a completed run.
#[derive(Serialize)]
struct JsonRunOutput<'a> {
    /// Overall status.
    status: &'static str,
    /// The full run report.
    #[serde(flatten)]
    report: &'a RunReport,
}

/// Prints a completed run as a table, or as JSON when `json` is set.
pub fn print_report(report: &RunReport, json: bool) -> ExitCode {
    if json {
        let output = JsonRunOutput {
            status: "complete",
            report,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json_str) => println!("{json_str}"),
            Err(e) => {
                eprintln!("error: failed to serialize JSON: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{}", stage_table(&report.stages));
    println!();
    println!("Outputs:");
    for stage in &report.stages {
        println!("  {:<28} {}", stage.name, stage.output.display());
    }
    println!();
    println!(
        "Pipeline completed in {} ms (top {} per document).",
        report.elapsed_ms, report.top_n
    );
    ExitCode::SUCCESS
}

/// Builds the per-stage summary table.
fn stage_table(stages: &[StageReport]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        "Stage", "State", "Tasks", "Records in", "Records out", "Skipped", "Dropped", "Time",
    ]);

    for stage in stages {
        let tasks = if stage.reduce_tasks > 0 {
            format!("{}m / {}r", stage.map_tasks, stage.reduce_tasks)
        } else {
            format!("{}m", stage.map_tasks)
        };
        table.add_row(vec![
            Cell::new(&stage.name),
            Cell::new(stage.state.to_string()),
            Cell::new(tasks),
            numeric(stage.counters.input_records),
            numeric(stage.counters.total_output_records()),
            numeric(stage.counters.malformed_records),
            numeric(stage.counters.dropped_records),
            Cell::new(format!("{} ms", stage.elapsed_ms)).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// A right-aligned count cell.
fn numeric(value: u64) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}
