//! The `gradebook import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use gradebook_core::config::load_config_from;
use gradebook_core::parser;
use gradebook_core::store::ScoreStore;
use gradebook_core::upload::{parse_upload, ImportOutcome};

pub fn execute(
    exam_path: PathBuf,
    upload_path: PathBuf,
    marks_path: Option<PathBuf>,
    override_lock: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let def = parser::parse_exam_file(&exam_path)?;

    anyhow::ensure!(
        def.exam.accepts_writes(override_lock),
        "marks for '{}' are locked; pass --override-lock if you may edit them",
        def.exam.name
    );
    if def.exam.marks_locked {
        tracing::warn!(exam = %def.exam.id, "writing to a locked exam with --override-lock");
    }

    let text = std::fs::read_to_string(&upload_path)
        .with_context(|| format!("failed to read upload: {}", upload_path.display()))?;

    let outcome = parse_upload(&text, &def.exam.subjects, &def.roster, config.preview_rows)
        .with_context(|| format!("nothing imported from {}", upload_path.display()))?;

    print_preview(&outcome);

    println!(
        "Accepted {}/{} rows for {}",
        outcome.accepted_rows, outcome.data_rows, def.exam.name
    );
    if outcome.skipped_rows() > 0 {
        println!(
            "{} row(s) skipped: admission number not on the roster",
            outcome.skipped_rows()
        );
    }
    if !outcome.missing_subjects.is_empty() {
        println!(
            "No column for subject(s): {}",
            outcome.missing_subjects.join(", ")
        );
    }
    for cell in &outcome.rejected_cells {
        println!(
            "  line {} ({}): {} = '{}' ignored, expected a whole number 0-100",
            cell.line, cell.admission_number, cell.column, cell.raw
        );
    }

    let mut store = match &marks_path {
        Some(path) if path.exists() => ScoreStore::load_json(path)?,
        _ => ScoreStore::new(),
    };

    let merged = store.merge_batch(&def.exam.id, &outcome.batch);
    println!(
        "Wrote {} mark(s), cleared {}, updated {} comment(s)",
        merged.cells_written, merged.cells_cleared, merged.comments_written
    );

    match marks_path {
        Some(path) => {
            store.save_json(&path)?;
            println!("Marks saved to: {}", path.display());
        }
        None => println!("Dry run: pass --marks to keep these marks."),
    }

    Ok(())
}

fn print_preview(outcome: &ImportOutcome) {
    let Some(first) = outcome.preview.first() else {
        return;
    };

    let mut header = vec!["Adm No".to_string(), "Name".to_string()];
    header.extend(first.scores.iter().map(|(name, _)| name.clone()));
    header.push("Comment".to_string());

    let mut table = Table::new();
    table.set_header(header);

    for row in &outcome.preview {
        let mut cells = vec![Cell::new(&row.admission_number), Cell::new(&row.student_name)];
        cells.extend(row.scores.iter().map(|(_, value)| match value {
            Some(v) => Cell::new(v),
            None => Cell::new("-"),
        }));
        cells.push(Cell::new(row.comment.as_deref().unwrap_or("")));
        table.add_row(cells);
    }

    println!("{table}");
}
