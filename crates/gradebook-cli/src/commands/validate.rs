//! The `gradebook validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradebook_core::parser;

pub fn execute(exam_path: PathBuf) -> Result<()> {
    let defs = if exam_path.is_dir() {
        parser::load_exam_directory(&exam_path)?
    } else {
        vec![parser::parse_exam_file(&exam_path)?]
    };

    let mut total_warnings = 0;

    for def in &defs {
        println!(
            "Exam: {} ({} subjects, {} students{})",
            def.exam.name,
            def.exam.subjects.len(),
            def.roster.len(),
            if def.exam.marks_locked { ", locked" } else { "" }
        );

        let warnings = parser::validate_exam(def);
        for w in &warnings {
            let prefix = w
                .item_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All exam definitions valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
