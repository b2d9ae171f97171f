//! The `gradebook template` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use gradebook_core::parser;
use gradebook_core::upload::generate_template;

pub fn execute(exam_path: PathBuf, sample: Option<usize>, output: Option<PathBuf>) -> Result<()> {
    let def = parser::parse_exam_file(&exam_path)?;

    let students = def.roster.students();
    let sample = match sample {
        Some(n) => &students[..n.min(students.len())],
        None => students,
    };

    let template = generate_template(&def.exam.subjects, sample)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &template)
                .with_context(|| format!("failed to write template to {}", path.display()))?;
            eprintln!(
                "Template for {} ({} subjects, {} students) written to: {}",
                def.exam.name,
                def.exam.subjects.len(),
                sample.len(),
                path.display()
            );
        }
        None => print!("{template}"),
    }

    Ok(())
}
