//! The `gradebook rank` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use gradebook_core::config::load_config_from;
use gradebook_core::grading::GradeScale;
use gradebook_core::model::{Exam, Roster};
use gradebook_core::parser;
use gradebook_core::report::ResultsSheet;
use gradebook_core::statistics::{compute_ranks, compute_stats, compute_subject_rank};
use gradebook_core::store::ScoreStore;

pub fn execute(
    exam_path: PathBuf,
    marks_path: PathBuf,
    group: Option<String>,
    subject: Option<String>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let def = parser::parse_exam_file(&exam_path)?;
    let store = ScoreStore::load_json(&marks_path)?;
    let scale = config.grade_scale();

    let roster = match &group {
        Some(g) => {
            let members: Vec<_> = def
                .roster
                .students()
                .iter()
                .filter(|s| &s.group_id == g)
                .cloned()
                .collect();
            anyhow::ensure!(
                !members.is_empty(),
                "no students in group '{g}'. Available: {:?}",
                def.roster.groups()
            );
            Roster::new(members)
        }
        None => def.roster.clone(),
    };

    let scope = group.as_deref().unwrap_or("all groups");
    match &subject {
        Some(subject_id) => {
            print_subject_ranking(&def.exam, &roster, &store, &scale, subject_id, scope)?
        }
        None => print_ranking(&def.exam, &roster, &store, &scale, scope),
    }

    if let Some(path) = output {
        let path = config.results_dir.join(path);
        let sheet = ResultsSheet::build(&def.exam, &roster, &store, &scale);
        sheet
            .save_json(&path)
            .with_context(|| format!("failed to save results sheet for {}", def.exam.name))?;
        eprintln!("Results sheet: {}", path.display());
    }

    Ok(())
}

fn print_ranking(exam: &Exam, roster: &Roster, store: &ScoreStore, scale: &GradeScale, scope: &str) {
    let stats = compute_stats(store, &exam.id, &roster.ids());
    let ranked = compute_ranks(&stats);

    let mut header = vec!["Pos", "Adm No", "Name", "Group"];
    header.extend(exam.subjects.iter().map(|s| s.name.as_str()));
    header.extend(["Total", "Average", "Grade"]);

    let mut table = Table::new();
    table.set_header(header);

    for r in &ranked {
        let Some(student) = roster.get(&r.student_id) else {
            continue;
        };
        let record = store.get_record(&exam.id, &student.id);
        let total = stats
            .iter()
            .find(|s| s.student_id == r.student_id)
            .map_or(0.0, |s| s.total);

        let mut cells = vec![
            Cell::new(r.rank),
            Cell::new(&student.admission_number),
            Cell::new(&student.name),
            Cell::new(&student.group_id),
        ];
        cells.extend(exam.subjects.iter().map(|s| match record.score(&s.id) {
            Some(score) => Cell::new(score),
            None => Cell::new("-"),
        }));
        cells.push(Cell::new(total));
        cells.push(Cell::new(format!("{:.2}", r.average)));
        cells.push(Cell::new(
            scale
                .grade_for(Some(r.average))
                .filter(|_| !record.scores.is_empty())
                .map_or("-", |b| b.label.as_str()),
        ));
        table.add_row(cells);
    }

    println!("{} ({scope})", exam.name);
    println!("{table}");
}

fn print_subject_ranking(
    exam: &Exam,
    roster: &Roster,
    store: &ScoreStore,
    scale: &GradeScale,
    subject_id: &str,
    scope: &str,
) -> Result<()> {
    let Some(subject) = exam.subject(subject_id) else {
        anyhow::bail!(
            "subject '{subject_id}' is not part of {}. Available: {:?}",
            exam.name,
            exam.subject_ids()
        );
    };

    let ranked = compute_subject_rank(store, &exam.id, &subject.id, &roster.ids());

    let mut table = Table::new();
    table.set_header(vec!["Pos", "Adm No", "Name", "Score", "Grade"]);

    for r in &ranked {
        let Some(student) = roster.get(&r.student_id) else {
            continue;
        };
        table.add_row(vec![
            Cell::new(r.rank),
            Cell::new(&student.admission_number),
            Cell::new(&student.name),
            Cell::new(r.score.map_or("-".to_string(), |s| s.to_string())),
            Cell::new(scale.grade_score(r.score).map_or("-", |b| b.label.as_str())),
        ]);
    }

    println!("{}: {} ({scope})", exam.name, subject.name);
    println!("{table}");
    Ok(())
}
