//! End-to-end pipeline tests through the library.
//!
//! These walk the results-entry workflow: template, fill, upload, merge,
//! then stats, ranks and grades.

use std::path::Path;

use gradebook_core::grading::GradeScale;
use gradebook_core::parser::{parse_exam_file, ExamDefinition};
use gradebook_core::report::ResultsSheet;
use gradebook_core::statistics::{
    compute_ranks, compute_stats, compute_subject_rank, rank_roster,
};
use gradebook_core::store::ScoreStore;
use gradebook_core::upload::{generate_template, parse_upload};

fn load_fixture() -> ExamDefinition {
    parse_exam_file(Path::new("../../exams/form-two-midterm.toml")).unwrap()
}

fn import_fixture(def: &ExamDefinition) -> ScoreStore {
    let text = std::fs::read_to_string("../../exams/form-two-midterm-marks.csv").unwrap();
    let outcome = parse_upload(&text, &def.exam.subjects, &def.roster, 5).unwrap();
    let mut store = ScoreStore::new();
    store.merge_batch(&def.exam.id, &outcome.batch);
    store
}

/// Fill every blank row of a template with marks, in subject order.
fn fill(template: &str, marks: &[(&str, &[&str], &str)]) -> String {
    let mut lines = template.lines();
    let mut filled = format!("{}\n", lines.next().unwrap());
    for line in lines {
        let adm = line.split(',').next().unwrap();
        let name = line.split(',').nth(1).unwrap();
        let (_, scores, comment) = marks.iter().find(|(a, _, _)| *a == adm).unwrap();
        filled.push_str(&format!("{adm},{name},{},{comment}\n", scores.join(",")));
    }
    filled
}

#[test]
fn template_fill_import_roundtrip() {
    let def = load_fixture();
    let sample = &def.roster.students()[..2];
    let subjects = &def.exam.subjects[..2];

    let template = generate_template(subjects, sample).unwrap();
    let filled = fill(
        &template,
        &[
            ("2041", &["80", "0"][..], "Good start"),
            ("2042", &["", "67"][..], ""),
        ],
    );

    let outcome = parse_upload(&filled, subjects, &def.roster, 5).unwrap();
    assert_eq!(outcome.accepted_rows, 2);

    let mut store = ScoreStore::new();
    store.merge_batch(&def.exam.id, &outcome.batch);

    let amina = store.get_record(&def.exam.id, "stu-01");
    assert_eq!(amina.score("math").unwrap().value(), 80.0);
    assert_eq!(amina.score("eng").unwrap().value(), 0.0);
    assert_eq!(amina.comment, "Good start");

    let brian = store.get_record(&def.exam.id, "stu-02");
    assert_eq!(brian.score("math"), None);
    assert_eq!(brian.score("eng").unwrap().value(), 67.0);
    assert_eq!(brian.comment, "");
}

#[test]
fn fixture_upload_counts() {
    let def = load_fixture();
    let text = std::fs::read_to_string("../../exams/form-two-midterm-marks.csv").unwrap();
    let outcome = parse_upload(&text, &def.exam.subjects, &def.roster, 3).unwrap();

    assert_eq!(outcome.data_rows, 7);
    assert_eq!(outcome.accepted_rows, 6);
    assert_eq!(outcome.skipped_rows(), 1);
    assert_eq!(outcome.rejected_cells.len(), 1);
    assert_eq!(outcome.preview.len(), 3);
    assert_eq!(outcome.batch[0].comment.as_deref(), Some("Excellent, keep it up"));
}

#[test]
fn partial_row_keeps_valid_cells() {
    let def = load_fixture();
    let store = import_fixture(&def);

    let chebet = store.get_record(&def.exam.id, "stu-03");
    assert_eq!(chebet.score("math"), None, "150 is dropped");
    assert_eq!(chebet.score("eng").unwrap().value(), 70.0);
    assert_eq!(chebet.score("bio"), None);
    assert_eq!(chebet.comment, "Check maths script");
}

#[test]
fn exam_wide_and_class_ranks() {
    let def = load_fixture();
    let store = import_fixture(&def);

    let stats = compute_stats(&store, &def.exam.id, &def.roster.ids());
    let chebet = stats.iter().find(|s| s.student_id == "stu-03").unwrap();
    assert_eq!(chebet.average, 68.0, "absent subjects do not dilute the average");

    let ranked = compute_ranks(&stats);
    let positions: Vec<(&str, usize)> = ranked
        .iter()
        .map(|r| (r.student_id.as_str(), r.rank))
        .collect();
    assert_eq!(
        positions,
        vec![
            ("stu-01", 1),
            ("stu-03", 2),
            ("stu-02", 3),
            ("stu-05", 3),
            ("stu-04", 5),
            ("stu-06", 6),
        ]
    );

    let north = rank_roster(&store, &def.exam.id, &def.roster.group_ids("2N"));
    assert_eq!(north.last().unwrap().student_id, "stu-02");
    assert_eq!(north.last().unwrap().rank, 3);
}

#[test]
fn subject_rank_with_missing_entries() {
    let def = load_fixture();
    let store = import_fixture(&def);

    let ranked = compute_subject_rank(&store, &def.exam.id, "math", &def.roster.ids());
    assert_eq!(ranked[0].student_id, "stu-01");
    assert_eq!(ranked[1].rank, 2);
    assert_eq!(ranked[2].rank, 2, "64 and 64 tie");
    let bottom: Vec<usize> = ranked.iter().rev().take(2).map(|r| r.rank).collect();
    assert_eq!(bottom, vec![5, 5], "both students without a maths entry tie last");
}

#[test]
fn reimport_keeps_comments_and_untouched_subjects() {
    let def = load_fixture();
    let mut store = import_fixture(&def);

    let correction = "studentAdmissionNumber,Mathematics,teacherComment\n2043,72,\n";
    let outcome = parse_upload(correction, &def.exam.subjects, &def.roster, 5).unwrap();
    store.merge_batch(&def.exam.id, &outcome.batch);

    let chebet = store.get_record(&def.exam.id, "stu-03");
    assert_eq!(chebet.score("math").unwrap().value(), 72.0);
    assert_eq!(chebet.score("eng").unwrap().value(), 70.0);
    assert_eq!(chebet.comment, "Check maths script");
}

#[test]
fn results_sheet_grades() {
    let def = load_fixture();
    let store = import_fixture(&def);
    let sheet = ResultsSheet::build(&def.exam, &def.roster, &store, &GradeScale::standard());

    assert_eq!(sheet.rows[0].name, "Amina Odhiambo");
    assert_eq!(sheet.rows[0].grade.as_deref(), Some("A"));
    assert_eq!(sheet.rows[0].marks[3].grade.as_deref(), Some("A-"));

    let faith = sheet.rows.last().unwrap();
    assert_eq!(faith.student_id, "stu-06");
    assert_eq!(faith.average, 0.0);
    assert!(faith.grade.is_none());

    let math = &sheet.subjects[0];
    assert_eq!(math.entries, 4);
    assert_eq!(math.missing, 2);
}
