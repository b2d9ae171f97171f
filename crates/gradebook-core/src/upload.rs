//! Bulk mark upload and template generation.
//!
//! The upload is a comma-separated sheet with a header row. Columns are
//! located by header name, so operators may reorder them freely:
//!
//! | column                   | meaning                                |
//! |--------------------------|----------------------------------------|
//! | `studentAdmissionNumber` | required, matched against the roster   |
//! | `studentName`            | optional, for humans only              |
//! | one per subject          | header is the subject's display name   |
//! | `teacherComment`         | optional                               |
//!
//! Fields are read quote-aware, so names and comments may contain commas.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::GradebookError;
use crate::model::{Roster, Student, Subject, MAX_SCORE, MIN_SCORE};
use crate::store::ScoreUpdate;

/// Header of the identity column.
pub const ADMISSION_NUMBER_COLUMN: &str = "studentAdmissionNumber";
/// Header of the informational name column.
pub const NAME_COLUMN: &str = "studentName";
/// Header of the trailing comment column.
pub const COMMENT_COLUMN: &str = "teacherComment";

/// A subject cell that could not be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCell {
    /// 1-based line in the uploaded text.
    pub line: u64,
    pub admission_number: String,
    /// Subject display name (the column header).
    pub column: String,
    pub raw: String,
}

/// An accepted row as the operator would want to eyeball it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewRow {
    pub admission_number: String,
    pub student_name: String,
    /// Subject display name and parsed value for every located column, in
    /// exam order. Rejected cells show as `None`.
    pub scores: Vec<(String, Option<f64>)>,
    pub comment: Option<String>,
}

/// Result of parsing an upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Ready for [`crate::store::ScoreStore::merge_batch`].
    pub batch: Vec<ScoreUpdate>,
    /// Non-blank lines after the header.
    pub data_rows: usize,
    /// Rows whose admission number resolved to a roster student.
    pub accepted_rows: usize,
    /// Non-numeric or out-of-range subject cells, dropped individually.
    pub rejected_cells: Vec<RejectedCell>,
    /// Exam subjects with no matching column in the header.
    pub missing_subjects: Vec<String>,
    pub preview: Vec<PreviewRow>,
}

impl ImportOutcome {
    /// Rows silently dropped because their admission number is unknown.
    pub fn skipped_rows(&self) -> usize {
        self.data_rows - self.accepted_rows
    }
}

/// Parse an uploaded mark sheet into a batch of updates.
///
/// Fails only when the sheet has no data row or lacks the identity column.
/// Unknown admission numbers are skipped and bad cells are dropped; both are
/// visible through the counts on [`ImportOutcome`].
pub fn parse_upload(
    text: &str,
    subjects: &[Subject],
    roster: &Roster,
    preview_rows: usize,
) -> Result<ImportOutcome, GradebookError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| GradebookError::ParseStructure(format!("malformed CSV: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record);
    }

    if rows.len() < 2 {
        return Err(GradebookError::ParseStructure(
            "expected a header row and at least one data row".into(),
        ));
    }

    let header = &rows[0];
    let mut columns: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in header.iter().enumerate() {
        columns.entry(name).or_insert(idx);
    }

    let Some(&identity_col) = columns.get(ADMISSION_NUMBER_COLUMN) else {
        return Err(GradebookError::ParseStructure(format!(
            "missing required column {ADMISSION_NUMBER_COLUMN}"
        )));
    };
    let comment_col = columns.get(COMMENT_COLUMN).copied();

    let mut subject_cols = Vec::new();
    let mut missing_subjects = Vec::new();
    for subject in subjects {
        match columns.get(subject.name.as_str()) {
            Some(&idx) => subject_cols.push((subject, idx)),
            None => {
                tracing::debug!(subject = %subject.name, "no column for subject");
                missing_subjects.push(subject.name.clone());
            }
        }
    }

    let students = roster.by_admission_number();
    let mut outcome = ImportOutcome {
        data_rows: rows.len() - 1,
        missing_subjects,
        ..Default::default()
    };

    for row in &rows[1..] {
        let line = row.position().map_or(0, |p| p.line());
        let admission_number = row.get(identity_col).unwrap_or_default();

        let Some(student) = students.get(admission_number) else {
            tracing::debug!(line, admission_number, "skipping row with unknown admission number");
            continue;
        };

        let mut scores = BTreeMap::new();
        for &(subject, col) in &subject_cols {
            // A short row leaves trailing subjects untouched.
            let Some(raw) = row.get(col) else { continue };
            if raw.is_empty() {
                scores.insert(subject.id.clone(), None);
                continue;
            }
            match parse_mark(raw) {
                Some(value) => {
                    scores.insert(subject.id.clone(), Some(value));
                }
                None => {
                    tracing::debug!(line, subject = %subject.name, raw, "rejecting cell");
                    outcome.rejected_cells.push(RejectedCell {
                        line,
                        admission_number: admission_number.to_string(),
                        column: subject.name.clone(),
                        raw: raw.to_string(),
                    });
                }
            }
        }

        let comment = comment_col
            .and_then(|c| row.get(c))
            .filter(|c| !c.is_empty())
            .map(String::from);

        if outcome.preview.len() < preview_rows {
            outcome.preview.push(PreviewRow {
                admission_number: admission_number.to_string(),
                student_name: student.name.clone(),
                scores: subject_cols
                    .iter()
                    .map(|(s, _)| (s.name.clone(), scores.get(&s.id).copied().flatten()))
                    .collect(),
                comment: comment.clone(),
            });
        }

        outcome.batch.push(ScoreUpdate {
            student_id: student.id.clone(),
            scores,
            comment,
        });
        outcome.accepted_rows += 1;
    }

    tracing::info!(
        data_rows = outcome.data_rows,
        accepted = outcome.accepted_rows,
        rejected_cells = outcome.rejected_cells.len(),
        "parsed mark upload"
    );

    Ok(outcome)
}

/// Whole-number mark in [0, 100], or `None`.
fn parse_mark(raw: &str) -> Option<f64> {
    let value = raw.parse::<i64>().ok()? as f64;
    (MIN_SCORE..=MAX_SCORE).contains(&value).then_some(value)
}

/// Header row in canonical order.
pub fn template_header(subjects: &[Subject]) -> Vec<&str> {
    let mut header = vec![ADMISSION_NUMBER_COLUMN, NAME_COLUMN];
    header.extend(subjects.iter().map(|s| s.name.as_str()));
    header.push(COMMENT_COLUMN);
    header
}

/// Generate the blank upload template for an exam.
///
/// One row per sample student with identity filled in and every mark and
/// the comment left blank.
pub fn generate_template(subjects: &[Subject], sample: &[Student]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(template_header(subjects))
        .context("failed to write template header")?;

    for student in sample {
        let mut row = vec![student.admission_number.as_str(), student.name.as_str()];
        row.extend(std::iter::repeat("").take(subjects.len() + 1));
        writer
            .write_record(&row)
            .with_context(|| format!("failed to write template row for {}", student.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("failed to flush template")?;
    String::from_utf8(bytes).context("template is not valid UTF-8")
}
