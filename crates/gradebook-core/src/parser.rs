//! TOML exam definition parser.
//!
//! An exam definition materialises the external subject directory and
//! roster provider for one exam: the exam header, its subjects in canonical
//! order, and the students who sat it.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Exam, Roster, Student, Subject};
use crate::upload::{ADMISSION_NUMBER_COLUMN, COMMENT_COLUMN, NAME_COLUMN};

/// An exam together with its roster.
#[derive(Debug, Clone)]
pub struct ExamDefinition {
    pub exam: Exam,
    pub roster: Roster,
}

/// Intermediate TOML structure for exam definition files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    subjects: Vec<Subject>,
    #[serde(default)]
    students: Vec<Student>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    name: String,
    #[serde(default)]
    marks_locked: bool,
}

/// Parse a single TOML file into an `ExamDefinition`.
pub fn parse_exam_file(path: &Path) -> Result<ExamDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exam file: {}", path.display()))?;

    parse_exam_str(&content, path)
}

/// Parse a TOML string into an `ExamDefinition` (useful for testing).
pub fn parse_exam_str(content: &str, source_path: &Path) -> Result<ExamDefinition> {
    let parsed: TomlExamFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    Ok(ExamDefinition {
        exam: Exam {
            id: parsed.exam.id,
            name: parsed.exam.name,
            subjects: parsed.subjects,
            marks_locked: parsed.exam.marks_locked,
        },
        roster: Roster::new(parsed.students),
    })
}

/// Recursively load all `.toml` exam files from a directory.
pub fn load_exam_directory(dir: &Path) -> Result<Vec<ExamDefinition>> {
    let mut defs = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();

        if path.is_dir() {
            defs.extend(load_exam_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exam_file(&path) {
                Ok(def) => defs.push(def),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(defs)
}

/// A warning from exam definition validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The subject or student id (if applicable).
    pub item_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn new(item_id: &str, message: String) -> Self {
        Self {
            item_id: Some(item_id.to_string()),
            message,
        }
    }
}

/// Validate an exam definition for problems that would break uploads or
/// rankings.
pub fn validate_exam(def: &ExamDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let reserved = [ADMISSION_NUMBER_COLUMN, NAME_COLUMN, COMMENT_COLUMN];

    if def.exam.subjects.is_empty() {
        warnings.push(ValidationWarning {
            item_id: None,
            message: "exam has no subjects".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();
    for subject in &def.exam.subjects {
        if !seen_ids.insert(&subject.id) {
            warnings.push(ValidationWarning::new(
                &subject.id,
                format!("duplicate subject ID: {}", subject.id),
            ));
        }
        // Subject names double as CSV headers.
        if !seen_names.insert(&subject.name) {
            warnings.push(ValidationWarning::new(
                &subject.id,
                format!("duplicate subject name: {}", subject.name),
            ));
        }
        if subject.name.trim().is_empty() {
            warnings.push(ValidationWarning::new(&subject.id, "subject name is empty".into()));
        } else if subject.name.trim() != subject.name {
            warnings.push(ValidationWarning::new(
                &subject.id,
                "subject name has surrounding whitespace and will not match an upload header".into(),
            ));
        }
        if reserved.contains(&subject.name.as_str()) {
            warnings.push(ValidationWarning::new(
                &subject.id,
                format!("subject name collides with reserved column {}", subject.name),
            ));
        }
    }

    let mut seen_students = HashSet::new();
    let mut seen_admissions = HashSet::new();
    for student in def.roster.students() {
        if !seen_students.insert(&student.id) {
            warnings.push(ValidationWarning::new(
                &student.id,
                format!("duplicate student ID: {}", student.id),
            ));
        }
        if !seen_admissions.insert(&student.admission_number) {
            warnings.push(ValidationWarning::new(
                &student.id,
                format!("duplicate admission number: {}", student.admission_number),
            ));
        }
        if student.admission_number.trim().is_empty() {
            warnings.push(ValidationWarning::new(
                &student.id,
                "admission number is empty; uploads cannot reach this student".into(),
            ));
        }
    }

    warnings
}
