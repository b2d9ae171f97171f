//! Results sheet: a serialisable snapshot of an exam's marks and positions.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::GradeScale;
use crate::model::{Exam, Roster, Score};
use crate::statistics::{
    compute_ranks, compute_stats, compute_subject_summaries, rank_roster, SubjectSummary,
};
use crate::store::ScoreStore;

/// A complete results sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsSheet {
    /// Unique sheet identifier.
    pub id: Uuid,
    /// When the sheet was computed.
    pub created_at: DateTime<Utc>,
    pub exam: ExamSummary,
    /// One row per student, ordered by exam-wide rank.
    pub rows: Vec<ResultRow>,
    /// Per-subject distribution in canonical subject order.
    pub subjects: Vec<SubjectSummary>,
}

/// Summary of the exam (without marks).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: String,
    pub name: String,
    pub subject_count: usize,
    pub student_count: usize,
}

/// One subject cell of a result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject_id: String,
    pub score: Option<Score>,
    pub grade: Option<String>,
}

/// A student's line on the results sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    pub student_id: String,
    pub admission_number: String,
    pub name: String,
    pub group_id: String,
    pub marks: Vec<SubjectMark>,
    pub total: f64,
    pub average: f64,
    /// Overall grade; `None` when no subject has an entry.
    pub grade: Option<String>,
    pub remark: Option<String>,
    /// Position across the whole roster.
    pub rank: usize,
    /// Position within the student's class or stream.
    pub group_rank: usize,
    pub comment: String,
}

impl ResultsSheet {
    /// Compute a sheet from the current store contents.
    pub fn build(exam: &Exam, roster: &Roster, store: &ScoreStore, scale: &GradeScale) -> Self {
        let ids = roster.ids();
        let stats = compute_stats(store, &exam.id, &ids);
        let ranked = compute_ranks(&stats);

        let mut group_ranks: HashMap<String, usize> = HashMap::new();
        for group in roster.groups() {
            for r in rank_roster(store, &exam.id, &roster.group_ids(group)) {
                group_ranks.insert(r.student_id, r.rank);
            }
        }

        let stats_by_id: HashMap<&str, _> =
            stats.iter().map(|s| (s.student_id.as_str(), s)).collect();

        let rows = ranked
            .iter()
            .filter_map(|r| {
                let student = roster.get(&r.student_id)?;
                let student_stats = stats_by_id.get(r.student_id.as_str())?;
                let record = store.get_record(&exam.id, &student.id);

                let marks = exam
                    .subjects
                    .iter()
                    .map(|subject| {
                        let score = record.score(&subject.id);
                        SubjectMark {
                            subject_id: subject.id.clone(),
                            score,
                            grade: scale.grade_score(score).map(|b| b.label.clone()),
                        }
                    })
                    .collect();

                let band = if student_stats.subjects_sat() > 0 {
                    scale.grade_for(Some(student_stats.average))
                } else {
                    None
                };

                Some(ResultRow {
                    student_id: student.id.clone(),
                    admission_number: student.admission_number.clone(),
                    name: student.name.clone(),
                    group_id: student.group_id.clone(),
                    marks,
                    total: student_stats.total,
                    average: student_stats.average,
                    grade: band.map(|b| b.label.clone()),
                    remark: band.map(|b| b.remark.clone()),
                    rank: r.rank,
                    group_rank: group_ranks.get(&student.id).copied().unwrap_or(r.rank),
                    comment: record.comment,
                })
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            exam: ExamSummary {
                id: exam.id.clone(),
                name: exam.name.clone(),
                subject_count: exam.subjects.len(),
                student_count: roster.len(),
            },
            rows,
            subjects: compute_subject_summaries(store, exam, &ids),
        }
    }

    /// Save the sheet as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize results")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write results to {}", path.display()))?;
        Ok(())
    }

    /// Load a sheet from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read results from {}", path.display()))?;
        let sheet: ResultsSheet =
            serde_json::from_str(&content).context("failed to parse results JSON")?;
        Ok(sheet)
    }
}
