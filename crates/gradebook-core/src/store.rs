//! Per-exam score and comment storage.
//!
//! The store is the single source of truth the aggregator reads. It is an
//! explicit value owned by the session; aggregates are never cached here.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::GradebookError;
use crate::model::{Score, ScoreRecord};

/// One row of a batch: per-subject values plus an optional comment.
///
/// A `None` score value clears that subject ("no entry"). Subjects that are
/// not keys of `scores` are left untouched by a merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub student_id: String,
    #[serde(default)]
    pub scores: BTreeMap<String, Option<f64>>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// A cell that `merge_batch` refused to store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedCell {
    pub student_id: String,
    pub subject_id: String,
    pub value: f64,
}

/// What a batch merge actually changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Rows that were applied (every row is, even if all its cells dropped).
    pub rows_applied: usize,
    /// Numeric values written.
    pub cells_written: usize,
    /// Subjects set back to "no entry".
    pub cells_cleared: usize,
    /// Comments that replaced the previous one.
    pub comments_written: usize,
    /// Out-of-range values that were not stored.
    pub dropped: Vec<DroppedCell>,
}

/// Score records keyed by exam id, then student id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreStore {
    #[serde(default)]
    exams: BTreeMap<String, BTreeMap<String, ScoreRecord>>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_mut(&mut self, exam_id: &str, student_id: &str) -> &mut ScoreRecord {
        self.exams
            .entry(exam_id.to_string())
            .or_default()
            .entry(student_id.to_string())
            .or_default()
    }

    /// Write or clear a single subject score.
    ///
    /// Fails with [`GradebookError::OutOfRange`] without touching the store
    /// if the value is outside [0, 100].
    pub fn set_score(
        &mut self,
        exam_id: &str,
        student_id: &str,
        subject_id: &str,
        value: Option<f64>,
    ) -> Result<(), GradebookError> {
        let score = value.map(Score::new).transpose()?;
        let record = self.record_mut(exam_id, student_id);
        match score {
            Some(s) => {
                record.scores.insert(subject_id.to_string(), s);
            }
            None => {
                record.scores.remove(subject_id);
            }
        }
        Ok(())
    }

    /// Replace a student's comment verbatim.
    pub fn set_comment(&mut self, exam_id: &str, student_id: &str, text: &str) {
        self.record_mut(exam_id, student_id).comment = text.to_string();
    }

    /// Apply a batch of updates on top of the existing records.
    ///
    /// Out-of-range values are dropped cell by cell; everything else in the
    /// batch is still applied. An absent or empty comment never erases an
    /// existing one.
    pub fn merge_batch(&mut self, exam_id: &str, updates: &[ScoreUpdate]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for update in updates {
            let record = self.record_mut(exam_id, &update.student_id);

            for (subject_id, value) in &update.scores {
                match value.map(Score::new).transpose() {
                    Ok(Some(score)) => {
                        record.scores.insert(subject_id.clone(), score);
                        outcome.cells_written += 1;
                    }
                    Ok(None) => {
                        record.scores.remove(subject_id);
                        outcome.cells_cleared += 1;
                    }
                    Err(_) => {
                        let value = value.unwrap_or_default();
                        tracing::debug!(
                            student = %update.student_id,
                            subject = %subject_id,
                            value,
                            "dropping out-of-range score"
                        );
                        outcome.dropped.push(DroppedCell {
                            student_id: update.student_id.clone(),
                            subject_id: subject_id.clone(),
                            value,
                        });
                    }
                }
            }

            if let Some(comment) = update.comment.as_deref().filter(|c| !c.is_empty()) {
                record.comment = comment.to_string();
                outcome.comments_written += 1;
            }

            outcome.rows_applied += 1;
        }

        tracing::info!(
            exam = exam_id,
            rows = outcome.rows_applied,
            written = outcome.cells_written,
            cleared = outcome.cells_cleared,
            dropped = outcome.dropped.len(),
            "merged score batch"
        );

        outcome
    }

    /// The current record, empty if the student was never written.
    pub fn get_record(&self, exam_id: &str, student_id: &str) -> ScoreRecord {
        self.record(exam_id, student_id).cloned().unwrap_or_default()
    }

    /// Borrow a record without materialising an empty one.
    pub fn record(&self, exam_id: &str, student_id: &str) -> Option<&ScoreRecord> {
        self.exams.get(exam_id).and_then(|m| m.get(student_id))
    }

    /// Number of students with a record for the exam.
    pub fn record_count(&self, exam_id: &str) -> usize {
        self.exams.get(exam_id).map_or(0, |m| m.len())
    }

    /// Save the store as a JSON marks file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize marks")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write marks to {}", path.display()))?;
        Ok(())
    }

    /// Load a store from a JSON marks file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read marks from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse marks file {}", path.display()))
    }
}
