//! Grade banding.
//!
//! A [`GradeScale`] partitions [0, 100] into contiguous, inclusive integer
//! bands. The table is checked once when it is built; lookups never fail on
//! a well-formed scale.

use serde::{Deserialize, Serialize};

use crate::error::GradebookError;
use crate::model::{Score, MAX_SCORE, MIN_SCORE};

/// A named score range with a canned remark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeBand {
    /// Inclusive lower bound.
    pub min_score: f64,
    /// Inclusive upper bound.
    pub max_score: f64,
    pub label: String,
    #[serde(default)]
    pub remark: String,
}

impl GradeBand {
    pub fn new(min_score: f64, max_score: f64, label: &str, remark: &str) -> Self {
        Self {
            min_score,
            max_score,
            label: label.to_string(),
            remark: remark.to_string(),
        }
    }

    fn contains(&self, score: f64) -> bool {
        score >= self.min_score && score <= self.max_score
    }
}

/// A validated, contiguous grade-band table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GradeBand>", into = "Vec<GradeBand>")]
pub struct GradeScale {
    /// Sorted by ascending `min_score`.
    bands: Vec<GradeBand>,
}

impl GradeScale {
    /// Build a scale, rejecting gaps, overlaps, fractional bounds and
    /// partial coverage of [0, 100].
    pub fn new(mut bands: Vec<GradeBand>) -> Result<Self, GradebookError> {
        if bands.is_empty() {
            return Err(GradebookError::Configuration("no grade bands defined".into()));
        }

        for band in &bands {
            if band.label.trim().is_empty() {
                return Err(GradebookError::Configuration(format!(
                    "band {}-{} has an empty label",
                    band.min_score, band.max_score
                )));
            }
            if band.min_score.fract() != 0.0 || band.max_score.fract() != 0.0 {
                return Err(GradebookError::Configuration(format!(
                    "band {} must use whole-number bounds",
                    band.label
                )));
            }
            if band.min_score > band.max_score {
                return Err(GradebookError::Configuration(format!(
                    "band {} has min {} above max {}",
                    band.label, band.min_score, band.max_score
                )));
            }
        }

        bands.sort_by(|a, b| a.min_score.total_cmp(&b.min_score));

        let first = &bands[0];
        if first.min_score != MIN_SCORE {
            return Err(GradebookError::Configuration(format!(
                "lowest band {} starts at {}, expected {MIN_SCORE}",
                first.label, first.min_score
            )));
        }
        let last = &bands[bands.len() - 1];
        if last.max_score != MAX_SCORE {
            return Err(GradebookError::Configuration(format!(
                "highest band {} ends at {}, expected {MAX_SCORE}",
                last.label, last.max_score
            )));
        }

        for pair in bands.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            let expected = lower.max_score + 1.0;
            if upper.min_score > expected {
                return Err(GradebookError::Configuration(format!(
                    "gap between {} (ends {}) and {} (starts {})",
                    lower.label, lower.max_score, upper.label, upper.min_score
                )));
            }
            if upper.min_score < expected {
                return Err(GradebookError::Configuration(format!(
                    "{} overlaps {}",
                    upper.label, lower.label
                )));
            }
        }

        Ok(Self { bands })
    }

    /// The 12-point A to E scale used for secondary-school report forms.
    pub fn standard() -> Self {
        Self {
            bands: vec![
                GradeBand::new(0.0, 29.0, "E", "Very poor"),
                GradeBand::new(30.0, 34.0, "D-", "Poor"),
                GradeBand::new(35.0, 39.0, "D", "Weak"),
                GradeBand::new(40.0, 44.0, "D+", "Below average"),
                GradeBand::new(45.0, 49.0, "C-", "Fair"),
                GradeBand::new(50.0, 54.0, "C", "Average"),
                GradeBand::new(55.0, 59.0, "C+", "Above average"),
                GradeBand::new(60.0, 64.0, "B-", "Fairly good"),
                GradeBand::new(65.0, 69.0, "B", "Good"),
                GradeBand::new(70.0, 74.0, "B+", "Very good"),
                GradeBand::new(75.0, 79.0, "A-", "Excellent"),
                GradeBand::new(80.0, 100.0, "A", "Outstanding"),
            ],
        }
    }

    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    /// Band for a score or average; `None` for "no entry".
    ///
    /// Fractional values are floored before lookup, so an average of 79.9
    /// still earns the 75-79 band. Values outside [0, 100] match nothing.
    pub fn grade_for(&self, score: Option<f64>) -> Option<&GradeBand> {
        let score = score?;
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return None;
        }
        let floored = score.floor();
        self.bands.iter().find(|b| b.contains(floored))
    }

    /// Band for a stored subject score.
    pub fn grade_score(&self, score: Option<Score>) -> Option<&GradeBand> {
        self.grade_for(score.map(Score::value))
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<GradeBand>> for GradeScale {
    type Error = GradebookError;

    fn try_from(bands: Vec<GradeBand>) -> Result<Self, Self::Error> {
        GradeScale::new(bands)
    }
}

impl From<GradeScale> for Vec<GradeBand> {
    fn from(scale: GradeScale) -> Self {
        scale.bands
    }
}
