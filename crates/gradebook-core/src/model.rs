//! Core data model types for gradebook.
//!
//! Students, subjects and exams are owned by external directories and are
//! treated as immutable here. Score records are the only mutable state and
//! live in [`crate::store::ScoreStore`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GradebookError;

/// Lowest score a student can earn on a subject.
pub const MIN_SCORE: f64 = 0.0;
/// Highest score a student can earn on a subject.
pub const MAX_SCORE: f64 = 100.0;

/// A student as supplied by the roster provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Admission number, used to match upload rows.
    pub admission_number: String,
    /// Class or stream the student belongs to.
    #[serde(default)]
    pub group_id: String,
}

/// A subject as supplied by the curriculum directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    /// Display name, also the CSV column header for this subject.
    pub name: String,
}

/// An assessment event with an ordered subject list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: String,
    pub name: String,
    /// Subjects in canonical column order.
    #[serde(default)]
    pub subjects: Vec<Subject>,
    /// When set, only privileged callers may write marks.
    #[serde(default)]
    pub marks_locked: bool,
}

impl Exam {
    /// Whether a caller with the given privilege may write to this exam.
    ///
    /// The engine never calls this itself; authorization is the caller's job.
    pub fn accepts_writes(&self, privileged: bool) -> bool {
        !self.marks_locked || privileged
    }

    /// Subject ids in canonical order.
    pub fn subject_ids(&self) -> Vec<&str> {
        self.subjects.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == subject_id)
    }
}

/// A validated score in [0, 100].
///
/// "No entry" is never a `Score`; it is the absence of one (`Option<Score>`),
/// so an earned zero stays distinguishable from an ungraded subject.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    /// Validate a raw value. NaN and anything outside [0, 100] is rejected.
    pub fn new(value: f64) -> Result<Self, GradebookError> {
        if (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Score(value))
        } else {
            Err(GradebookError::OutOfRange { value })
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = GradebookError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Score::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student's marks and comment for one exam.
///
/// Subjects without an entry are simply absent from `scores`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(default)]
    pub scores: BTreeMap<String, Score>,
    #[serde(default)]
    pub comment: String,
}

impl ScoreRecord {
    /// The score for a subject, or `None` for "no entry".
    pub fn score(&self, subject_id: &str) -> Option<Score> {
        self.scores.get(subject_id).copied()
    }

    /// Present scores, following the given subject order.
    pub fn present_scores<'a, I>(&self, subject_ids: I) -> Vec<(String, Score)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        subject_ids
            .into_iter()
            .filter_map(|id| self.score(id).map(|s| (id.to_string(), s)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.comment.is_empty()
    }
}

/// The ordered list of students under consideration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Self {
        Self { students }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }

    /// Student ids in roster order (exam-wide comparison set).
    pub fn ids(&self) -> Vec<String> {
        self.students.iter().map(|s| s.id.clone()).collect()
    }

    /// Student ids of a single class or stream, in roster order.
    pub fn group_ids(&self, group_id: &str) -> Vec<String> {
        self.students
            .iter()
            .filter(|s| s.group_id == group_id)
            .map(|s| s.id.clone())
            .collect()
    }

    /// Distinct group ids in order of first appearance.
    pub fn groups(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for s in &self.students {
            if !seen.contains(&s.group_id.as_str()) {
                seen.push(s.group_id.as_str());
            }
        }
        seen
    }

    /// Lookup table from admission number to student.
    pub fn by_admission_number(&self) -> HashMap<&str, &Student> {
        self.students
            .iter()
            .map(|s| (s.admission_number.as_str(), s))
            .collect()
    }
}

impl From<Vec<Student>> for Roster {
    fn from(students: Vec<Student>) -> Self {
        Roster::new(students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, adm: &str, group: &str) -> Student {
        Student {
            id: id.into(),
            name: format!("Student {id}"),
            admission_number: adm.into(),
            group_id: group.into(),
        }
    }

    #[test]
    fn score_bounds() {
        assert!(Score::new(0.0).is_ok());
        assert!(Score::new(100.0).is_ok());
        assert_eq!(
            Score::new(100.5),
            Err(GradebookError::OutOfRange { value: 100.5 })
        );
        assert!(Score::new(-1.0).is_err());
        assert!(Score::new(f64::NAN).is_err());
    }

    #[test]
    fn score_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Score>("72").is_ok());
        assert!(serde_json::from_str::<Score>("172").is_err());
    }

    #[test]
    fn zero_is_an_entry() {
        let mut record = ScoreRecord::default();
        record.scores.insert("math".into(), Score::new(0.0).unwrap());
        assert_eq!(record.score("math").map(Score::value), Some(0.0));
        assert_eq!(record.score("english"), None);
    }

    #[test]
    fn present_scores_follow_subject_order() {
        let mut record = ScoreRecord::default();
        record.scores.insert("b".into(), Score::new(50.0).unwrap());
        record.scores.insert("a".into(), Score::new(60.0).unwrap());
        let present = record.present_scores(["b", "c", "a"]);
        let ids: Vec<&str> = present.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn roster_groups() {
        let roster = Roster::new(vec![
            student("s1", "A1", "2N"),
            student("s2", "A2", "2S"),
            student("s3", "A3", "2N"),
        ]);
        assert_eq!(roster.groups(), vec!["2N", "2S"]);
        assert_eq!(roster.group_ids("2N"), vec!["s1", "s3"]);
        assert_eq!(roster.by_admission_number()["A2"].id, "s2");
    }

    #[test]
    fn lock_flag() {
        let mut exam = Exam {
            id: "e".into(),
            name: "Midterm".into(),
            subjects: vec![],
            marks_locked: false,
        };
        assert!(exam.accepts_writes(false));
        exam.marks_locked = true;
        assert!(!exam.accepts_writes(false));
        assert!(exam.accepts_writes(true));
    }
}
