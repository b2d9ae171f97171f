//! Totals, averages and competition ranking.
//!
//! Everything here is recomputed from the [`ScoreStore`] on each call. A
//! ranking is always relative to the roster passed in: pass a whole exam
//! roster for exam-wide positions, or one class for class positions.

use serde::{Deserialize, Serialize};

use crate::model::{Exam, Score};
use crate::store::ScoreStore;

/// Sort key for a subject with no entry. Below any real score, so "no entry"
/// always ranks last and never ties with an earned zero.
const NO_ENTRY_KEY: f64 = -1.0;

/// Averages closer than this are treated as a tie.
const TIE_EPSILON: f64 = 1e-9;

/// Derived marks for one student in one exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStats {
    pub student_id: String,
    /// Present scores by subject id.
    pub scores: Vec<(String, Score)>,
    pub total: f64,
    /// Mean over present subjects only; 0 when nothing is present.
    pub average: f64,
}

impl StudentStats {
    pub fn subjects_sat(&self) -> usize {
        self.scores.len()
    }
}

/// A student's position in a ranking by average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStudent {
    pub student_id: String,
    pub average: f64,
    pub rank: usize,
}

/// A student's position in a single-subject ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRank {
    pub student_id: String,
    pub score: Option<Score>,
    pub rank: usize,
}

/// Distribution of one subject's marks over a roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject_id: String,
    pub subject_name: String,
    pub entries: usize,
    pub missing: usize,
    /// Mean of present scores; 0 when there are none.
    pub mean: f64,
    pub highest: Option<Score>,
    pub lowest: Option<Score>,
}

/// Compute total and average for every student in the roster, in roster order.
pub fn compute_stats(store: &ScoreStore, exam_id: &str, roster: &[String]) -> Vec<StudentStats> {
    roster
        .iter()
        .map(|student_id| {
            let scores: Vec<(String, Score)> = store
                .record(exam_id, student_id)
                .map(|r| r.scores.iter().map(|(k, v)| (k.clone(), *v)).collect())
                .unwrap_or_default();

            let total: f64 = scores.iter().map(|(_, s)| s.value()).sum();
            let average = if scores.is_empty() {
                0.0
            } else {
                total / scores.len() as f64
            };

            StudentStats {
                student_id: student_id.clone(),
                scores,
                total,
                average,
            }
        })
        .collect()
}

/// Competition ranks for values already sorted in descending order.
///
/// Equal neighbours share a rank; the next distinct value takes its 1-based
/// position, e.g. `[90, 80, 80, 70]` ranks `[1, 2, 2, 4]`.
pub fn competition_ranks(sorted_desc: &[f64]) -> Vec<usize> {
    sorted_desc
        .iter()
        .enumerate()
        .scan(None::<(f64, usize)>, |prev, (i, &value)| {
            let rank = match *prev {
                Some((last, rank)) if (last - value).abs() < TIE_EPSILON => rank,
                _ => i + 1,
            };
            *prev = Some((value, rank));
            Some(rank)
        })
        .collect()
}

/// Order `items` by `key` descending and attach competition ranks.
///
/// The sort is stable, so tied items keep their roster order.
fn rank_by<T, F>(mut items: Vec<T>, key: F) -> Vec<(T, usize)>
where
    F: Fn(&T) -> f64,
{
    items.sort_by(|a, b| key(b).total_cmp(&key(a)));
    let keys: Vec<f64> = items.iter().map(&key).collect();
    items.into_iter().zip(competition_ranks(&keys)).collect()
}

/// Rank students by average, highest first.
pub fn compute_ranks(stats: &[StudentStats]) -> Vec<RankedStudent> {
    let entries: Vec<(&str, f64)> = stats
        .iter()
        .map(|s| (s.student_id.as_str(), s.average))
        .collect();

    rank_by(entries, |(_, avg)| *avg)
        .into_iter()
        .map(|((student_id, average), rank)| RankedStudent {
            student_id: student_id.to_string(),
            average,
            rank,
        })
        .collect()
}

/// Stats and ranks in one pass over the store.
pub fn rank_roster(store: &ScoreStore, exam_id: &str, roster: &[String]) -> Vec<RankedStudent> {
    compute_ranks(&compute_stats(store, exam_id, roster))
}

/// Rank students on a single subject.
///
/// Students with no entry sort below every real score and tie with each
/// other at the bottom; they still occupy rank slots.
pub fn compute_subject_rank(
    store: &ScoreStore,
    exam_id: &str,
    subject_id: &str,
    roster: &[String],
) -> Vec<SubjectRank> {
    let entries: Vec<(&String, Option<Score>)> = roster
        .iter()
        .map(|id| {
            let score = store.record(exam_id, id).and_then(|r| r.score(subject_id));
            (id, score)
        })
        .collect();

    rank_by(entries, |(_, score)| score.map_or(NO_ENTRY_KEY, Score::value))
        .into_iter()
        .map(|((student_id, score), rank)| SubjectRank {
            student_id: student_id.clone(),
            score,
            rank,
        })
        .collect()
}

/// Per-subject distribution in the exam's canonical subject order.
pub fn compute_subject_summaries(
    store: &ScoreStore,
    exam: &Exam,
    roster: &[String],
) -> Vec<SubjectSummary> {
    exam.subjects
        .iter()
        .map(|subject| {
            let present: Vec<Score> = roster
                .iter()
                .filter_map(|id| store.record(&exam.id, id).and_then(|r| r.score(&subject.id)))
                .collect();

            let mean = if present.is_empty() {
                0.0
            } else {
                present.iter().map(|s| s.value()).sum::<f64>() / present.len() as f64
            };

            SubjectSummary {
                subject_id: subject.id.clone(),
                subject_name: subject.name.clone(),
                entries: present.len(),
                missing: roster.len() - present.len(),
                mean,
                highest: present.iter().copied().reduce(|a, b| if b > a { b } else { a }),
                lowest: present.iter().copied().reduce(|a, b| if b < a { b } else { a }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Subject;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ranks_of(ranked: &[RankedStudent]) -> Vec<(String, usize)> {
        ranked.iter().map(|r| (r.student_id.clone(), r.rank)).collect()
    }

    #[test]
    fn average_excludes_absent_subjects() {
        let mut store = ScoreStore::new();
        store.set_score("e1", "s1", "math", Some(80.0)).unwrap();
        let stats = compute_stats(&store, "e1", &ids(&["s1"]));
        assert_eq!(stats[0].total, 80.0);
        assert_eq!(stats[0].average, 80.0);
        assert_eq!(stats[0].subjects_sat(), 1);
    }

    #[test]
    fn earned_zero_counts_toward_average() {
        let mut store = ScoreStore::new();
        store.set_score("e1", "s1", "math", Some(80.0)).unwrap();
        store.set_score("e1", "s1", "english", Some(0.0)).unwrap();
        let stats = compute_stats(&store, "e1", &ids(&["s1"]));
        assert_eq!(stats[0].average, 40.0);
    }

    #[test]
    fn student_without_scores_averages_zero_and_ranks_last() {
        let mut store = ScoreStore::new();
        store.set_score("e1", "s1", "math", Some(10.0)).unwrap();
        let stats = compute_stats(&store, "e1", &ids(&["ghost", "s1"]));
        assert_eq!(stats[0].average, 0.0);
        assert!(!stats[0].average.is_nan());

        let ranked = compute_ranks(&stats);
        assert_eq!(
            ranks_of(&ranked),
            vec![("s1".to_string(), 1), ("ghost".to_string(), 2)]
        );
    }

    #[test]
    fn competition_ranking_with_ties() {
        assert_eq!(competition_ranks(&[90.0, 80.0, 80.0, 70.0]), vec![1, 2, 2, 4]);
        assert_eq!(competition_ranks(&[50.0, 50.0, 50.0]), vec![1, 1, 1]);
        assert!(competition_ranks(&[]).is_empty());
    }

    #[test]
    fn compute_ranks_worked_example() {
        let mut store = ScoreStore::new();
        for (student, score) in [("D", 70.0), ("B", 80.0), ("A", 90.0), ("C", 80.0)] {
            store.set_score("e1", student, "math", Some(score)).unwrap();
        }
        let ranked = rank_roster(&store, "e1", &ids(&["A", "B", "C", "D"]));
        assert_eq!(
            ranks_of(&ranked),
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 2),
                ("C".to_string(), 2),
                ("D".to_string(), 4),
            ]
        );
    }

    #[test]
    fn tied_students_keep_roster_order() {
        let mut store = ScoreStore::new();
        store.set_score("e1", "x", "math", Some(60.0)).unwrap();
        store.set_score("e1", "y", "math", Some(60.0)).unwrap();
        let ranked = rank_roster(&store, "e1", &ids(&["y", "x"]));
        assert_eq!(ranked[0].student_id, "y");
        assert_eq!(ranked[1].student_id, "x");
    }

    #[test]
    fn rank_is_relative_to_roster() {
        let mut store = ScoreStore::new();
        store.set_score("e1", "s1", "math", Some(90.0)).unwrap();
        store.set_score("e1", "s2", "math", Some(70.0)).unwrap();
        store.set_score("e1", "s3", "math", Some(50.0)).unwrap();

        let class_only = rank_roster(&store, "e1", &ids(&["s2", "s3"]));
        assert_eq!(class_only[0].student_id, "s2");
        assert_eq!(class_only[0].rank, 1);
    }

    #[test]
    fn empty_roster_is_empty() {
        let store = ScoreStore::new();
        assert!(compute_stats(&store, "e1", &[]).is_empty());
        assert!(compute_ranks(&[]).is_empty());
        assert!(compute_subject_rank(&store, "e1", "math", &[]).is_empty());
    }

    #[test]
    fn subject_rank_puts_no_entry_last() {
        let mut store = ScoreStore::new();
        store.set_score("e1", "s1", "math", Some(0.0)).unwrap();
        store.set_score("e1", "s2", "math", Some(55.0)).unwrap();
        store.set_score("e1", "s3", "english", Some(99.0)).unwrap();

        let ranked = compute_subject_rank(&store, "e1", "math", &ids(&["s3", "s1", "s2", "s4"]));
        let got: Vec<(&str, usize)> = ranked.iter().map(|r| (r.student_id.as_str(), r.rank)).collect();
        assert_eq!(got, vec![("s2", 1), ("s1", 2), ("s3", 3), ("s4", 3)]);
        assert!(ranked[2].score.is_none());
    }

    #[test]
    fn subject_nobody_sat_ties_everyone() {
        let store = ScoreStore::new();
        let ranked = compute_subject_rank(&store, "e1", "math", &ids(&["a", "b"]));
        assert!(ranked.iter().all(|r| r.rank == 1));
    }

    #[test]
    fn subject_summaries() {
        let exam = Exam {
            id: "e1".into(),
            name: "Midterm".into(),
            subjects: vec![
                Subject { id: "math".into(), name: "Math".into() },
                Subject { id: "eng".into(), name: "English".into() },
            ],
            marks_locked: false,
        };
        let mut store = ScoreStore::new();
        store.set_score("e1", "s1", "math", Some(40.0)).unwrap();
        store.set_score("e1", "s2", "math", Some(80.0)).unwrap();

        let summaries = compute_subject_summaries(&store, &exam, &ids(&["s1", "s2", "s3"]));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].subject_name, "Math");
        assert_eq!(summaries[0].entries, 2);
        assert_eq!(summaries[0].missing, 1);
        assert_eq!(summaries[0].mean, 60.0);
        assert_eq!(summaries[0].highest.unwrap().value(), 80.0);
        assert_eq!(summaries[0].lowest.unwrap().value(), 40.0);
        assert_eq!(summaries[1].entries, 0);
        assert_eq!(summaries[1].mean, 0.0);
        assert!(summaries[1].highest.is_none());
    }
}
