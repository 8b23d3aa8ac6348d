use serde::Serialize;
use std::cmp::Ordering;

use crate::error::RankError;
use crate::model::{MarkEntry, Roster, Student};

/// Every subject, main or additional, is marked out of 100.
pub const MARKS_PER_SUBJECT: u32 = 100;

/// Half-up rounding to 2 decimals, matching the two-decimal display.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

pub fn format_percentage(p: f64) -> String {
    format!("{:.2}", p)
}

pub fn entry_total(ut: u32, final_mark: u32) -> u32 {
    ut + final_mark
}

pub fn student_total(marks: &[MarkEntry], additional_marks: &[u32]) -> u32 {
    marks.iter().map(|m| m.total).sum::<u32>() + additional_marks.iter().sum::<u32>()
}

/// Re-derives every Total and the student's totalMarks from UT/Final and the
/// additional marks. Stored totals are never trusted.
pub fn recompute_student(student: &Student) -> Student {
    let marks: Vec<MarkEntry> = student
        .marks
        .iter()
        .map(|m| MarkEntry {
            total: entry_total(m.ut, m.final_mark),
            ..m.clone()
        })
        .collect();
    let total_marks = student_total(&marks, &student.additional_marks);
    Student {
        marks,
        total_marks,
        ..student.clone()
    }
}

pub fn total_possible_marks(main_count: usize, additional_count: usize) -> u32 {
    MARKS_PER_SUBJECT * (main_count + additional_count) as u32
}

/// `total / possible * 100`; 0 when there are no subjects at all.
pub fn percentage(total_marks: u32, possible: u32) -> f64 {
    if possible == 0 {
        return 0.0;
    }
    (total_marks as f64) / (possible as f64) * 100.0
}

/// Anything that can be placed in a competition ranking.
pub trait Ranked {
    type Score: PartialOrd + Copy;

    fn score(&self) -> Self::Score;
    fn rank(&self) -> Option<u32>;
    fn set_rank(&mut self, rank: u32);
}

impl Ranked for Student {
    type Score = u32;

    fn score(&self) -> u32 {
        self.total_marks
    }

    fn rank(&self) -> Option<u32> {
        self.rank
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = Some(rank);
    }
}

/// Competition ranking ("1224"), highest score first.
///
/// Equal scores keep their relative order and share a rank; the next distinct
/// score skips ahead by the size of the tie run.
pub fn competition_rank<T: Ranked + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted: Vec<T> = items.to_vec();
    // sort_by is stable: equal scores stay in input order.
    sorted.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(Ordering::Equal)
    });

    let mut rank: u32 = 1;
    let mut tie_run: u32 = 0;
    let mut prev: Option<T::Score> = None;
    for item in sorted.iter_mut() {
        let score = item.score();
        if prev == Some(score) {
            tie_run += 1;
        } else {
            rank += tie_run;
            tie_run = 1;
        }
        item.set_rank(rank);
        prev = Some(score);
    }
    sorted
}

/// True when the stored order and ranks are exactly what a fresh ranking of
/// the current scores would produce.
pub fn ranking_is_current<T: Ranked + Clone>(items: &[T]) -> bool {
    if items.iter().any(|i| i.rank().is_none()) {
        return false;
    }
    competition_rank(items)
        .iter()
        .zip(items)
        .all(|(a, b)| a.rank() == b.rank() && a.score() == b.score())
}

/// Ranks students by total. Fails without producing anything when any
/// student has a blank name.
pub fn compute_ranks(students: &[Student]) -> Result<Vec<Student>, RankError> {
    let missing: Vec<usize> = students
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.has_name())
        .map(|(i, _)| i)
        .collect();
    if !missing.is_empty() {
        return Err(RankError::MissingData { rows: missing });
    }
    Ok(competition_rank(students))
}

/// A roster with a blank name can't be ranked, so its ranks are never current.
pub fn ranks_are_current(students: &[Student]) -> bool {
    students.iter().all(|s| s.has_name()) && ranking_is_current(students)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStats {
    pub student_count: usize,
    pub total_possible_marks: u32,
    pub class_average_percent: f64,
    pub highest_total: Option<u32>,
}

pub fn class_stats(roster: &Roster) -> ClassStats {
    let possible = total_possible_marks(
        roster.main_subjects.len(),
        roster.additional_subjects.len(),
    );
    let n = roster.students.len();
    let avg = if n > 0 {
        let sum: f64 = roster
            .students
            .iter()
            .map(|s| percentage(s.total_marks, possible))
            .sum();
        round_off_2_decimals(sum / n as f64)
    } else {
        0.0
    };
    ClassStats {
        student_count: n,
        total_possible_marks: possible,
        class_average_percent: avg,
        highest_total: roster.students.iter().map(|s| s.total_marks).max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str, total: u32) -> Student {
        Student {
            name: name.to_string(),
            marks: Vec::new(),
            additional_marks: vec![total],
            total_marks: total,
            rank: None,
        }
    }

    fn ranks(totals: &[u32]) -> Vec<u32> {
        let students: Vec<Student> = totals
            .iter()
            .enumerate()
            .map(|(i, t)| student(&format!("s{i}"), *t))
            .collect();
        compute_ranks(&students)
            .expect("rank")
            .iter()
            .map(|s| s.rank.expect("ranked"))
            .collect()
    }

    #[test]
    fn competition_ranking_skips_after_ties() {
        assert_eq!(ranks(&[90, 90, 80, 80, 80, 70]), vec![1, 1, 3, 3, 3, 6]);
        assert_eq!(ranks(&[300, 300, 250]), vec![1, 1, 3]);
        assert_eq!(ranks(&[400, 350, 300]), vec![1, 2, 3]);
        assert_eq!(ranks(&[50, 50, 50]), vec![1, 1, 1]);
        assert!(ranks(&[]).is_empty());
    }

    #[test]
    fn ranking_sorts_descending_and_keeps_tie_order() {
        let input = vec![
            student("Bea", 200),
            student("Ana", 300),
            student("Cal", 200),
            student("Dev", 300),
        ];
        let out = compute_ranks(&input).expect("rank");
        let names: Vec<&str> = out.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Dev", "Bea", "Cal"]);
        let r: Vec<Option<u32>> = out.iter().map(|s| s.rank).collect();
        assert_eq!(r, vec![Some(1), Some(1), Some(3), Some(3)]);
        // input is untouched
        assert!(input.iter().all(|s| s.rank.is_none()));
        assert_eq!(input[0].name, "Bea");
    }

    #[test]
    fn ranking_is_idempotent() {
        let input = vec![student("a", 10), student("b", 30), student("c", 30)];
        let once = compute_ranks(&input).expect("rank once");
        let twice = compute_ranks(&once).expect("rank twice");
        assert_eq!(once, twice);
        assert!(ranks_are_current(&once));
    }

    #[test]
    fn blank_name_aborts_ranking() {
        let input = vec![student("a", 10), student("", 30), student("", 5)];
        let e = compute_ranks(&input).unwrap_err();
        assert_eq!(e, RankError::MissingData { rows: vec![1, 2] });
    }

    #[test]
    fn stale_ranks_are_detected() {
        let ranked = compute_ranks(&[student("a", 10), student("b", 20)]).expect("rank");
        assert!(ranks_are_current(&ranked));

        let mut edited = ranked.clone();
        edited[1] = Student {
            total_marks: 99,
            additional_marks: vec![99],
            ..edited[1].clone()
        };
        assert!(!ranks_are_current(&edited));
        assert!(!ranks_are_current(&[student("x", 1)]));
        assert!(ranks_are_current(&[]));
    }

    #[test]
    fn recompute_derives_every_total() {
        let s = Student {
            name: "a".into(),
            marks: vec![
                MarkEntry {
                    subject: "M".into(),
                    ut: 15,
                    final_mark: 60,
                    total: 0,
                },
                MarkEntry {
                    subject: "E".into(),
                    ut: 20,
                    final_mark: 80,
                    total: 3,
                },
            ],
            additional_marks: vec![40, 50],
            total_marks: 7,
            rank: Some(2),
        };
        let r = recompute_student(&s);
        assert_eq!(r.marks[0].total, 75);
        assert_eq!(r.marks[1].total, 100);
        assert_eq!(r.total_marks, 265);
        assert_eq!(r.rank, Some(2));
    }

    #[test]
    fn percentage_of_full_marks() {
        let possible = total_possible_marks(6, 4);
        assert_eq!(possible, 1000);
        assert_eq!(format_percentage(percentage(1000, possible)), "100.00");
        assert_eq!(format_percentage(percentage(835, possible)), "83.50");
        assert_eq!(percentage(50, 0), 0.0);
    }

    #[test]
    fn round_off_half_up() {
        assert_eq!(round_off_2_decimals(0.0), 0.0);
        assert_eq!(round_off_2_decimals(66.666), 66.67);
        assert_eq!(round_off_2_decimals(12.344), 12.34);
    }

    #[test]
    fn class_stats_average_and_highest() {
        let roster = Roster {
            main_subjects: Vec::new(),
            additional_subjects: vec!["R".into(), "C".into()],
            students: vec![student("a", 100), student("b", 150)],
        };
        let st = class_stats(&roster);
        assert_eq!(st.student_count, 2);
        assert_eq!(st.total_possible_marks, 200);
        assert_eq!(st.class_average_percent, 62.5);
        assert_eq!(st.highest_total, Some(150));
    }
}
