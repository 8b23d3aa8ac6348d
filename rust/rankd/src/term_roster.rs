//! Term-average ranking.
//!
//! Each student sits a half-yearly and a final exam, both scored out of 1000,
//! and is ranked by the mean of the two. There are no subjects, and a blank
//! name does not block ranking. Like [`crate::model::Roster`], every edit
//! returns a new value and an out-of-range index panics.

use serde::{Deserialize, Serialize};

use crate::calc::{self, Ranked};
use crate::validate::{clamp_term_mark, TERM_MARK_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermExam {
    HalfYearly,
    Final,
}

/// An editable field of a term student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermField {
    Name,
    RollNumber,
    Exam(TermExam),
}

impl TermField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(TermField::Name),
            "rollNumber" => Some(TermField::RollNumber),
            "halfYearlyMarks" => Some(TermField::Exam(TermExam::HalfYearly)),
            "finalMarks" => Some(TermField::Exam(TermExam::Final)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TermStudent {
    pub name: String,
    pub roll_number: String,
    pub half_yearly_marks: f64,
    pub final_marks: f64,
    pub average_marks: f64,
    pub percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

pub fn term_average(half_yearly: f64, final_marks: f64) -> f64 {
    (half_yearly + final_marks) / 2.0
}

pub fn term_percentage(average: f64) -> f64 {
    average / TERM_MARK_MAX * 100.0
}

impl TermStudent {
    fn recomputed(&self) -> TermStudent {
        let average_marks = term_average(self.half_yearly_marks, self.final_marks);
        TermStudent {
            average_marks,
            percentage: term_percentage(average_marks),
            ..self.clone()
        }
    }
}

impl Ranked for TermStudent {
    type Score = f64;

    fn score(&self) -> f64 {
        self.average_marks
    }

    fn rank(&self) -> Option<u32> {
        self.rank
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = Some(rank);
    }
}

/// Saved as a bare array, the same layout as the browser blob.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermRoster {
    pub students: Vec<TermStudent>,
}

impl TermRoster {
    fn with_student(&self, index: usize, f: impl FnOnce(&mut TermStudent)) -> TermRoster {
        assert!(
            index < self.students.len(),
            "term student index {index} out of bounds"
        );
        let mut students = self.students.clone();
        f(&mut students[index]);
        TermRoster { students }
    }

    pub fn add_student(&self) -> TermRoster {
        let mut students = self.students.clone();
        students.push(TermStudent::default());
        TermRoster { students }
    }

    pub fn remove_student(&self, index: usize) -> TermRoster {
        assert!(
            index < self.students.len(),
            "term student index {index} out of bounds"
        );
        let mut students = self.students.clone();
        students.remove(index);
        TermRoster { students }
    }

    pub fn set_name(&self, index: usize, name: &str) -> TermRoster {
        self.with_student(index, |s| s.name = name.to_string())
    }

    pub fn set_roll_number(&self, index: usize, roll_number: &str) -> TermRoster {
        self.with_student(index, |s| s.roll_number = roll_number.to_string())
    }

    /// Clamps `value` into 0..=1000 and re-derives the average.
    pub fn set_exam_mark(&self, index: usize, exam: TermExam, value: f64) -> TermRoster {
        let value = clamp_term_mark(value);
        self.with_student(index, |s| {
            match exam {
                TermExam::HalfYearly => s.half_yearly_marks = value,
                TermExam::Final => s.final_marks = value,
            }
            *s = s.recomputed();
        })
    }

    pub fn rank(&self) -> TermRoster {
        TermRoster {
            students: calc::competition_rank(&self.students),
        }
    }

    pub fn ranks_stale(&self) -> bool {
        !calc::ranking_is_current(&self.students)
    }

    /// Clamps loaded exam scores and re-derives averages. Stored averages are
    /// never trusted.
    pub fn normalized(&self) -> TermRoster {
        TermRoster {
            students: self
                .students
                .iter()
                .map(|s| {
                    TermStudent {
                        half_yearly_marks: clamp_term_mark(s.half_yearly_marks),
                        final_marks: clamp_term_mark(s.final_marks),
                        ..s.clone()
                    }
                    .recomputed()
                })
                .collect(),
        }
    }
}
