//! Structural edits on a [`Roster`].
//!
//! Every operation borrows the current roster and returns a new one; nothing is
//! edited in place, so a caller holding the previous value still sees it intact.
//! Index arguments are trusted: callers check bounds before calling, and an
//! out-of-range index panics.

use anyhow::bail;

use crate::calc;
use crate::error::RankError;
use crate::model::{MarkEntry, Roster, Student, SubjectList};
use crate::validate::{validate_mark, MainPart, MarkKind};

fn clean_subject_name(list: SubjectList, name: &str) -> Result<String, RankError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RankError::BadSubject { list });
    }
    Ok(name.to_string())
}

impl Roster {
    fn check_new_subject(&self, list: SubjectList, name: &str) -> Result<String, RankError> {
        let name = clean_subject_name(list, name)?;
        if self.subjects(list).iter().any(|s| *s == name) {
            return Err(RankError::Duplicate { list, name });
        }
        Ok(name)
    }

    fn map_students(&self, f: impl Fn(&Student) -> Student) -> Vec<Student> {
        self.students
            .iter()
            .map(|s| calc::recompute_student(&f(s)))
            .collect()
    }

    pub fn add_main_subject(&self, name: &str) -> Result<Roster, RankError> {
        let name = self.check_new_subject(SubjectList::Main, name)?;
        let mut main_subjects = self.main_subjects.clone();
        main_subjects.push(name.clone());
        let students = self.map_students(|s| {
            let mut marks = s.marks.clone();
            marks.push(MarkEntry::blank(&name));
            Student {
                marks,
                ..s.clone()
            }
        });
        Ok(Roster {
            main_subjects,
            additional_subjects: self.additional_subjects.clone(),
            students,
        })
    }

    pub fn add_additional_subject(&self, name: &str) -> Result<Roster, RankError> {
        let name = self.check_new_subject(SubjectList::Additional, name)?;
        let mut additional_subjects = self.additional_subjects.clone();
        additional_subjects.push(name);
        let students = self.map_students(|s| {
            let mut additional_marks = s.additional_marks.clone();
            additional_marks.push(0);
            Student {
                additional_marks,
                ..s.clone()
            }
        });
        Ok(Roster {
            main_subjects: self.main_subjects.clone(),
            additional_subjects,
            students,
        })
    }

    pub fn remove_main_subject(&self, index: usize) -> Roster {
        assert!(
            index < self.main_subjects.len(),
            "main subject index {index} out of bounds"
        );
        let mut main_subjects = self.main_subjects.clone();
        main_subjects.remove(index);
        let students = self.map_students(|s| {
            let mut marks = s.marks.clone();
            marks.remove(index);
            Student {
                marks,
                ..s.clone()
            }
        });
        Roster {
            main_subjects,
            additional_subjects: self.additional_subjects.clone(),
            students,
        }
    }

    pub fn remove_additional_subject(&self, index: usize) -> Roster {
        assert!(
            index < self.additional_subjects.len(),
            "additional subject index {index} out of bounds"
        );
        let mut additional_subjects = self.additional_subjects.clone();
        additional_subjects.remove(index);
        let students = self.map_students(|s| {
            let mut additional_marks = s.additional_marks.clone();
            additional_marks.remove(index);
            Student {
                additional_marks,
                ..s.clone()
            }
        });
        Roster {
            main_subjects: self.main_subjects.clone(),
            additional_subjects,
            students,
        }
    }

    /// Appends a blank student with a zero slot for every current subject.
    pub fn add_student(&self) -> Roster {
        let student = Student {
            name: String::new(),
            marks: self
                .main_subjects
                .iter()
                .map(|s| MarkEntry::blank(s))
                .collect(),
            additional_marks: vec![0; self.additional_subjects.len()],
            total_marks: 0,
            rank: None,
        };
        let mut students = self.students.clone();
        students.push(student);
        Roster {
            students,
            ..self.clone()
        }
    }

    /// Ranks of the remaining students are left as they were.
    pub fn remove_student(&self, index: usize) -> Roster {
        assert!(
            index < self.students.len(),
            "student index {index} out of bounds"
        );
        let mut students = self.students.clone();
        students.remove(index);
        Roster {
            students,
            ..self.clone()
        }
    }

    pub fn rename_student(&self, index: usize, name: &str) -> Roster {
        assert!(
            index < self.students.len(),
            "student index {index} out of bounds"
        );
        let mut students = self.students.clone();
        students[index].name = name.to_string();
        Roster {
            students,
            ..self.clone()
        }
    }

    pub fn set_main_mark(
        &self,
        student: usize,
        subject: usize,
        part: MainPart,
        value: i64,
    ) -> Result<Roster, RankError> {
        let value = validate_mark(part.kind(), value)?;
        let mut students = self.students.clone();
        let target = &mut students[student];
        let entry = &mut target.marks[subject];
        match part {
            MainPart::Ut => entry.ut = value,
            MainPart::Final => entry.final_mark = value,
        }
        *target = calc::recompute_student(target);
        Ok(Roster {
            students,
            ..self.clone()
        })
    }

    pub fn set_additional_mark(
        &self,
        student: usize,
        subject: usize,
        value: i64,
    ) -> Result<Roster, RankError> {
        let value = validate_mark(MarkKind::Additional, value)?;
        let mut students = self.students.clone();
        let target = &mut students[student];
        target.additional_marks[subject] = value;
        *target = calc::recompute_student(target);
        Ok(Roster {
            students,
            ..self.clone()
        })
    }

    /// Sorts by total and assigns fresh ranks. On failure nothing changes.
    pub fn rank(&self) -> Result<Roster, RankError> {
        let students = calc::compute_ranks(&self.students)?;
        Ok(Roster {
            students,
            ..self.clone()
        })
    }

    pub fn ranks_stale(&self) -> bool {
        !calc::ranks_are_current(&self.students)
    }

    /// Checks a loaded snapshot's alignment and re-derives all totals.
    pub fn normalized(&self) -> anyhow::Result<Roster> {
        for (i, s) in self.students.iter().enumerate() {
            if s.marks.len() != self.main_subjects.len() {
                bail!(
                    "student {} has {} main marks for {} subjects",
                    i,
                    s.marks.len(),
                    self.main_subjects.len()
                );
            }
            if s.additional_marks.len() != self.additional_subjects.len() {
                bail!(
                    "student {} has {} additional marks for {} subjects",
                    i,
                    s.additional_marks.len(),
                    self.additional_subjects.len()
                );
            }
            for (j, (entry, subject)) in s.marks.iter().zip(&self.main_subjects).enumerate() {
                if entry.subject != *subject {
                    bail!(
                        "student {} mark {} is for '{}' but subject is '{}'",
                        i,
                        j,
                        entry.subject,
                        subject
                    );
                }
                if entry.ut > MarkKind::Ut.max() || entry.final_mark > MarkKind::Final.max() {
                    bail!("student {} mark {} is out of range", i, j);
                }
            }
            if s.additional_marks
                .iter()
                .any(|m| *m > MarkKind::Additional.max())
            {
                bail!("student {} has an additional mark out of range", i);
            }
        }
        Ok(Roster {
            students: self.students.iter().map(calc::recompute_student).collect(),
            ..self.clone()
        })
    }
}
