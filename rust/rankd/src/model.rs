use serde::{Deserialize, Serialize};

pub const DEFAULT_MAIN_SUBJECTS: [&str; 6] = [
    "English Language",
    "English Literature",
    "Second Language",
    "Environmental Science",
    "Mathematics",
    "Computer",
];

pub const DEFAULT_ADDITIONAL_SUBJECTS: [&str; 4] = [
    "Spelling and Dictation",
    "Reading",
    "Conversation",
    "Moral Science",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectList {
    Main,
    Additional,
}

impl SubjectList {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectList::Main => "main",
            SubjectList::Additional => "additional",
        }
    }
}

/// One main-subject score. `total` is derived from `ut + final_mark`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkEntry {
    pub subject: String,
    #[serde(rename = "UT")]
    pub ut: u32,
    #[serde(rename = "Final")]
    pub final_mark: u32,
    #[serde(rename = "Total")]
    pub total: u32,
}

impl MarkEntry {
    pub fn blank(subject: &str) -> Self {
        Self {
            subject: subject.to_string(),
            ut: 0,
            final_mark: 0,
            total: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub marks: Vec<MarkEntry>,
    #[serde(default)]
    pub additional_marks: Vec<u32>,
    #[serde(default)]
    pub total_marks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl Student {
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// The whole session state: both subject lists and the students whose mark
/// collections are index-aligned with them. This is also the saved layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    #[serde(rename = "subjects", alias = "mainSubjects")]
    pub main_subjects: Vec<String>,
    pub additional_subjects: Vec<String>,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            main_subjects: DEFAULT_MAIN_SUBJECTS.iter().map(|s| s.to_string()).collect(),
            additional_subjects: DEFAULT_ADDITIONAL_SUBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            students: Vec::new(),
        }
    }
}

impl Roster {
    pub fn subjects(&self, list: SubjectList) -> &[String] {
        match list {
            SubjectList::Main => &self.main_subjects,
            SubjectList::Additional => &self.additional_subjects,
        }
    }

    pub fn subject_count(&self) -> usize {
        self.main_subjects.len() + self.additional_subjects.len()
    }
}
