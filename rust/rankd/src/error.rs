use serde_json::json;
use thiserror::Error;

use crate::model::SubjectList;
use crate::validate::MarkKind;

/// Recoverable failures of a single user action. None of these end the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RankError {
    /// A mark outside its field's bounds. The stored value is left as it was.
    #[error("{kind} marks should be between {min} and {max}")]
    Range {
        kind: MarkKind,
        value: i64,
        min: u32,
        max: u32,
    },

    #[error("{kind} marks must be whole numbers")]
    InvalidMark { kind: MarkKind, value: f64 },

    #[error("this subject already exists: {name}")]
    Duplicate { list: SubjectList, name: String },

    #[error("please enter a subject name")]
    BadSubject { list: SubjectList },

    /// Ranking was attempted while some students have no name.
    #[error("please fill in all student names before calculating ranks")]
    MissingData { rows: Vec<usize> },

    #[error("please add students before exporting")]
    EmptyRoster,

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl RankError {
    pub fn code(&self) -> &'static str {
        match self {
            RankError::Range { .. } => "mark_out_of_range",
            RankError::InvalidMark { .. } => "invalid_mark",
            RankError::Duplicate { .. } => "duplicate_subject",
            RankError::BadSubject { .. } => "bad_subject",
            RankError::MissingData { .. } => "missing_data",
            RankError::EmptyRoster => "empty_roster",
            RankError::Persistence(_) => "persistence_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            RankError::Range {
                kind,
                value,
                min,
                max,
            } => Some(json!({
                "kind": kind.as_str(),
                "value": value,
                "min": min,
                "max": max,
            })),
            RankError::InvalidMark { kind, value } => Some(json!({
                "kind": kind.as_str(),
                "value": value,
            })),
            RankError::Duplicate { list, name } => Some(json!({
                "list": list.as_str(),
                "name": name,
            })),
            RankError::BadSubject { list } => Some(json!({ "list": list.as_str() })),
            RankError::MissingData { rows } => Some(json!({ "rows": rows })),
            RankError::EmptyRoster | RankError::Persistence(_) => None,
        }
    }
}

impl From<anyhow::Error> for RankError {
    fn from(e: anyhow::Error) -> Self {
        RankError::Persistence(format!("{e:#}"))
    }
}
