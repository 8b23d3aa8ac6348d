use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::model::Roster;
use crate::term_roster::TermRoster;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Session state. The rosters are the source of truth; `db` only mirrors them.
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub roster: Roster,
    pub term: TermRoster,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            roster: Roster::default(),
            term: TermRoster::default(),
        }
    }
}
