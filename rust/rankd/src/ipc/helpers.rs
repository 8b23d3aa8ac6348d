use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::path::Path;

use crate::db;
use crate::error::RankError;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::Roster;
use crate::report;
use crate::term_roster::TermRoster;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Reads a non-negative index and checks it against `len`.
pub fn required_index(req: &Request, key: &str, len: usize) -> Result<usize, serde_json::Value> {
    let Some(raw) = req.params.get(key) else {
        return Err(err(&req.id, "bad_params", format!("missing {}", key), None));
    };
    let Some(idx) = raw.as_u64() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a non-negative integer", key),
            Some(json!({ "param": key, "value": raw })),
        ));
    };
    let idx = idx as usize;
    if idx >= len {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} out of range", key),
            Some(json!({ "param": key, "value": idx, "len": len })),
        ));
    }
    Ok(idx)
}

/// Reads an optional text param; missing or null reads as "".
pub fn optional_text(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(String::new()),
        Some(v) => v.as_str().map(|s| s.to_string()).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a string", key),
                None,
            )
        }),
    }
}

fn warning_json(e: &RankError) -> serde_json::Value {
    json!({ "code": e.code(), "message": e.to_string() })
}

fn persist<T: Serialize>(conn: Option<&Connection>, key: &str, value: &T) -> serde_json::Value {
    let Some(conn) = conn else {
        return json!({ "persisted": false });
    };
    match db::save_snapshot(conn, key, value) {
        Ok(revision) => {
            tracing::debug!(key, revision, "snapshot saved");
            json!({ "persisted": true, "revision": revision })
        }
        Err(e) => {
            let e = RankError::from(e);
            tracing::warn!(key, error = %e, "failed to save snapshot");
            json!({ "persisted": false, "warning": warning_json(&e) })
        }
    }
}

/// Swaps in the new roster, then mirrors it to the store if one is open.
/// A failed save is reported but never undoes the swap.
pub fn commit(state: &mut AppState, next: Roster) -> serde_json::Value {
    state.roster = next;
    persist(state.db.as_ref(), db::STATE_KEY, &state.roster)
}

pub fn commit_term(state: &mut AppState, next: TermRoster) -> serde_json::Value {
    state.term = next;
    persist(state.db.as_ref(), db::TERM_STATE_KEY, &state.term)
}

/// Deletes the saved copy under `key`. The store is left without a row, so
/// the next open starts from defaults.
pub fn discard(state: &AppState, key: &str) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return json!({ "persisted": false });
    };
    match db::clear_snapshot(conn, key) {
        Ok(()) => json!({ "persisted": true, "revision": null }),
        Err(e) => {
            let e = RankError::from(e);
            tracing::warn!(key, error = %e, "failed to clear saved snapshot");
            json!({ "persisted": false, "warning": warning_json(&e) })
        }
    }
}

pub fn roster_result(state: &AppState, persistence: serde_json::Value) -> serde_json::Value {
    json!({
        "roster": report::roster_view(&state.roster),
        "persistence": persistence,
    })
}

pub fn term_result(state: &AppState, persistence: serde_json::Value) -> serde_json::Value {
    json!({
        "term": report::term_view(&state.term),
        "persistence": persistence,
    })
}

struct Loaded<T> {
    value: Option<T>,
    revision: Option<i64>,
    saved_at: Option<String>,
    warning: Option<RankError>,
}

impl<T> Loaded<T> {
    fn source(&self) -> &'static str {
        if self.value.is_some() {
            "saved"
        } else {
            "default"
        }
    }
}

fn load_saved<T: DeserializeOwned>(
    conn: &Connection,
    key: &str,
    normalize: impl Fn(&T) -> anyhow::Result<T>,
) -> Loaded<T> {
    let mut loaded = Loaded {
        value: None,
        revision: None,
        saved_at: None,
        warning: None,
    };
    match db::load_snapshot::<T>(conn, key).and_then(|saved| {
        saved
            .map(|s| normalize(&s.value).map(|v| (v, s.revision, s.updated_at)))
            .transpose()
    }) {
        Ok(Some((value, revision, updated_at))) => {
            loaded.value = Some(value);
            loaded.revision = Some(revision);
            loaded.saved_at = Some(updated_at);
        }
        Ok(None) => {}
        Err(e) => {
            let e = RankError::from(e);
            tracing::warn!(key, error = %e, "saved snapshot unusable, starting from defaults");
            loaded.warning = Some(e);
        }
    }
    loaded
}

/// Opens the store in `path` and loads both rosters, falling back to the
/// defaults when nothing usable is saved.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<serde_json::Value> {
    let conn = db::open_db(path)?;

    let roster = load_saved(&conn, db::STATE_KEY, Roster::normalized);
    let term = load_saved(&conn, db::TERM_STATE_KEY, |t: &TermRoster| Ok(t.normalized()));

    tracing::info!(
        workspace = %path.display(),
        source = roster.source(),
        term_source = term.source(),
        "workspace opened"
    );

    let mut result = json!({
        "workspacePath": path.to_string_lossy(),
        "source": roster.source(),
        "revision": roster.revision,
        "savedAt": roster.saved_at,
    });
    if let Some(w) = &roster.warning {
        result["warning"] = warning_json(w);
    }
    let mut term_result = json!({
        "source": term.source(),
        "revision": term.revision,
        "savedAt": term.saved_at,
    });
    if let Some(w) = &term.warning {
        term_result["warning"] = warning_json(w);
    }
    result["termSource"] = term_result;

    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.roster = roster.value.unwrap_or_default();
    state.term = term.value.unwrap_or_default();
    Ok(result)
}
