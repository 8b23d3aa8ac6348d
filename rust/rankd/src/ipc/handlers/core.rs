use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{discard, open_workspace, required_str, roster_result};
use crate::ipc::types::{AppState, Request};
use crate::model::Roster;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match required_str(req, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e,
    };

    match open_workspace(state, &path) {
        Ok(mut result) => {
            result["roster"] = json!(crate::report::roster_view(&state.roster));
            result["term"] = json!(crate::report::term_view(&state.term));
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:#}"), None),
    }
}

/// Back to the starter subjects with no students. The saved row is deleted,
/// not overwritten, so a reopen reports `source: "default"`.
fn handle_workspace_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.roster = Roster::default();
    let persistence = discard(state, db::STATE_KEY);
    tracing::info!("roster reset to defaults");
    ok(&req.id, roster_result(state, persistence))
}

fn handle_roster_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "roster": crate::report::roster_view(&state.roster),
            "stats": crate::calc::class_stats(&state.roster),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.clear" => Some(handle_workspace_clear(state, req)),
        "roster.get" => Some(handle_roster_get(state, req)),
        _ => None,
    }
}
