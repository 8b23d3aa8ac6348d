use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    commit, commit_term, open_workspace, required_str, roster_result, term_result,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Roster;
use crate::term_roster::TermRoster;
use serde_json::json;
use std::path::PathBuf;

fn handle_backup_export_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        Ok(_) => return err(&req.id, "bad_params", "missing outPath", None),
        Err(e) => return e,
    };
    let Some(workspace_path) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    if let Some(conn) = state.db.as_ref() {
        let _ = conn.execute_batch("PRAGMA wal_checkpoint(FULL)");
    }

    let out = PathBuf::from(&out_path);
    let export = match backup::export_workspace_bundle(&workspace_path, &out) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "io_failed",
                format!("{e:#}"),
                Some(json!({ "path": out_path })),
            )
        }
    };
    tracing::info!(path = %out_path, "workspace bundle exported");

    ok(
        &req.id,
        json!({
            "path": out_path,
            "bundleFormat": export.bundle_format,
            "entryCount": export.entry_count,
            "dbSha256": export.db_sha256,
        }),
    )
}

/// Adopts a browser export as the current roster. An array is the term
/// roster's layout; anything else is read as the subject roster. Nothing
/// changes unless the blob parses and passes the load checks.
fn adopt_browser_snapshot(
    state: &mut AppState,
    req: &Request,
    in_path: &str,
    text: &str,
) -> serde_json::Value {
    let bad_snapshot = |e: anyhow::Error| {
        err(
            &req.id,
            "bad_snapshot",
            format!("{e:#}"),
            Some(json!({ "path": in_path })),
        )
    };
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => return bad_snapshot(e.into()),
    };

    let mut result = if value.is_array() {
        let term = match serde_json::from_value::<TermRoster>(value) {
            Ok(t) => t.normalized(),
            Err(e) => return bad_snapshot(e.into()),
        };
        let persistence = commit_term(state, term);
        term_result(state, persistence)
    } else {
        let parsed = serde_json::from_value::<Roster>(value)
            .map_err(anyhow::Error::from)
            .and_then(|r| r.normalized());
        let roster = match parsed {
            Ok(r) => r,
            Err(e) => return bad_snapshot(e),
        };
        let persistence = commit(state, roster);
        roster_result(state, persistence)
    };
    tracing::info!(path = %in_path, "browser snapshot imported");

    result["bundleFormatDetected"] = json!(backup::FORMAT_BROWSER_SNAPSHOT);
    ok(&req.id, result)
}

/// Restores a bundle into the current workspace, or takes a plain snapshot
/// blob saved by the browser build and adopts it.
fn handle_backup_import_workspace_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let in_path = match required_str(req, "inPath") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        Ok(_) => return err(&req.id, "bad_params", "missing inPath", None),
        Err(e) => return e,
    };
    let Some(workspace_path) = state.workspace.clone() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let src = PathBuf::from(&in_path);
    if !src.is_file() {
        return err(
            &req.id,
            "not_found",
            "bundle file not found",
            Some(json!({ "path": in_path })),
        );
    }

    match backup::read_browser_snapshot(&src) {
        Ok(Some(text)) => return adopt_browser_snapshot(state, req, &in_path, &text),
        Ok(None) => {}
        Err(e) => {
            return err(
                &req.id,
                "io_failed",
                format!("{e:#}"),
                Some(json!({ "path": in_path })),
            )
        }
    }

    // Drop open handle before replacing file.
    state.db = None;

    let import = match backup::import_workspace_bundle(&src, &workspace_path) {
        Ok(v) => v,
        Err(e) => {
            let reopened = open_workspace(state, &workspace_path);
            if let Err(reopen) = reopened {
                tracing::warn!(error = %reopen, "failed to reopen workspace after failed import");
            }
            return err(
                &req.id,
                "io_failed",
                format!("{e:#}"),
                Some(json!({ "path": in_path })),
            );
        }
    };

    let mut opened = match open_workspace(state, &workspace_path) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_open_failed", format!("{e:#}"), None),
    };
    opened["roster"] = json!(crate::report::roster_view(&state.roster));
    opened["term"] = json!(crate::report::term_view(&state.term));
    tracing::info!(format = %import.bundle_format_detected, "workspace imported");

    opened["bundleFormatDetected"] = json!(import.bundle_format_detected);
    ok(&req.id, opened)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_backup_export_workspace_bundle(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import_workspace_bundle(state, req)),
        _ => None,
    }
}
