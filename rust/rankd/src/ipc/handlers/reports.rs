use crate::ipc::error::{err, ok, rank_err};
use crate::ipc::helpers::required_str;
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::json;
use std::path::PathBuf;

fn handle_reports_ranking_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = chrono::Local::now().date_naive();
    match report::build_ranking_report(&state.roster, today) {
        Ok(model) => ok(&req.id, json!(model)),
        Err(e) => rank_err(&req.id, &e),
    }
}

/// Writes `model` as CSV to the request's `outPath`.
pub fn write_report_csv(req: &Request, model: &report::RankingReport) -> serde_json::Value {
    let out_path = match required_str(req, "outPath") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        Ok(_) => return err(&req.id, "bad_params", "missing outPath", None),
        Err(e) => return e,
    };
    let csv = report::report_csv(model);

    let out = PathBuf::from(&out_path);
    if let Some(parent) = out.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return err(
                &req.id,
                "io_failed",
                e.to_string(),
                Some(json!({ "path": out_path })),
            );
        }
    }
    if let Err(e) = std::fs::write(&out, csv) {
        return err(
            &req.id,
            "io_failed",
            e.to_string(),
            Some(json!({ "path": out_path })),
        );
    }
    tracing::info!(path = %out_path, rows = model.rows.len(), "report exported");

    ok(
        &req.id,
        json!({
            "path": out_path,
            "rowsExported": model.rows.len(),
        }),
    )
}

fn handle_reports_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = chrono::Local::now().date_naive();
    match report::build_ranking_report(&state.roster, today) {
        Ok(model) => write_report_csv(req, &model),
        Err(e) => rank_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.rankingModel" => Some(handle_reports_ranking_model(state, req)),
        "reports.exportCsv" => Some(handle_reports_export_csv(state, req)),
        _ => None,
    }
}
