use crate::db;
use crate::ipc::error::{err, ok, rank_err};
use crate::ipc::handlers::reports::write_report_csv;
use crate::ipc::helpers::{
    commit_term, discard, optional_text, required_index, required_str, term_result,
};
use crate::ipc::types::{AppState, Request};
use crate::report;
use crate::term_roster::{TermField, TermRoster};
use crate::validate::coerce_term_mark;
use serde_json::json;

fn handle_super_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "term": report::term_view(&state.term) }))
}

fn handle_super_add_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let next = state.term.add_student();
    let index = next.students.len() - 1;
    let persistence = commit_term(state, next);
    let mut result = term_result(state, persistence);
    result["index"] = json!(index);
    ok(&req.id, result)
}

fn handle_super_remove_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index", state.term.students.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let next = state.term.remove_student(index);
    let persistence = commit_term(state, next);
    ok(&req.id, term_result(state, persistence))
}

/// Text fields take strings; exam fields are clamped to 0..=1000 and never rejected.
fn handle_super_set_field(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index", state.term.students.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let field_raw = match required_str(req, "field") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(field) = TermField::parse(&field_raw) else {
        return err(
            &req.id,
            "bad_params",
            "field must be one of: name, rollNumber, halfYearlyMarks, finalMarks",
            Some(json!({ "field": field_raw })),
        );
    };

    let next = match field {
        TermField::Exam(exam) => {
            state
                .term
                .set_exam_mark(index, exam, coerce_term_mark(req.params.get("value")))
        }
        TermField::Name | TermField::RollNumber => {
            let text = match optional_text(req, "value") {
                Ok(v) => v,
                Err(e) => return e,
            };
            if field == TermField::Name {
                state.term.set_name(index, &text)
            } else {
                state.term.set_roll_number(index, &text)
            }
        }
    };
    let persistence = commit_term(state, next);
    ok(&req.id, term_result(state, persistence))
}

fn handle_super_rank(state: &mut AppState, req: &Request) -> serde_json::Value {
    let next = state.term.rank();
    tracing::info!(students = next.students.len(), "term rankings calculated");
    let persistence = commit_term(state, next);
    ok(&req.id, term_result(state, persistence))
}

fn handle_super_report_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = chrono::Local::now().date_naive();
    match report::build_term_report(&state.term, today) {
        Ok(model) => ok(&req.id, json!(model)),
        Err(e) => rank_err(&req.id, &e),
    }
}

fn handle_super_export_csv(state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = chrono::Local::now().date_naive();
    match report::build_term_report(&state.term, today) {
        Ok(model) => write_report_csv(req, &model),
        Err(e) => rank_err(&req.id, &e),
    }
}

fn handle_super_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.term = TermRoster::default();
    let persistence = discard(state, db::TERM_STATE_KEY);
    tracing::info!("term roster cleared");
    ok(&req.id, term_result(state, persistence))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "super.get" => Some(handle_super_get(state, req)),
        "super.addStudent" => Some(handle_super_add_student(state, req)),
        "super.removeStudent" => Some(handle_super_remove_student(state, req)),
        "super.setField" => Some(handle_super_set_field(state, req)),
        "super.rank" => Some(handle_super_rank(state, req)),
        "super.reportModel" => Some(handle_super_report_model(state, req)),
        "super.exportCsv" => Some(handle_super_export_csv(state, req)),
        "super.clear" => Some(handle_super_clear(state, req)),
        _ => None,
    }
}
