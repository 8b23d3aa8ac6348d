use crate::ipc::error::{err, ok, rank_err};
use crate::ipc::helpers::{commit, required_index, required_str, roster_result};
use crate::ipc::types::{AppState, Request};
use crate::validate::{coerce_mark_input, MainPart, MarkKind};
use serde_json::json;

fn handle_marks_set_main(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match required_index(req, "student", state.roster.students.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject = match required_index(req, "subject", state.roster.main_subjects.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let part_raw = match required_str(req, "part") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(part) = MainPart::parse(&part_raw) else {
        return err(
            &req.id,
            "bad_params",
            "part must be one of: UT, Final",
            Some(json!({ "part": part_raw })),
        );
    };

    let value = match coerce_mark_input(part.kind(), req.params.get("value")) {
        Ok(v) => v,
        Err(e) => return rank_err(&req.id, &e),
    };
    match state.roster.set_main_mark(student, subject, part, value) {
        Ok(next) => {
            let persistence = commit(state, next);
            ok(&req.id, roster_result(state, persistence))
        }
        Err(e) => {
            tracing::debug!(student, subject, value, "mark edit rejected");
            rank_err(&req.id, &e)
        }
    }
}

fn handle_marks_set_additional(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match required_index(req, "student", state.roster.students.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject = match required_index(req, "subject", state.roster.additional_subjects.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let value = match coerce_mark_input(MarkKind::Additional, req.params.get("value")) {
        Ok(v) => v,
        Err(e) => return rank_err(&req.id, &e),
    };
    match state.roster.set_additional_mark(student, subject, value) {
        Ok(next) => {
            let persistence = commit(state, next);
            ok(&req.id, roster_result(state, persistence))
        }
        Err(e) => {
            tracing::debug!(student, subject, value, "mark edit rejected");
            rank_err(&req.id, &e)
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.setMain" => Some(handle_marks_set_main(state, req)),
        "marks.setAdditional" => Some(handle_marks_set_additional(state, req)),
        _ => None,
    }
}
