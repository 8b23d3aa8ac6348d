use crate::ipc::error::ok;
use crate::ipc::helpers::{commit, optional_text, required_index, roster_result};
use crate::ipc::types::{AppState, Request};

fn handle_students_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let next = state.roster.add_student();
    let index = next.students.len() - 1;
    let persistence = commit(state, next);
    let mut result = roster_result(state, persistence);
    result["index"] = serde_json::json!(index);
    ok(&req.id, result)
}

fn handle_students_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index", state.roster.students.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let next = state.roster.remove_student(index);
    tracing::debug!(index, "student removed");
    let persistence = commit(state, next);
    ok(&req.id, roster_result(state, persistence))
}

fn handle_students_rename(state: &mut AppState, req: &Request) -> serde_json::Value {
    let index = match required_index(req, "index", state.roster.students.len()) {
        Ok(v) => v,
        Err(e) => return e,
    };
    // Blank is allowed here; ranking is what insists on names.
    let name = match optional_text(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let next = state.roster.rename_student(index, &name);
    let persistence = commit(state, next);
    ok(&req.id, roster_result(state, persistence))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "students.add" => Some(handle_students_add(state, req)),
        "students.remove" => Some(handle_students_remove(state, req)),
        "students.rename" => Some(handle_students_rename(state, req)),
        _ => None,
    }
}
