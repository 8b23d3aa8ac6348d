use crate::ipc::error::{ok, rank_err};
use crate::ipc::helpers::{commit, required_index, required_str, roster_result};
use crate::ipc::types::{AppState, Request};
use crate::model::SubjectList;

fn handle_subjects_add(state: &mut AppState, req: &Request, list: SubjectList) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let next = match list {
        SubjectList::Main => state.roster.add_main_subject(&name),
        SubjectList::Additional => state.roster.add_additional_subject(&name),
    };
    match next {
        Ok(next) => {
            tracing::info!(list = list.as_str(), name = name.trim(), "subject added");
            let persistence = commit(state, next);
            ok(&req.id, roster_result(state, persistence))
        }
        Err(e) => rank_err(&req.id, &e),
    }
}

fn handle_subjects_remove(
    state: &mut AppState,
    req: &Request,
    list: SubjectList,
) -> serde_json::Value {
    let index = match required_index(req, "index", state.roster.subjects(list).len()) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let removed = state.roster.subjects(list)[index].clone();
    let next = match list {
        SubjectList::Main => state.roster.remove_main_subject(index),
        SubjectList::Additional => state.roster.remove_additional_subject(index),
    };
    tracing::info!(list = list.as_str(), name = %removed, "subject removed");
    let persistence = commit(state, next);
    ok(&req.id, roster_result(state, persistence))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "subjects.addMain" => Some(handle_subjects_add(state, req, SubjectList::Main)),
        "subjects.addAdditional" => Some(handle_subjects_add(state, req, SubjectList::Additional)),
        "subjects.removeMain" => Some(handle_subjects_remove(state, req, SubjectList::Main)),
        "subjects.removeAdditional" => {
            Some(handle_subjects_remove(state, req, SubjectList::Additional))
        }
        _ => None,
    }
}
