use crate::ipc::error::{ok, rank_err};
use crate::ipc::helpers::{commit, roster_result};
use crate::ipc::types::{AppState, Request};

fn handle_ranking_compute(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.roster.rank() {
        Ok(next) => {
            tracing::info!(students = next.students.len(), "rankings calculated");
            let persistence = commit(state, next);
            ok(&req.id, roster_result(state, persistence))
        }
        Err(e) => rank_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "ranking.compute" => Some(handle_ranking_compute(state, req)),
        _ => None,
    }
}
