use serde_json::json;

use crate::ipc::error::ok;
use crate::ipc::surface::Surface;
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "staff": state.staff,
            "location": state.location,
            "workerPhase": state.worker.phase().as_str(),
        }),
    )
}

pub fn try_handle(
    state: &mut AppState,
    _surface: &mut dyn Surface,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        _ => None,
    }
}
