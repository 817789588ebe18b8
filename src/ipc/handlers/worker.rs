use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;

use super::helpers::get_required_str;
use crate::ipc::error::{err, ok};
use crate::ipc::surface::Surface;
use crate::ipc::types::{AppState, Request};
use crate::offline::FetchRequest;

fn handle_install(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.worker.install() {
        Ok(cached) => ok(
            &req.id,
            json!({
                "cached": cached,
                "generation": state.worker.generation(),
                "phase": state.worker.phase().as_str(),
            }),
        ),
        Err(e) => err(&req.id, "install_failed", format!("{e:#}")),
    }
}

fn handle_activate(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.worker.activate() {
        Ok(purged) => ok(
            &req.id,
            json!({ "purged": purged, "phase": state.worker.phase().as_str() }),
        ),
        Err(e) => err(&req.id, "activate_failed", format!("{e:#}")),
    }
}

fn handle_fetch(state: &mut AppState, req: &Request) -> serde_json::Value {
    let url = match get_required_str(&req.params, "url") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    let method = req
        .params
        .get("method")
        .and_then(|v| v.as_str())
        .unwrap_or("GET")
        .to_uppercase();
    let navigate = req
        .params
        .get("navigate")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    let fetch_req = FetchRequest { url, method, navigate };
    match state.worker.handle_fetch(&fetch_req) {
        Ok(resp) => ok(
            &req.id,
            json!({
                "status": resp.status,
                "contentType": resp.content_type,
                "servedFrom": resp.served_from.as_str(),
                "body": BASE64.encode(&resp.body),
            }),
        ),
        Err(e) => err(&req.id, "fetch_failed", format!("{e:#}")),
    }
}

fn handle_message(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match get_required_str(&req.params, "type") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    if kind != "SKIP_WAITING" {
        return err(&req.id, "bad_params", format!("unsupported message type: {kind}"));
    }
    match state.worker.skip_waiting() {
        Ok(activated) => ok(
            &req.id,
            json!({ "activated": activated, "phase": state.worker.phase().as_str() }),
        ),
        Err(e) => err(&req.id, "activate_failed", format!("{e:#}")),
    }
}

pub fn try_handle(
    state: &mut AppState,
    _surface: &mut dyn Surface,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "worker.install" => Some(handle_install(state, req)),
        "worker.activate" => Some(handle_activate(state, req)),
        "worker.fetch" => Some(handle_fetch(state, req)),
        "worker.message" => Some(handle_message(state, req)),
        _ => None,
    }
}
