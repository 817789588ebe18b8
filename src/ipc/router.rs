use super::handlers;
use super::surface::Surface;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: Request,
) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, surface, &req) {
        return resp;
    }
    if let Some(resp) = handlers::session::try_handle(state, surface, &req) {
        return resp;
    }
    if let Some(resp) = handlers::roster::try_handle(state, surface, &req) {
        return resp;
    }
    if let Some(resp) = handlers::tapes::try_handle(state, surface, &req) {
        return resp;
    }
    if let Some(resp) = handlers::feeds::try_handle(state, surface, &req) {
        return resp;
    }
    if let Some(resp) = handlers::worker::try_handle(state, surface, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
    )
}
