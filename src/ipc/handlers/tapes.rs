use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::helpers::get_required_str;
use crate::backend::{self, LogTapeRequest};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::{feeds, roster};
use crate::ipc::surface::Surface;
use crate::ipc::types::{AppState, Request};
use crate::tapes;

fn handle_toggle(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    let tape = match get_required_str(&req.params, "tape") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    if !tapes::is_catalog_tape(&tape) {
        return err(&req.id, "bad_params", format!("unknown tape: {tape}"));
    }
    if state.current_student.is_none() {
        return err(&req.id, "no_student", "no student selected");
    }

    let pending = tapes::toggle_pick(&mut state.picks, &tape);
    surface.update_tape_counter(state.picks.len());
    let grid = tapes::build_grid(&state.last_logs, &state.picks, Utc::now());
    surface.render_tape_grid(&grid);
    ok(
        &req.id,
        json!({ "tape": tape, "pending": pending, "pendingCount": state.picks.len() }),
    )
}

fn handle_log(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    let Some(staff) = state.staff.clone() else {
        surface.set_status("Sign in first", true);
        return err(&req.id, "no_session", "sign in before logging tapes");
    };
    let Some(student) = state.current_student.clone() else {
        surface.set_status("No student selected", true);
        return err(&req.id, "no_student", "no student selected");
    };
    if state.picks.is_empty() {
        surface.set_status("No tapes selected", true);
        return err(&req.id, "no_picks", "no tapes selected");
    }

    surface.show_loading(true);
    let total = state.picks.len();
    let mut completed = 0usize;
    let mut failed = 0usize;

    // Deliberately sequential: one in-flight submission at a time, one
    // success/failure tally per pick.
    for pick in state.picks.clone() {
        let payload = LogTapeRequest {
            student_id: student.student_id.clone(),
            display_name: student.display_name.clone(),
            location: state.location.clone(),
            tape: pick.tape.clone(),
            staff_initials: staff.clone(),
            note: pick.note.clone(),
        };
        match backend::log_tape(state.remote.as_ref(), &payload) {
            Ok(()) => completed += 1,
            Err(e) => {
                failed += 1;
                warn!(tape = %pick.tape, error = %e, "failed to log tape");
            }
        }
    }
    surface.show_loading(false);

    if failed > 0 {
        surface.set_status(&format!("Logged {completed} of {total}"), true);
    } else {
        surface.set_status(&format!("Logged {completed} tapes"), false);
    }

    // Picks clear regardless of outcome; display state is re-derived from a
    // fresh backend read, never patched locally.
    state.picks.clear();
    surface.update_tape_counter(0);
    roster::load_student_tapes(state, surface);
    feeds::refresh_recent(state, surface);
    feeds::refresh_priority(state, surface);

    ok(
        &req.id,
        json!({ "completed": completed, "failed": failed, "total": total }),
    )
}

fn handle_clear_all(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    state.picks.clear();
    surface.update_tape_counter(0);
    if state.current_student.is_some() {
        let grid = tapes::build_grid(&state.last_logs, &state.picks, Utc::now());
        surface.render_tape_grid(&grid);
    }
    surface.set_status("Cleared all picks", false);
    ok(&req.id, json!({}))
}

pub fn try_handle(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "tapes.toggle" => Some(handle_toggle(state, surface, req)),
        "tapes.log" => Some(handle_log(state, surface, req)),
        "tapes.clearAll" => Some(handle_clear_all(state, surface, req)),
        _ => None,
    }
}
