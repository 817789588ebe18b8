use serde_json::json;
use tracing::warn;

use super::helpers::get_required_str;
use crate::backend;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::roster;
use crate::ipc::surface::{ActivityItem, PriorityItem, Surface};
use crate::ipc::types::{AppState, Request};
use crate::tapes::format_local_timestamp;

const RECENT_LOG_LIMIT: u32 = 20;
const PRIORITY_RENDER_CAP: usize = 10;

/// Non-critical feed: failures degrade silently. Returns whether a render
/// happened.
pub(crate) fn refresh_recent(state: &mut AppState, surface: &mut dyn Surface) -> bool {
    match backend::get_recent_logs(state.remote.as_ref(), RECENT_LOG_LIMIT) {
        Ok(logs) => {
            let items: Vec<ActivityItem> = logs
                .iter()
                .map(|l| ActivityItem {
                    display_name: l.display_name.clone(),
                    tape: l.tape.clone(),
                    staff: l.staff.clone(),
                    location: l.location.clone(),
                    timestamp: format_local_timestamp(&l.timestamp),
                })
                .collect();
            surface.render_recent_activity(&items);
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to load recent activity");
            false
        }
    }
}

/// Non-critical feed: no-op without a location, failures degrade silently.
pub(crate) fn refresh_priority(state: &mut AppState, surface: &mut dyn Surface) -> bool {
    if state.location.is_empty() {
        return false;
    }
    match backend::get_priority_overdue(state.remote.as_ref(), &state.location) {
        Ok(students) => {
            // First ten students, first (most urgent) overdue entry each.
            let items: Vec<PriorityItem> = students
                .iter()
                .take(PRIORITY_RENDER_CAP)
                .filter_map(|s| {
                    s.overdue.first().map(|o| PriorityItem {
                        student_id: s.student_id.clone(),
                        display_name: s.display_name.clone(),
                        tape: o.tape.clone(),
                        days_over: o.days_over,
                    })
                })
                .collect();
            surface.render_priority_list(&items);
            true
        }
        Err(e) => {
            warn!(error = %e, "failed to load priority list");
            false
        }
    }
}

fn handle_recent_refresh(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> serde_json::Value {
    let refreshed = refresh_recent(state, surface);
    ok(&req.id, json!({ "refreshed": refreshed }))
}

fn handle_priority_refresh(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> serde_json::Value {
    if state.location.is_empty() {
        return ok(&req.id, json!({ "skipped": true }));
    }
    let refreshed = refresh_priority(state, surface);
    ok(&req.id, json!({ "refreshed": refreshed }))
}

fn handle_priority_select(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> serde_json::Value {
    let student_id = match get_required_str(&req.params, "studentId") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    match backend::fetch_roster_by_id(state.remote.as_ref(), &student_id) {
        Ok(student) => {
            roster::select_student(state, surface, student);
            ok(&req.id, json!({ "studentId": student_id }))
        }
        Err(e) => {
            surface.set_status(&format!("Failed to load student: {e}"), true);
            err(&req.id, "backend_failed", e.to_string())
        }
    }
}

pub fn try_handle(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "feeds.recentRefresh" => Some(handle_recent_refresh(state, surface, req)),
        "feeds.priorityRefresh" => Some(handle_priority_refresh(state, surface, req)),
        "feeds.prioritySelect" => Some(handle_priority_select(state, surface, req)),
        _ => None,
    }
}
