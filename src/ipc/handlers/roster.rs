use chrono::Utc;
use serde_json::json;

use super::helpers::get_required_str;
use crate::backend::{self, Student, StudentStatus};
use crate::ipc::error::{err, ok};
use crate::ipc::surface::{StudentCard, Suggestion, SuggestionView, Surface};
use crate::ipc::types::{AppState, Request};
use crate::tapes;

/// Queries shorter than this never reach the backend.
const MIN_QUERY_LEN: usize = 2;

fn handle_search(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    let query = match get_required_str(&req.params, "query") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    let status_raw = match get_required_str(&req.params, "status") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    let Some(status) = StudentStatus::parse(&status_raw) else {
        return err(&req.id, "bad_params", format!("unknown status: {status_raw}"));
    };

    let query = query.trim().to_string();
    if query.chars().count() < MIN_QUERY_LEN {
        surface.render_suggestions(status, &SuggestionView::Clear);
        return ok(&req.id, json!({ "cleared": true }));
    }

    surface.show_loading(true);
    match backend::search_roster_by_status(state.remote.as_ref(), &query, &state.location, status) {
        Ok(students) => {
            surface.show_loading(false);
            let view = if students.is_empty() {
                SuggestionView::NoResults
            } else {
                SuggestionView::Items(
                    students
                        .iter()
                        .map(|s| Suggestion {
                            label: format!("{} ({})", s.display_name, s.student_id),
                            student: s.clone(),
                        })
                        .collect(),
                )
            };
            surface.render_suggestions(status, &view);
            ok(&req.id, json!({ "count": students.len() }))
        }
        Err(e) => {
            surface.show_loading(false);
            surface.set_status(&format!("Search failed: {e}"), true);
            err(&req.id, "backend_failed", e.to_string())
        }
    }
}

/// Shared select path for search suggestions and priority-list clicks.
/// Switching students discards any pending picks.
pub(crate) fn select_student(state: &mut AppState, surface: &mut dyn Surface, student: Student) {
    state.current_student = Some(student.clone());
    state.picks.clear();
    state.last_logs.clear();

    surface.render_suggestions(StudentStatus::Active, &SuggestionView::Clear);
    surface.render_suggestions(StudentStatus::Inactive, &SuggestionView::Clear);
    surface.clear_search_inputs();

    let card = StudentCard {
        display_name: student.display_name.clone(),
        student_id: student.student_id.clone(),
        belt_level: student
            .belt_level
            .clone()
            .unwrap_or_else(|| "No belt".to_string()),
        photo_url: student.photo_url.clone(),
    };
    surface.render_student_card(Some(&card));
    surface.update_tape_counter(0);

    load_student_tapes(state, surface);
}

pub(crate) fn load_student_tapes(state: &mut AppState, surface: &mut dyn Surface) {
    let Some(student_id) = state.current_student.as_ref().map(|s| s.student_id.clone()) else {
        return;
    };
    surface.show_loading(true);
    match backend::get_last_logs_fast(state.remote.as_ref(), &student_id) {
        Ok(logs) => {
            surface.show_loading(false);
            state.last_logs = logs;
            let grid = tapes::build_grid(&state.last_logs, &state.picks, Utc::now());
            surface.render_tape_grid(&grid);
        }
        Err(e) => {
            surface.show_loading(false);
            surface.set_status(&format!("Failed to load tapes: {e}"), true);
        }
    }
}

pub(crate) fn clear_student(state: &mut AppState, surface: &mut dyn Surface) {
    state.current_student = None;
    state.picks.clear();
    state.last_logs.clear();
    surface.render_student_card(None);
    surface.render_tape_grid(&[]);
    surface.update_tape_counter(0);
}

fn handle_select(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    let Some(value) = req.params.get("student").cloned() else {
        return err(&req.id, "bad_params", "missing student");
    };
    let student: Student = match serde_json::from_value(value) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("bad student: {e}")),
    };
    let student_id = student.student_id.clone();
    select_student(state, surface, student);
    ok(&req.id, json!({ "studentId": student_id }))
}

fn handle_clear(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    clear_student(state, surface);
    ok(&req.id, json!({}))
}

pub fn try_handle(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.search" => Some(handle_search(state, surface, req)),
        "roster.select" => Some(handle_select(state, surface, req)),
        "roster.clear" => Some(handle_clear(state, surface, req)),
        _ => None,
    }
}
