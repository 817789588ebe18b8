use serde_json::json;

use super::helpers::get_required_str;
use crate::backend::{self, StudentStatus};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::{feeds, roster};
use crate::ipc::surface::{LocationOption, SuggestionView, Surface};
use crate::ipc::types::{AppState, Request};

fn handle_sign_in(state: &mut AppState, surface: &mut dyn Surface, req: &Request) -> serde_json::Value {
    let raw = match get_required_str(&req.params, "initials") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    let initials = raw.trim().to_uppercase();
    if initials.is_empty() {
        surface.set_status("Please enter your initials", true);
        return err(&req.id, "validation", "initials must not be empty");
    }

    surface.show_loading(true);
    match backend::staff_sign_in(state.remote.as_ref(), &initials) {
        Ok(canonical) => {
            state.staff = Some(canonical.clone());
            surface.set_status(&format!("Signed in as {canonical}"), false);
            load_locations(state, surface);
            ok(&req.id, json!({ "staff": canonical }))
        }
        Err(e) => {
            surface.show_loading(false);
            surface.set_status(&format!("Sign in failed: {e}"), true);
            err(&req.id, "backend_failed", e.to_string())
        }
    }
}

fn load_locations(state: &mut AppState, surface: &mut dyn Surface) {
    match backend::get_locations(state.remote.as_ref()) {
        Ok(locations) => {
            state.locations = locations.clone();
            let mut options = vec![LocationOption {
                value: String::new(),
                label: "-- Select Location --".to_string(),
            }];
            options.extend(locations.into_iter().map(|loc| LocationOption {
                value: loc.clone(),
                label: loc,
            }));
            surface.render_locations(&options);
            surface.show_loading(false);
            surface.set_status("Ready", false);
        }
        Err(e) => {
            surface.show_loading(false);
            surface.set_status(&format!("Failed to load locations: {e}"), true);
        }
    }
}

fn handle_location_change(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> serde_json::Value {
    let location = match get_required_str(&req.params, "location") {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m),
    };
    if !location.is_empty() && !state.locations.contains(&location) {
        return err(&req.id, "bad_params", format!("unknown location: {location}"));
    }

    state.location = location;
    surface.clear_search_inputs();
    surface.render_suggestions(StudentStatus::Active, &SuggestionView::Clear);
    surface.render_suggestions(StudentStatus::Inactive, &SuggestionView::Clear);
    roster::clear_student(state, surface);

    if state.location.is_empty() {
        surface.set_status("Select a location", false);
    } else {
        surface.set_status(&format!("Location: {}", state.location), false);
        feeds::refresh_priority(state, surface);
    }
    ok(&req.id, json!({ "location": state.location }))
}

pub fn try_handle(
    state: &mut AppState,
    surface: &mut dyn Surface,
    req: &Request,
) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.signIn" => Some(handle_sign_in(state, surface, req)),
        "session.locationChange" => Some(handle_location_change(state, surface, req)),
        _ => None,
    }
}
