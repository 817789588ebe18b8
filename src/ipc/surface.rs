use std::io::{self, Write};

use serde::Serialize;
use serde_json::json;

use crate::backend::{Student, StudentStatus};
use crate::tapes::TapeTile;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// "DisplayName (StudentID)"
    pub label: String,
    pub student: Student,
}

/// What a suggestion container should show after a search.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionView {
    Clear,
    NoResults,
    Items(Vec<Suggestion>),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentCard {
    pub display_name: String,
    pub student_id: String,
    /// "No belt" when the roster record carries none.
    pub belt_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub display_name: String,
    pub tape: String,
    pub staff: String,
    pub location: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriorityItem {
    pub student_id: String,
    pub display_name: String,
    pub tape: String,
    pub days_over: i64,
}

/// Rendering target the handlers draw into. The production implementation
/// emits JSON render events on stdout for the shell to paint; tests record
/// the calls instead.
pub trait Surface {
    fn set_status(&mut self, message: &str, is_error: bool);
    fn show_loading(&mut self, on: bool);
    fn show_fatal(&mut self, message: &str);
    fn render_locations(&mut self, options: &[LocationOption]);
    fn clear_search_inputs(&mut self);
    fn render_suggestions(&mut self, status: StudentStatus, view: &SuggestionView);
    fn render_student_card(&mut self, card: Option<&StudentCard>);
    fn render_tape_grid(&mut self, tiles: &[TapeTile]);
    fn update_tape_counter(&mut self, pending: usize);
    fn render_recent_activity(&mut self, items: &[ActivityItem]);
    fn render_priority_list(&mut self, items: &[PriorityItem]);
}

pub struct StdoutSurface;

impl StdoutSurface {
    pub fn new() -> Self {
        StdoutSurface
    }

    fn emit(&self, event: serde_json::Value) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{event}");
        let _ = stdout.flush();
    }
}

impl Default for StdoutSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for StdoutSurface {
    fn set_status(&mut self, message: &str, is_error: bool) {
        self.emit(json!({ "event": "status", "message": message, "isError": is_error }));
    }

    fn show_loading(&mut self, on: bool) {
        self.emit(json!({ "event": "loading", "visible": on }));
    }

    fn show_fatal(&mut self, message: &str) {
        self.emit(json!({ "event": "fatal", "message": message }));
    }

    fn render_locations(&mut self, options: &[LocationOption]) {
        self.emit(json!({ "event": "locations", "options": options }));
    }

    fn clear_search_inputs(&mut self) {
        self.emit(json!({ "event": "clearSearchInputs" }));
    }

    fn render_suggestions(&mut self, status: StudentStatus, view: &SuggestionView) {
        let view = match view {
            SuggestionView::Clear => json!({ "kind": "clear" }),
            SuggestionView::NoResults => json!({ "kind": "noResults", "text": "No results" }),
            SuggestionView::Items(items) => json!({ "kind": "items", "items": items }),
        };
        self.emit(json!({ "event": "suggestions", "status": status.as_str(), "view": view }));
    }

    fn render_student_card(&mut self, card: Option<&StudentCard>) {
        self.emit(json!({ "event": "studentCard", "card": card }));
    }

    fn render_tape_grid(&mut self, tiles: &[TapeTile]) {
        self.emit(json!({ "event": "tapeGrid", "tiles": tiles }));
    }

    fn update_tape_counter(&mut self, pending: usize) {
        self.emit(json!({
            "event": "tapeCounter",
            "text": format!("{pending} tape picks pending")
        }));
    }

    fn render_recent_activity(&mut self, items: &[ActivityItem]) {
        self.emit(json!({ "event": "recentActivity", "items": items }));
    }

    fn render_priority_list(&mut self, items: &[PriorityItem]) {
        self.emit(json!({ "event": "priorityList", "items": items }));
    }
}
