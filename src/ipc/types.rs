use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::backend::Student;
use crate::offline::CacheWorker;
use crate::rpc::Remote;
use crate::tapes::TapePick;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// All page-lifetime state the handlers mutate. Nothing here survives a
/// process restart; the backend owns every durable record.
pub struct AppState {
    pub staff: Option<String>,
    /// Currently selected location; empty string means unselected.
    pub location: String,
    pub locations: Vec<String>,
    pub current_student: Option<Student>,
    /// Ordered pending picks for the current student, no duplicate tapes.
    /// Discarded whenever the selected student changes.
    pub picks: Vec<TapePick>,
    /// Last tape history fetched for the current student; used to re-render
    /// the grid when the selection toggles.
    pub last_logs: HashMap<String, Value>,
    pub remote: Box<dyn Remote>,
    pub worker: CacheWorker,
}

impl AppState {
    pub fn new(remote: Box<dyn Remote>, worker: CacheWorker) -> Self {
        AppState {
            staff: None,
            location: String::new(),
            locations: Vec::new(),
            current_student: None,
            picks: Vec::new(),
            last_logs: HashMap::new(),
            remote,
            worker,
        }
    }
}
