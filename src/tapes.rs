use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Fixed catalog rendered for every student, in display order. Identical
/// across locations and not configurable at runtime.
pub const TAPE_CATALOG: [&str; 14] = [
    "Silver Cycle Tape",
    "Purple Cycle Tape",
    "Neon Green Cycle Tape",
    "Neon Orange Cycle Tape",
    "Red",
    "Red 2",
    "White 1",
    "White 2",
    "Green 1",
    "Green 2",
    "Blue 1",
    "Blue 2",
    "Black Tape (for Yellow 1st Belt Only)",
    "Yellow Tape",
];

pub fn is_catalog_tape(tape: &str) -> bool {
    TAPE_CATALOG.contains(&tape)
}

/// A tape selected for submission but not yet committed to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapePick {
    pub tape: String,
    pub note: String,
}

/// Adds the tape if it is not pending, removes it if it is. Returns true when
/// the tape ends up pending.
pub fn toggle_pick(picks: &mut Vec<TapePick>, tape: &str) -> bool {
    if let Some(idx) = picks.iter().position(|p| p.tape == tape) {
        picks.remove(idx);
        false
    } else {
        picks.push(TapePick {
            tape: tape.to_string(),
            note: String::new(),
        });
        true
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TapeTile {
    pub tape: String,
    pub earned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_since: Option<i64>,
    pub selected: bool,
}

/// Timestamps arrive as ISO strings or epoch milliseconds depending on the
/// backend column type.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|n| n.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Whole days elapsed, floored.
pub fn days_since(last: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last).num_days()
}

pub fn build_grid(
    last_logs: &HashMap<String, Value>,
    picks: &[TapePick],
    now: DateTime<Utc>,
) -> Vec<TapeTile> {
    TAPE_CATALOG
        .iter()
        .map(|&tape| {
            let last = last_logs.get(tape).and_then(parse_timestamp);
            TapeTile {
                tape: tape.to_string(),
                earned: last.is_some(),
                days_since: last.map(|dt| days_since(dt, now)),
                selected: picks.iter().any(|p| p.tape == tape),
            }
        })
        .collect()
}

/// Feed display format; falls back to the raw value when unparseable.
pub fn format_local_timestamp(value: &Value) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}
