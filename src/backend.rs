//! Typed contracts for the backend operations the app consumes. The wire
//! protocol is untyped JSON; every result is validated here at the boundary
//! and a bad shape fails the call like any other backend failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::rpc::{Remote, RpcError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentStatus {
    Active,
    Inactive,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StudentStatus::Active => "ACTIVE",
            StudentStatus::Inactive => "INACTIVE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(StudentStatus::Active),
            "INACTIVE" => Some(StudentStatus::Inactive),
            _ => None,
        }
    }
}

/// Roster record as the backend returns it. Field casing follows the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Student {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    #[serde(rename = "PhotoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(rename = "BeltLevel", default, skip_serializing_if = "Option::is_none")]
    pub belt_level: Option<String>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub display_name: String,
    pub tape: String,
    pub staff: String,
    pub location: String,
    /// ISO string or epoch milliseconds depending on the backend column.
    pub timestamp: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverdueTape {
    pub tape: String,
    pub days_over: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PriorityStudent {
    #[serde(rename = "StudentID")]
    pub student_id: String,
    #[serde(rename = "DisplayName")]
    pub display_name: String,
    /// Most-urgent-first ordering is the backend's contract.
    #[serde(default)]
    pub overdue: Vec<OverdueTape>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogTapeRequest {
    pub student_id: String,
    pub display_name: String,
    pub location: String,
    pub tape: String,
    pub staff_initials: String,
    pub note: String,
}

/// Collections may come back as JSON null when a sheet is empty; treat that
/// as the empty value rather than a shape error.
fn decode<T: DeserializeOwned + Default>(function: &str, value: Value) -> Result<T, RpcError> {
    if value.is_null() {
        return Ok(T::default());
    }
    decode_required(function, value)
}

fn decode_required<T: DeserializeOwned>(function: &str, value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::new(format!("{function}: bad result shape: {e}")))
}

pub fn staff_sign_in(remote: &dyn Remote, initials: &str) -> Result<String, RpcError> {
    let result = remote.invoke("staffSignIn", vec![json!(initials)])?;
    result
        .get("initials")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| RpcError::new("staffSignIn: missing initials in result"))
}

pub fn get_locations(remote: &dyn Remote) -> Result<Vec<String>, RpcError> {
    decode("getLocations", remote.invoke("getLocations", vec![])?)
}

pub fn search_roster_by_status(
    remote: &dyn Remote,
    query: &str,
    location: &str,
    status: StudentStatus,
) -> Result<Vec<Student>, RpcError> {
    decode(
        "searchRosterByStatus",
        remote.invoke(
            "searchRosterByStatus",
            vec![json!(query), json!(location), json!(status.as_str())],
        )?,
    )
}

/// Maps tape name to the timestamp it was last earned; absent means never.
pub fn get_last_logs_fast(
    remote: &dyn Remote,
    student_id: &str,
) -> Result<HashMap<String, Value>, RpcError> {
    decode(
        "getLastLogsFast",
        remote.invoke("getLastLogsFast", vec![json!(student_id)])?,
    )
}

pub fn log_tape(remote: &dyn Remote, request: &LogTapeRequest) -> Result<(), RpcError> {
    let payload = serde_json::to_value(request)
        .map_err(|e| RpcError::new(format!("logTape: bad payload: {e}")))?;
    remote.invoke("logTape", vec![payload])?;
    Ok(())
}

pub fn get_recent_logs(remote: &dyn Remote, limit: u32) -> Result<Vec<LogRecord>, RpcError> {
    decode(
        "getRecentLogs",
        remote.invoke("getRecentLogs", vec![json!(limit)])?,
    )
}

pub fn get_priority_overdue(
    remote: &dyn Remote,
    location: &str,
) -> Result<Vec<PriorityStudent>, RpcError> {
    decode(
        "getPriorityOverdue",
        remote.invoke("getPriorityOverdue", vec![json!(location)])?,
    )
}

pub fn fetch_roster_by_id(remote: &dyn Remote, student_id: &str) -> Result<Student, RpcError> {
    decode_required(
        "fetchRosterById",
        remote.invoke("fetchRosterById", vec![json!(student_id)])?,
    )
}
