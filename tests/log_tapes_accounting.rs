mod util;

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use util::{Sidecar, StubBackend};

fn common_script(function: &str) -> Option<Result<Value, String>> {
    match function {
        "staffSignIn" => Some(Ok(json!({ "initials": "MB" }))),
        "getLocations" => Some(Ok(json!(["Downtown"]))),
        "getLastLogsFast" => Some(Ok(json!({}))),
        "getRecentLogs" => Some(Ok(json!([]))),
        "getPriorityOverdue" => Some(Ok(json!([]))),
        _ => None,
    }
}

#[test]
fn partial_backend_failures_are_counted_per_pick() {
    let log_calls = Arc::new(AtomicUsize::new(0));
    let counter = log_calls.clone();
    let backend = StubBackend::spawn(move |function, args| {
        if let Some(resp) = common_script(function) {
            return resp;
        }
        match function {
            "logTape" => {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let tape = args[0]["tape"].as_str().unwrap_or("");
                if tape == "Blue 1" {
                    Err("sheet locked".to_string())
                } else {
                    Ok(json!({ "row": n }))
                }
            }
            other => Err(format!("unknown function: {other}")),
        }
    });
    let mut sidecar = Sidecar::spawn(&[("TAPETALLY_BACKEND_URL", &backend.url)]);

    sidecar.request("1", "session.signIn", json!({ "initials": "MB" }));
    sidecar.request("2", "session.locationChange", json!({ "location": "Downtown" }));
    sidecar.request(
        "3",
        "roster.select",
        json!({ "student": { "StudentID": "S-1", "DisplayName": "Avery Chen" } }),
    );
    for (i, tape) in ["Red", "Blue 1", "White 1"].iter().enumerate() {
        let (resp, _) = sidecar.request(&format!("t{i}"), "tapes.toggle", json!({ "tape": tape }));
        assert_eq!(resp["result"]["pendingCount"], json!(i + 1));
    }

    let (resp, events) = sidecar.request("log", "tapes.log", json!({}));
    assert_eq!(resp["result"]["completed"], json!(2));
    assert_eq!(resp["result"]["failed"], json!(1));
    assert_eq!(resp["result"]["total"], json!(3));
    assert_eq!(log_calls.load(Ordering::SeqCst), 3);

    // The shell shows the shortfall, not a silent success.
    assert!(
        events.iter().any(|e| e["event"] == json!("status")
            && e["message"] == json!("Logged 2 of 3")
            && e["isError"] == json!(true)),
        "missing error status, got: {events:?}"
    );

    // Picks are cleared either way; a second submit has nothing to send.
    let (again, _) = sidecar.request("log2", "tapes.log", json!({}));
    assert_eq!(again["error"]["code"], json!("no_picks"));
}

#[test]
fn logging_requires_a_session_and_a_student() {
    let backend = StubBackend::spawn(|function, _| {
        common_script(function).unwrap_or_else(|| Err(format!("unknown function: {function}")))
    });
    let mut sidecar = Sidecar::spawn(&[("TAPETALLY_BACKEND_URL", &backend.url)]);

    let (resp, _) = sidecar.request("1", "tapes.log", json!({}));
    assert_eq!(resp["error"]["code"], json!("no_session"));

    sidecar.request("2", "session.signIn", json!({ "initials": "MB" }));
    let (resp, _) = sidecar.request("3", "tapes.log", json!({}));
    assert_eq!(resp["error"]["code"], json!("no_student"));

    // Toggling needs a student too.
    let (resp, _) = sidecar.request("4", "tapes.toggle", json!({ "tape": "Red" }));
    assert_eq!(resp["error"]["code"], json!("no_student"));

    // And only catalog tapes are toggleable.
    sidecar.request(
        "5",
        "roster.select",
        json!({ "student": { "StudentID": "S-1", "DisplayName": "Avery Chen" } }),
    );
    let (resp, _) = sidecar.request("6", "tapes.toggle", json!({ "tape": "Polka Dot" }));
    assert_eq!(resp["error"]["code"], json!("bad_params"));
}

#[test]
fn switching_students_discards_pending_picks() {
    let backend = StubBackend::spawn(|function, _| {
        common_script(function).unwrap_or_else(|| Err(format!("unknown function: {function}")))
    });
    let mut sidecar = Sidecar::spawn(&[("TAPETALLY_BACKEND_URL", &backend.url)]);

    sidecar.request("1", "session.signIn", json!({ "initials": "MB" }));
    sidecar.request(
        "2",
        "roster.select",
        json!({ "student": { "StudentID": "S-1", "DisplayName": "Avery Chen" } }),
    );
    let (resp, _) = sidecar.request("3", "tapes.toggle", json!({ "tape": "Red" }));
    assert_eq!(resp["result"]["pendingCount"], json!(1));

    let (_, events) = sidecar.request(
        "4",
        "roster.select",
        json!({ "student": { "StudentID": "S-2", "DisplayName": "Sam Okafor" } }),
    );
    assert!(
        events.iter().any(|e| e["event"] == json!("tapeCounter")
            && e["text"] == json!("0 tape picks pending")),
        "counter not reset, got: {events:?}"
    );

    let (resp, _) = sidecar.request("5", "tapes.log", json!({}));
    assert_eq!(resp["error"]["code"], json!("no_picks"));
}
