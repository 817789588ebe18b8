use serde_json::Value;
use thiserror::Error;

/// Uniform failure signal for backend calls. Transport errors, HTTP error
/// statuses, error bodies and malformed results all collapse into one
/// human-readable message; callers never distinguish the cause.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct RpcError(pub String);

impl RpcError {
    pub fn new(message: impl Into<String>) -> Self {
        RpcError(message.into())
    }
}

/// Remote-procedure-call seam to the backend: one named operation, positional
/// JSON arguments, one result or one error per invocation. No retries, no
/// timeouts, no batching.
pub trait Remote {
    fn invoke(&self, function: &str, args: Vec<Value>) -> Result<Value, RpcError>;
}

/// Production client: a single POST per call to the fixed backend URL with a
/// `{"function": name, "args": [...]}` body.
pub struct HttpRemote {
    http: reqwest::blocking::Client,
    backend_url: String,
}

impl HttpRemote {
    pub fn new(backend_url: impl Into<String>) -> Self {
        HttpRemote {
            http: reqwest::blocking::Client::new(),
            backend_url: backend_url.into(),
        }
    }
}

/// The backend reports failure through a truthy `error` field. Absent, null,
/// empty-string, false and zero all count as success.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

impl Remote for HttpRemote {
    fn invoke(&self, function: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        let body = serde_json::json!({ "function": function, "args": args });
        let resp = self
            .http
            .post(&self.backend_url)
            .json(&body)
            .send()
            .map_err(|e| RpcError::new(format!("network error: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RpcError::new(format!(
                "HTTP error! status: {}",
                status.as_u16()
            )));
        }
        let data: Value = resp
            .json()
            .map_err(|e| RpcError::new(format!("bad response body: {e}")))?;
        if let Some(message) = error_message(&data) {
            return Err(RpcError::new(message));
        }
        Ok(data.get("result").cloned().unwrap_or(Value::Null))
    }
}
