#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn read_http_request(stream: &mut TcpStream) -> std::io::Result<(String, Vec<u8>)> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let done = line == "\r\n" || line == "\n";
        head.push_str(&line);
        if done {
            break;
        }
    }
    let content_length = head
        .lines()
        .find_map(|l| {
            let (k, v) = l.split_once(':')?;
            if k.trim().eq_ignore_ascii_case("content-length") {
                v.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok((head, body))
}

fn write_http_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> std::io::Result<()> {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Response",
    };
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\ncontent-type: {content_type}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(body)?;
    stream.flush()
}

type RpcHandler = dyn Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static;

/// Minimal stand-in for the remote RPC backend: accepts POSTed
/// `{function, args}` bodies and answers `{result}` or `{error}`.
pub struct StubBackend {
    pub url: String,
    calls: Arc<Mutex<Vec<(String, Value)>>>,
    stop: Arc<AtomicBool>,
}

impl StubBackend {
    pub fn spawn(
        handler: impl Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub backend");
        let addr = listener.local_addr().expect("stub backend addr");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let stop = Arc::new(AtomicBool::new(false));
        let calls: Arc<Mutex<Vec<(String, Value)>>> = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<RpcHandler> = Arc::new(handler);
        {
            let stop = stop.clone();
            let calls = calls.clone();
            thread::spawn(move || loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                match listener.accept() {
                    Ok((mut stream, _)) => {
                        let _ = serve_rpc(&mut stream, &handler, &calls);
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            });
        }
        StubBackend {
            url: format!("http://{addr}/exec"),
            calls,
            stop,
        }
    }

    pub fn calls_for(&self, function: &str) -> usize {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(f, _)| f == function)
            .count()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(25));
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn serve_rpc(
    stream: &mut TcpStream,
    handler: &Arc<RpcHandler>,
    calls: &Arc<Mutex<Vec<(String, Value)>>>,
) -> std::io::Result<()> {
    let (_head, body) = read_http_request(stream)?;
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let function = payload
        .get("function")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let args = payload.get("args").cloned().unwrap_or(Value::Null);
    calls
        .lock()
        .expect("calls lock")
        .push((function.clone(), args.clone()));
    let body = match handler(&function, &args) {
        Ok(result) => json!({ "result": result }).to_string(),
        Err(message) => json!({ "error": message }).to_string(),
    };
    write_http_response(stream, 200, "application/json", body.as_bytes())
}

/// Static file server for exercising the offline cache worker. Stopping it
/// simulates going offline.
pub struct StubSite {
    pub base_url: String,
    pages: Arc<Mutex<HashMap<String, (u16, String, Vec<u8>)>>>,
    stop: Arc<AtomicBool>,
    pub hits: Arc<AtomicUsize>,
}

impl StubSite {
    pub fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub site");
        let addr = listener.local_addr().expect("stub site addr");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let stop = Arc::new(AtomicBool::new(false));
        let pages: Arc<Mutex<HashMap<String, (u16, String, Vec<u8>)>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let hits = Arc::new(AtomicUsize::new(0));
        {
            let stop = stop.clone();
            let pages = pages.clone();
            let hits = hits.clone();
            thread::spawn(move || loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                match listener.accept() {
                    Ok((mut stream, _)) => {
                        hits.fetch_add(1, Ordering::SeqCst);
                        let _ = serve_static(&mut stream, &pages);
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            });
        }
        StubSite {
            base_url: format!("http://{addr}"),
            pages,
            stop,
            hits,
        }
    }

    pub fn set_page(&self, path: &str, status: u16, content_type: &str, body: &[u8]) {
        self.pages.lock().expect("pages lock").insert(
            path.to_string(),
            (status, content_type.to_string(), body.to_vec()),
        );
    }

    /// Stops listening; subsequent connections are refused.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(25));
    }
}

impl Drop for StubSite {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

fn serve_static(
    stream: &mut TcpStream,
    pages: &Arc<Mutex<HashMap<String, (u16, String, Vec<u8>)>>>,
) -> std::io::Result<()> {
    let (head, _body) = read_http_request(stream)?;
    let path = head
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let page = pages.lock().expect("pages lock").get(&path).cloned();
    match page {
        Some((status, content_type, body)) => {
            write_http_response(stream, status, &content_type, &body)
        }
        None => write_http_response(stream, 404, "text/plain", b"not found"),
    }
}

/// Drives a spawned tapetallyd over its JSON-lines protocol.
pub struct Sidecar {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
}

impl Sidecar {
    pub fn spawn(envs: &[(&str, &str)]) -> Self {
        let exe = env!("CARGO_BIN_EXE_tapetallyd");
        let mut cmd = Command::new(exe);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        for (k, v) in envs {
            cmd.env(k, v);
        }
        let mut child = cmd.spawn().expect("spawn tapetallyd");
        let stdin = child.stdin.take().expect("child stdin");
        let stdout = child.stdout.take().expect("child stdout");
        Sidecar {
            child,
            stdin,
            reader: BufReader::new(stdout),
        }
    }

    /// Sends one request and reads lines until the matching response
    /// arrives, collecting the render events emitted along the way.
    pub fn request(&mut self, id: &str, method: &str, params: Value) -> (Value, Vec<Value>) {
        let payload = json!({ "id": id, "method": method, "params": params });
        let (resp, events) = self.raw_line(&payload.to_string());
        assert_eq!(resp.get("id").and_then(|v| v.as_str()), Some(id));
        (resp, events)
    }

    /// Sends a raw line and reads until a non-event line comes back.
    pub fn raw_line(&mut self, line: &str) -> (Value, Vec<Value>) {
        writeln!(self.stdin, "{line}").expect("write request");
        self.stdin.flush().expect("flush request");

        let mut events = Vec::new();
        loop {
            let value = self.read_line();
            if value.get("event").is_some() {
                events.push(value);
                continue;
            }
            return (value, events);
        }
    }

    /// Reads a single JSON line from the sidecar's stdout.
    pub fn read_line(&mut self) -> Value {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).expect("read line");
        assert!(n > 0, "sidecar closed stdout unexpectedly");
        serde_json::from_str(line.trim()).expect("parse sidecar line")
    }
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
