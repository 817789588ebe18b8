mod backend;
mod config;
mod ipc;
mod offline;
mod rpc;
mod tapes;

use std::io::{self, BufRead, Write};

use offline::{CacheStore, CacheWorker, HttpFetcher};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cfg = match config::Config::from_env() {
        Ok(v) => v,
        Err(e) => {
            // The shell renders this as the fatal banner.
            fatal(&format!("{e}"));
            std::process::exit(1);
        }
    };

    let store = match cfg
        .cache_db
        .as_deref()
        .map(CacheStore::open)
        .unwrap_or_else(CacheStore::open_in_memory)
    {
        Ok(v) => v,
        Err(e) => {
            fatal(&format!("cache store open failed: {e:#}"));
            std::process::exit(1);
        }
    };
    let worker = CacheWorker::new(
        store,
        Box::new(HttpFetcher::new()),
        cfg.cache_generation.clone(),
        &cfg.backend_url,
        cfg.shell_base_url.clone(),
        config::SHELL_FILES.iter().map(|s| s.to_string()).collect(),
        config::OFFLINE_URL,
    );

    let mut state = ipc::AppState::new(Box::new(rpc::HttpRemote::new(cfg.backend_url)), worker);
    let mut surface = ipc::StdoutSurface::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with an id; report and keep serving.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{resp}");
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, &mut surface, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}

fn fatal(message: &str) {
    let mut stdout = io::stdout();
    let _ = writeln!(
        stdout,
        "{}",
        serde_json::json!({ "event": "fatal", "message": message })
    );
    let _ = stdout.flush();
}
