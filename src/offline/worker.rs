use anyhow::{bail, Result};
use tracing::{info, warn};

use super::fetcher::{FetchRequest, FetchResponse, Fetcher, ServedFrom};
use super::store::CacheStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    /// Installed and waiting; eligible for activation immediately
    /// (skip-waiting policy).
    Installed,
    Active,
}

impl WorkerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerPhase::Idle => "idle",
            WorkerPhase::Installed => "installed",
            WorkerPhase::Active => "active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Plain network, no cache read or write.
    PassThrough,
    /// Network-first with cache fallback.
    Handle,
}

pub struct CacheWorker {
    generation: String,
    backend_origin: String,
    shell_base_url: Option<String>,
    shell_files: Vec<String>,
    offline_url: String,
    store: CacheStore,
    fetcher: Box<dyn Fetcher>,
    phase: WorkerPhase,
}

impl CacheWorker {
    pub fn new(
        store: CacheStore,
        fetcher: Box<dyn Fetcher>,
        generation: impl Into<String>,
        backend_url: &str,
        shell_base_url: Option<String>,
        shell_files: Vec<String>,
        offline_url: impl Into<String>,
    ) -> Self {
        CacheWorker {
            generation: generation.into(),
            backend_origin: origin_of(backend_url),
            shell_base_url,
            shell_files,
            offline_url: offline_url.into(),
            store,
            fetcher,
            phase: WorkerPhase::Idle,
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    fn shell_urls(&self) -> Result<Vec<String>> {
        let Some(base) = self.shell_base_url.as_deref() else {
            bail!("no shell base URL configured");
        };
        Ok(self
            .shell_files
            .iter()
            .map(|f| join_url(base, f))
            .collect())
    }

    /// Caches the app shell as a set: every file must fetch with a 200 or
    /// nothing is written.
    pub fn install(&mut self) -> Result<usize> {
        let urls = self.shell_urls()?;
        let mut entries = Vec::with_capacity(urls.len());
        for url in urls {
            let resp = self.fetcher.fetch(&FetchRequest::get(&url))?;
            if resp.status != 200 {
                bail!("shell fetch failed: {} returned {}", url, resp.status);
            }
            entries.push((url, resp));
        }
        self.store.put_all(&self.generation, &entries)?;
        self.phase = WorkerPhase::Installed;
        info!(generation = %self.generation, files = entries.len(), "app shell cached");
        Ok(entries.len())
    }

    /// Deletes every cache from older generations and takes control of open
    /// pages.
    pub fn activate(&mut self) -> Result<Vec<String>> {
        let mut purged = Vec::new();
        for name in self.store.cache_names()? {
            if name != self.generation {
                self.store.delete_cache(&name)?;
                info!(cache = %name, "deleted stale cache");
                purged.push(name);
            }
        }
        self.phase = WorkerPhase::Active;
        Ok(purged)
    }

    /// SKIP_WAITING control message: a waiting worker activates immediately.
    /// Returns whether a transition happened.
    pub fn skip_waiting(&mut self) -> Result<bool> {
        if self.phase == WorkerPhase::Installed {
            self.activate()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Prioritized routing rules: method, then scheme, then backend origin
    /// (mutations must never be served from cache), then lifecycle.
    pub fn route(&self, req: &FetchRequest) -> RouteDecision {
        if req.method != "GET" {
            return RouteDecision::PassThrough;
        }
        if !req.url.starts_with("http") {
            return RouteDecision::PassThrough;
        }
        if req.url.starts_with(&self.backend_origin) {
            return RouteDecision::PassThrough;
        }
        if self.phase != WorkerPhase::Active {
            return RouteDecision::PassThrough;
        }
        RouteDecision::Handle
    }

    pub fn handle_fetch(&mut self, req: &FetchRequest) -> Result<FetchResponse> {
        if self.route(req) == RouteDecision::PassThrough {
            return self.fetcher.fetch(req);
        }
        match self.fetcher.fetch(req) {
            Ok(resp) => {
                // Network wins over cache whenever it is reachable.
                if resp.status == 200 {
                    self.store.put(&self.generation, &req.url, &req.method, &resp)?;
                }
                Ok(resp)
            }
            Err(e) => {
                warn!(url = %req.url, error = %e, "network fetch failed, trying cache");
                if let Some(cached) = self.store.lookup(&self.generation, &req.url, &req.method)? {
                    return Ok(cached);
                }
                if req.navigate {
                    if let Some(base) = self.shell_base_url.as_deref() {
                        let offline = join_url(base, &self.offline_url);
                        if let Some(mut page) =
                            self.store.lookup(&self.generation, &offline, "GET")?
                        {
                            page.served_from = ServedFrom::OfflineFallback;
                            return Ok(page);
                        }
                    }
                }
                Ok(offline_response())
            }
        }
    }
}

fn offline_response() -> FetchResponse {
    FetchResponse {
        status: 503,
        content_type: Some("text/plain".to_string()),
        body: b"Offline - Resource not available".to_vec(),
        served_from: ServedFrom::Synthesized,
    }
}

fn join_url(base: &str, file: &str) -> String {
    let base = base.trim_end_matches('/');
    match file {
        "" | "." | "./" => format!("{base}/"),
        f => format!("{base}/{}", f.trim_start_matches("./")),
    }
}

fn origin_of(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let rest = &url[scheme_end + 3..];
    match rest.find('/') {
        Some(i) => url[..scheme_end + 3 + i].to_string(),
        None => url.to_string(),
    }
}
