use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub method: String,
    /// True for page navigations; drives the offline fallback page.
    pub navigate: bool,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        FetchRequest {
            url: url.into(),
            method: "GET".to_string(),
            navigate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Network,
    Cache,
    OfflineFallback,
    Synthesized,
}

impl ServedFrom {
    pub fn as_str(self) -> &'static str {
        match self {
            ServedFrom::Network => "network",
            ServedFrom::Cache => "cache",
            ServedFrom::OfflineFallback => "offlineFallback",
            ServedFrom::Synthesized => "synthesized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub served_from: ServedFrom,
}

/// Network access behind a seam so the worker's policy is testable without a
/// live network. HTTP error statuses are Ok responses; only transport
/// failures are Err.
pub trait Fetcher {
    fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

pub struct HttpFetcher {
    http: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        HttpFetcher {
            http: reqwest::blocking::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetcher with no network at all, for tests that never expect a hit.
#[cfg(test)]
pub(crate) struct NullFetcher;

#[cfg(test)]
impl Fetcher for NullFetcher {
    fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        anyhow::bail!("no network in tests: {}", req.url)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let method = reqwest::Method::from_bytes(req.method.as_bytes())
            .with_context(|| format!("bad method: {}", req.method))?;
        let resp = self
            .http
            .request(method, &req.url)
            .send()
            .with_context(|| format!("fetch failed: {}", req.url))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.bytes().context("read response body")?.to_vec();
        Ok(FetchResponse {
            status,
            content_type,
            body,
            served_from: ServedFrom::Network,
        })
    }
}
