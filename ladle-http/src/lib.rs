//! Blocking page fetcher with safe logging.
//!
//! - One synchronous HTTP GET per call; no retries
//! - Caller-supplied headers, default `User-Agent`, per-request timeout
//! - Network failures and non-2xx statuses are distinct error variants
//! - Redacts sensitive headers and never logs secret values
//! - Optional *raw* request/response logging via `LADLE_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # fn demo() -> Result<(), ladle_http::FetchError> {
//! let fetcher = ladle_http::Fetcher::new()?;
//! let page = fetcher.fetch(
//!     "https://example.com/",
//!     [("User-Agent", "Mozilla/5.0"), ("Accept-Language", "en")],
//! )?;
//! println!("{} bytes, status {}", page.body.len(), page.status);
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), and final errors, plus raw
//! request/response lines (target `http.raw`) when `LADLE_HTTP_RAW=1`.

use ladle_common::text::snippet;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Url};
use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

pub use reqwest::StatusCode;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "LADLE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_sensitive(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(name))
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(url: &Url, headers: &HeaderMap) -> String {
    let mut parts = vec!["curl".to_string()];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    parts.push(format!("'{}'", url.as_str()));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_sensitive(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("<binary>").to_string()
            };
            (key, val)
        })
        .collect()
}

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> String {
    format!("f{}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed))
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    /// Connection, DNS, TLS, timeout, or body-read failure.
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },
    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}: {snippet}")]
    HttpStatus {
        url: String,
        status: StatusCode,
        snippet: String,
    },
}

impl FetchError {
    /// HTTP status for [`FetchError::HttpStatus`], `None` otherwise.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for transport-level failures a caller may choose to retry.
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }
}

// ==============================
// Request options & response
// ==============================

/// Per-request knobs for [`Fetcher::fetch_with`].
///
/// ```
/// use ladle_http::{header_map, FetchOpts};
/// use std::time::Duration;
///
/// let opts = FetchOpts {
///     timeout: Some(Duration::from_secs(3)),
///     headers: Some(header_map([("Accept", "text/html")]).unwrap()),
/// };
/// assert_eq!(opts.headers.unwrap()["accept"], "text/html");
/// ```
#[derive(Clone, Debug, Default)]
pub struct FetchOpts {
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
}

/// Successful response: final URL (after transport redirects), status, body text.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    pub url: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

/// Build a validated [`HeaderMap`] from name/value pairs.
///
/// Later duplicates are appended, not replaced, matching how they would be sent.
pub fn header_map<I, K, V>(pairs: I) -> Result<HeaderMap, FetchError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
        let name = HeaderName::from_bytes(k.as_ref().trim().as_bytes())
            .map_err(|e| FetchError::Build(format!("invalid header name {:?}: {e}", k.as_ref())))?;
        let value = HeaderValue::from_str(v.as_ref().trim()).map_err(|e| {
            FetchError::Build(format!("invalid value for header {}: {e}", name.as_str()))
        })?;
        map.append(name, value);
    }
    Ok(map)
}

// ==============================
// Fetcher
// ==============================

#[derive(Clone, Debug)]
pub struct Fetcher {
    inner: Client,
    pub default_timeout: Duration,
    pub user_agent: String,
}

impl Fetcher {
    /// Construct a fetcher with a 5 s connect timeout and a 15 s request timeout.
    ///
    /// ```no_run
    /// use ladle_http::{Fetcher, FetchError};
    /// use std::time::Duration;
    ///
    /// let fetcher = Fetcher::new()?;
    /// assert_eq!(fetcher.default_timeout, Duration::from_secs(15));
    /// assert!(fetcher.user_agent.starts_with("ladle/"));
    /// # Ok::<(), FetchError>(())
    /// ```
    pub fn new() -> Result<Self, FetchError> {
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            default_timeout: Duration::from_secs(15),
            user_agent: concat!("ladle/", env!("CARGO_PKG_VERSION")).to_string(),
        })
    }

    /// Override the request timeout used when a call does not set its own.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the `User-Agent` sent when the caller's headers don't carry one.
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// GET `url` with the given header pairs.
    pub fn fetch<I, K, V>(&self, url: &str, headers: I) -> Result<FetchedPage, FetchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let opts = FetchOpts {
            headers: Some(header_map(headers)?),
            ..Default::default()
        };
        self.fetch_with(url, opts)
    }

    /// GET `url` with per-request options.
    pub fn fetch_with(&self, url: &str, opts: FetchOpts) -> Result<FetchedPage, FetchError> {
        let url = parse_url(url)?;

        let mut headers = opts.headers.unwrap_or_default();
        if !headers.contains_key(USER_AGENT) {
            let ua = HeaderValue::from_str(&self.user_agent)
                .map_err(|e| FetchError::Build(format!("invalid user agent: {e}")))?;
            headers.insert(USER_AGENT, ua);
        }
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let req_id = next_request_id();
        tracing::debug!(
            req_id=%req_id,
            method=%Method::GET,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            headers=?redact_headers(&headers),
            timeout_ms=timeout.as_millis() as u64,
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&url, &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = Instant::now();
        let resp = self
            .inner
            .get(url.clone())
            .headers(headers)
            .timeout(timeout)
            .send()
            .map_err(|err| network_error(&req_id, &url, &err, "send"))?;

        let status = resp.status();
        let final_url = resp.url().clone();
        let resp_headers = resp.headers().clone();
        let content_type = resp_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            // Body is best effort here; the status decides the error.
            let body = resp.text().unwrap_or_default();
            let snippet = snippet(&body, SNIPPET_MAX);
            tracing::warn!(
                req_id=%req_id,
                %status,
                url=%url,
                duration_ms=t0.elapsed().as_millis() as u64,
                body_snippet=%snippet,
                "http.error"
            );
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status,
                snippet,
            });
        }

        let body = resp
            .text()
            .map_err(|err| network_error(&req_id, &url, &err, "body"))?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=body.len(),
            content_type=?content_type,
            final_url=%final_url,
            "http.response.headers"
        );

        if raw_enabled() {
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?redact_headers(&resp_headers),
                body=%snippet(&body, RAW_MAX_BODY),
                truncated=body.len() > RAW_MAX_BODY
            );
        }

        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snippet(&body, SNIPPET_MAX),
            "http.response.body_snippet"
        );

        Ok(FetchedPage {
            url: final_url,
            status,
            content_type,
            body,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw.trim()).map_err(|e| FetchError::Url(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::Url(format!(
            "{raw}: unsupported scheme {other:?}"
        ))),
    }
}

fn network_error(req_id: &str, url: &Url, err: &reqwest::Error, stage: &str) -> FetchError {
    let message = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };
    tracing::warn!(req_id=%req_id, url=%url, message=%message, stage, "http.network_error");
    FetchError::Network {
        url: url.to_string(),
        message,
    }
}
