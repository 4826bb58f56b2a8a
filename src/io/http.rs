use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, RANGE};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 10;
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Random access to a remote ZIP over HTTP Range requests.
///
/// Every [`ReadAt::read_at`] call becomes one or more `GET` requests for the
/// exact byte window; the whole body is never downloaded up front.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    /// Open `url` after checking it with a `HEAD` request.
    ///
    /// Fails unless the server advertises `Accept-Ranges: bytes` and a
    /// `Content-Length`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let resp = client.head(&url).send()?;

        if !resp.status().is_success() {
            return Err(remote_failure(format!("HEAD {url}: {}", resp.status())));
        }

        let ranges = header_str(&resp, ACCEPT_RANGES).unwrap_or("none");
        if !ranges.split(',').any(|unit| unit.trim() == "bytes") {
            return Err(remote_failure(format!(
                "{url} does not support byte range requests"
            )));
        }

        let size = header_str(&resp, CONTENT_LENGTH)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| remote_failure(format!("{url} did not report a Content-Length")))?;

        tracing::debug!(%url, size, "remote archive supports range requests");

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Bytes received so far.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// `GET` one range, retrying timeouts and refused connections.
    fn fetch(&self, start: u64, end: u64) -> Result<Response> {
        let range = format!("bytes={start}-{end}");
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.client.get(&self.url).header(RANGE, &range).send() {
                Ok(resp) => return Ok(resp),
                Err(err) if (err.is_timeout() || err.is_connect()) && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        url = %self.url,
                        %range,
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        "range request failed, retrying: {err}"
                    );
                    std::thread::sleep(RETRY_BACKOFF * attempt);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl ReadAt for HttpRangeReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;
        let mut received = 0;

        // Servers may answer with a shorter range than requested.
        while received < wanted {
            let start = offset + received as u64;
            let resp = self.fetch(start, end)?;

            if resp.status() != StatusCode::PARTIAL_CONTENT {
                return Err(remote_failure(format!(
                    "GET {} bytes={start}-{end}: expected 206, got {}",
                    self.url,
                    resp.status()
                )));
            }
            if let Some(served_from) = header_str(&resp, CONTENT_RANGE).and_then(range_start) {
                if served_from != start {
                    return Err(remote_failure(format!(
                        "{} served bytes from {served_from}, asked for {start}",
                        self.url
                    )));
                }
            }

            let body = resp.bytes()?;
            if body.is_empty() {
                return Err(remote_failure(format!(
                    "{} returned an empty body for bytes={start}-{end}",
                    self.url
                )));
            }

            let n = body.len().min(wanted - received);
            buf[received..received + n].copy_from_slice(&body[..n]);
            received += n;
            self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

fn header_str(resp: &Response, name: reqwest::header::HeaderName) -> Option<&str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

/// First byte of a `Content-Range: bytes a-b/n` value.
fn range_start(value: &str) -> Option<u64> {
    let (_, spec) = value.trim().split_once(' ')?;
    let (start, _) = spec.split_once('-')?;
    start.parse().ok()
}

fn remote_failure(message: String) -> Error {
    Error::Io(std::io::Error::other(message))
}
