use std::io::Read;

use reqwest::blocking;
use reqwest::header::{CONTENT_LENGTH, LOCATION, RANGE};
use tracing::{debug, warn};

use crate::common::errors::{Error, Result};
use crate::common::http::{range_client, DEFAULT_USER_AGENT};
use crate::source::ByteSource;
use url::Url;

/// If keeping the current response would mean draining more than this many
/// bytes, close it and issue a fresh ranged request instead.
const RESET_IF_AHEAD_BY: u64 = 50_000;

/// Trim the front of the cache once the read offset is this far in.
const TRIM_CACHE_AFTER: u64 = 10_000_000;

/// Redirect follows allowed within one fill cycle.
const MAX_REDIRECTS: u32 = 4;

const CHUNK: usize = 16 * 1024;

/// HTTP byte source with a contiguous forward cache.
///
/// Reads are satisfied from an in-memory cache that grows by draining the
/// body of a single ranged GET. Forward seeks within [`RESET_IF_AHEAD_BY`]
/// drain through the open response; backward seeks and larger jumps abandon
/// it and start a fresh request at the new offset. Single-reader: driven
/// from the decoder's prefetch worker only.
pub struct HttpSource {
    url: Url,
    client: blocking::Client,
    response: Option<blocking::Response>,
    /// Absolute offset of the first cached byte.
    cache_pos: u64,
    cache: Vec<u8>,
    content_length: Option<u64>,
}

impl HttpSource {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_user_agent(url, DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(url: &str, user_agent: &str) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| Error::Http(format!("invalid url: {}", e)))?;
        let client = range_client(user_agent)?;
        Ok(Self {
            url,
            client,
            response: None,
            cache_pos: 0,
            cache: Vec::new(),
            content_length: None,
        })
    }

    /// Issue the ranged GET for the current cache end, following at most
    /// [`MAX_REDIRECTS`] redirects (one per response).
    fn connect(&mut self) -> Result<()> {
        let start = self.cache_pos + self.cache.len() as u64;
        if let Some(total) = self.content_length {
            if start >= total {
                return Err(Error::OutOfRange {
                    pos: start,
                    requested: 1,
                    length: total,
                });
            }
        }

        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .get(self.url.clone())
                .header(RANGE, format!("bytes={}-", start))
                .send()?;

            let status = response.status();
            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| Error::Http("redirect without location header".into()))?;
                self.url = redirect_target(&self.url, location)?;
                debug!("following redirect to {}", self.url);
                continue;
            }
            if !status.is_success() {
                return Err(Error::Http(format!("unexpected status {}", status)));
            }

            if self.content_length.is_none() {
                if let Some(remaining) = response
                    .headers()
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                {
                    self.content_length = Some(start + remaining);
                }
            }

            self.response = Some(response);
            return Ok(());
        }

        Err(Error::Http(format!("too many redirects for {}", self.url)))
    }

    /// Grow the cache until it holds at least `need` bytes.
    fn fill(&mut self, need: usize) -> Result<()> {
        let mut chunk = [0u8; CHUNK];
        let mut stalled = false;

        while self.cache.len() < need {
            let response = match self.response.as_mut() {
                Some(response) => response,
                None => {
                    self.connect()?;
                    continue;
                }
            };

            match response.read(&mut chunk) {
                Ok(0) => {
                    // Body exhausted short of the range end; reconnect once
                    // before giving up.
                    self.response = None;
                    if stalled {
                        let end = self.cache_pos + self.cache.len() as u64;
                        return Err(Error::OutOfRange {
                            pos: self.cache_pos,
                            requested: need as u64,
                            length: end,
                        });
                    }
                    stalled = true;
                }
                Ok(n) => {
                    self.cache.extend_from_slice(&chunk[..n]);
                    stalled = false;
                }
                Err(e) => {
                    self.response = None;
                    return Err(Error::Io(e));
                }
            }
        }
        Ok(())
    }
}

impl ByteSource for HttpSource {
    fn read(&mut self, buf: &mut [u8], pos: &mut u64) -> Result<()> {
        let mut offset = *pos as i64 - self.cache_pos as i64;
        if offset < 0 || offset - self.cache.len() as i64 > RESET_IF_AHEAD_BY as i64 {
            // Backward seek or a large forward jump: a fresh ranged request
            // is cheaper than draining.
            self.response = None;
            self.cache_pos = *pos;
            self.cache.clear();
            offset = 0;
        }

        let offset = offset as u64;
        self.fill((offset + buf.len() as u64) as usize)?;

        let start = offset as usize;
        buf.copy_from_slice(&self.cache[start..start + buf.len()]);

        if offset > TRIM_CACHE_AFTER {
            self.cache.drain(..start);
            self.cache_pos += offset;
        }

        *pos += buf.len() as u64;
        Ok(())
    }

    fn length(&mut self) -> Result<u64> {
        if self.content_length.is_none() {
            self.connect()?;
        }
        self.content_length
            .ok_or_else(|| Error::Http("no content-length in response".into()))
    }
}

/// Resolve a `Location:` header against the current URL.
///
/// `//host/path` keeps the scheme, `/path` keeps the host, absolute URLs
/// replace everything.
fn redirect_target(current: &Url, location: &str) -> Result<Url> {
    let resolved = if let Some(rest) = location.strip_prefix("//") {
        Url::parse(&format!("{}://{}", current.scheme(), rest))
    } else {
        current.join(location)
    };
    resolved.map_err(|e| {
        warn!("failed to parse redirect location {:?}: {}", location, e);
        Error::Http(format!("invalid redirect location: {}", location))
    })
}
