use std::time::Duration;

use reqwest::blocking;

/// Desktop Chrome user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.101 Safari/537.36";

/// Client for resolver requests (watch pages, innertube, player scripts).
pub fn resolver_client(user_agent: &str) -> reqwest::Result<blocking::Client> {
    blocking::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(15))
        .build()
}

/// Client for the range-caching byte source.
///
/// Redirects are off so the source can follow them explicitly, and there is
/// no overall timeout: the response body is drained incrementally over the
/// lifetime of the stream.
pub fn range_client(user_agent: &str) -> reqwest::Result<blocking::Client> {
    blocking::Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(10))
        .timeout(None)
        .build()
}
