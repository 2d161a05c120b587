use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;

static VARSYNC_USER_AGENT: &str = concat!("varsync/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by the token exchange and every API call.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(VARSYNC_USER_AGENT));

    reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .context("Failed to build HTTP client")
}

/// Parses a base URL, making sure it ends with a slash so that relative
/// paths join below it instead of replacing its last segment.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let mut base_endpoint = endpoint.trim().to_string();
    if !base_endpoint.ends_with('/') {
        base_endpoint.push('/');
    }
    Url::parse(&base_endpoint).with_context(|| format!("Invalid URL: {endpoint}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://dev123.service-now.com", "https://dev123.service-now.com/")]
    #[case("https://dev123.service-now.com/", "https://dev123.service-now.com/")]
    #[case("  https://host/sub ", "https://host/sub/")]
    fn test_parse_endpoint(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(parse_endpoint(input).unwrap().as_str(), expected);
    }

    #[test]
    fn test_parse_endpoint_rejects_garbage() {
        assert!(parse_endpoint("not a url").is_err());
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }
}
