//! Shared HTTP client wrapper
//!
//! Thin wrapper around `reqwest::blocking::Client` that centralizes
//! USER_AGENT, timeout, and RapidAPI header configuration.

use crate::config::network::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, USER_AGENT};
use crate::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Shared HTTP client with standard configuration
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Create a client that sends the RapidAPI credential headers with
    /// every request
    pub fn new(api_key: &str, api_host: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-rapidapi-key",
            HeaderValue::from_str(api_key)
                .map_err(|_| AppError::Config("API key contains invalid characters".to_string()))?,
        );
        headers.insert(
            "x-rapidapi-host",
            HeaderValue::from_str(api_host)
                .map_err(|_| AppError::Config("API host contains invalid characters".to_string()))?,
        );

        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()?;
        Ok(Self { inner })
    }

    /// GET a URL and deserialize the JSON response.
    /// Non-success statuses are errors.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.inner.get(url).send()?.error_for_status()?;
        let data = resp.json::<T>()?;
        Ok(data)
    }

    /// GET a URL and deserialize the JSON response, mapping 404 to `None`
    pub fn get_json_opt<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let resp = self.inner.get(url).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let data = resp.error_for_status()?.json::<T>()?;
        Ok(Some(data))
    }

    /// Access the underlying reqwest client
    pub fn inner(&self) -> &reqwest::blocking::Client {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new("test-key", "exercisedb.p.rapidapi.com");
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_invalid_key() {
        let client = HttpClient::new("bad\nkey", "exercisedb.p.rapidapi.com");
        assert!(client.is_err());
    }

    #[test]
    fn test_client_inner_access() {
        let client = HttpClient::new("test-key", "host").unwrap();
        let _inner = client.inner();
    }

    #[test]
    fn test_get_json_invalid_url() {
        let client = HttpClient::new("test-key", "host").unwrap();
        let result: Result<serde_json::Value> = client.get_json("http://invalid.invalid.invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_get_json_opt_invalid_url() {
        let client = HttpClient::new("test-key", "host").unwrap();
        let result: Result<Option<serde_json::Value>> =
            client.get_json_opt("http://invalid.invalid.invalid");
        assert!(result.is_err());
    }
}
