//! PhotoSearchClient - random stock photo lookup and download.

use std::time::Duration;

use serde::Deserialize;

use super::{build_http_client, check_status, with_retry, ProviderError, RetryPolicy};
use crate::config::Config;

/// Response from `GET /photos/random`.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomPhoto {
    #[serde(default)]
    pub id: Option<String>,
    pub urls: PhotoUrls,
}

/// Renditions of a photo. Only `regular` is used.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoUrls {
    pub regular: String,
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
}

/// Client for the keyed stock-photo search endpoint.
pub struct PhotoSearchClient {
    access_key: Option<String>,
    base_url: String,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl PhotoSearchClient {
    /// Build a client from configuration.
    ///
    /// A missing access key is not an error here; searches fail with
    /// `ProviderError::MissingApiKey` so the caller can fall back.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        Self::with_base_url(
            config.keys.photo_search.clone(),
            config.endpoints.photo_search.clone(),
            config.network.timeout(),
            RetryPolicy::from(&config.network),
        )
    }

    /// Build a client against a custom base URL. Useful for testing against a mock server.
    pub fn with_base_url(
        access_key: Option<String>,
        base_url: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            access_key: access_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: build_http_client(timeout)?,
            retry,
        })
    }

    pub fn has_access_key(&self) -> bool {
        self.access_key.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Find a random photo matching `query` and return its regular-size URL.
    pub async fn random_photo_url(&self, query: &str) -> Result<String, ProviderError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)?;
        let url = format!("{}/photos/random", self.base_url);
        let url = url.as_str();

        let photo: RandomPhoto = with_retry(&self.retry, "Photo search", || async move {
            let response = self
                .http_client
                .get(url)
                .query(&[("query", query), ("client_id", access_key)])
                .send()
                .await?;
            let response = check_status(response, "Photo search").await?;
            response
                .json::<RandomPhoto>()
                .await
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
        })
        .await?;

        log::debug!(
            "Photo search matched {} -> {}",
            photo.id.as_deref().unwrap_or("<no id>"),
            photo.urls.regular
        );
        Ok(photo.urls.regular)
    }

    /// Download the bytes behind a photo URL.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        with_retry(&self.retry, "Photo download", || async move {
            let response = self.http_client.get(url).send().await?;
            let response = check_status(response, "Photo download").await?;
            let bytes = response.bytes().await?;
            Ok::<_, ProviderError>(bytes.to_vec())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_photo_deserialization() {
        let json = r#"{
            "id": "abc123",
            "urls": {
                "raw": "https://images.example/raw",
                "full": "https://images.example/full",
                "regular": "https://images.example/regular",
                "small": "https://images.example/small"
            },
            "likes": 12
        }"#;
        let photo: RandomPhoto = serde_json::from_str(json).unwrap();
        assert_eq!(photo.id.as_deref(), Some("abc123"));
        assert_eq!(photo.urls.regular, "https://images.example/regular");
    }

    #[test]
    fn test_random_photo_without_regular_fails() {
        let json = r#"{"urls": {"small": "https://images.example/small"}}"#;
        assert!(serde_json::from_str::<RandomPhoto>(json).is_err());
    }

    #[test]
    fn test_empty_access_key_is_treated_as_missing() {
        let client = PhotoSearchClient::with_base_url(
            Some("   ".to_string()),
            "https://api.example/".to_string(),
            Duration::from_secs(1),
            RetryPolicy::none(),
        )
        .unwrap();
        assert!(!client.has_access_key());
        assert_eq!(client.base_url(), "https://api.example");
    }

    #[tokio::test]
    async fn test_search_without_key_fails_fast() {
        let client = PhotoSearchClient::with_base_url(
            None,
            "http://127.0.0.1:9".to_string(),
            Duration::from_secs(1),
            RetryPolicy::none(),
        )
        .unwrap();
        let result = client.random_photo_url("farmer").await;
        assert!(matches!(result, Err(ProviderError::MissingApiKey)));
    }
}
