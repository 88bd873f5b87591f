//! TranslationClient - machine translation over the public translate endpoint.

use std::time::Duration;

use serde_json::Value;

use super::{build_http_client, check_status, with_retry, ProviderError, RetryPolicy};
use crate::config::Config;

/// Client for the machine-translation service.
pub struct TranslationClient {
    base_url: String,
    http_client: reqwest::Client,
    retry: RetryPolicy,
}

impl TranslationClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        Self::with_base_url(
            config.endpoints.translation.clone(),
            config.network.timeout(),
            RetryPolicy::from(&config.network),
        )
    }

    /// Build a client against a custom base URL. Useful for testing against a mock server.
    pub fn with_base_url(
        base_url: String,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: build_http_client(timeout)?,
            retry,
        })
    }

    /// Translate `text` from `source_code` into `target_code`.
    pub async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyText);
        }

        let url = format!("{}/translate_a/single", self.base_url);
        let url = url.as_str();
        let query = [
            ("client", "gtx"),
            ("sl", source_code),
            ("tl", target_code),
            ("dt", "t"),
            ("q", text),
        ];
        let query = &query;

        let body: Value = with_retry(&self.retry, "Translation", || async move {
            let response = self.http_client.get(url).query(query).send().await?;
            let response = check_status(response, "Translation").await?;
            response
                .json::<Value>()
                .await
                .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
        })
        .await?;

        parse_translation(&body)
    }
}

/// Extract the translated text from a translate response.
///
/// The response is a nested array; its first element lists segments, and the
/// first element of each segment is the translated piece.
pub(crate) fn parse_translation(body: &Value) -> Result<String, ProviderError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::MalformedResponse("missing translation segments".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(ProviderError::MalformedResponse(
            "translation was empty".to_string(),
        ));
    }

    Ok(translated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_single_segment() {
        let body = json!([[["రైతు పొలంలో పని చేస్తున్నాడు", "A farmer working in the field", null, null, 10]], null, "en"]);
        assert_eq!(
            parse_translation(&body).unwrap(),
            "రైతు పొలంలో పని చేస్తున్నాడు"
        );
    }

    #[test]
    fn test_parse_joins_segments() {
        let body = json!([[["Hola. ", "Hello. "], ["Adiós.", "Goodbye."]], null, "en"]);
        assert_eq!(parse_translation(&body).unwrap(), "Hola. Adiós.");
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        assert!(matches!(
            parse_translation(&json!({"error": "quota"})),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_translation(&json!([null])),
            Err(ProviderError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_translation() {
        assert!(parse_translation(&json!([[["", "x"]]])).is_err());
    }
}
