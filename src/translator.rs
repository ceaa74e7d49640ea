use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Request body for the translation endpoint.
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Client for the machine translation API used by the fan-out.
///
/// Speaks the LibreTranslate-style JSON contract: POST `{q, source, target}`
/// and read back `{translatedText}`.
#[derive(Clone)]
pub struct Translator {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl Translator {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Translate `text` from `source_code` to `target_code`.
    ///
    /// Same-language requests short-circuit without a network call.
    /// Retries 429/5xx and network errors with backoff; other 4xx fail
    /// immediately. The caller decides how to handle a failure (the
    /// orchestrator records it per language/field pair).
    pub async fn translate(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> Result<String> {
        if source_code == target_code {
            return Ok(text.to_string());
        }

        let request = TranslateRequest {
            q: text,
            source: source_code,
            target: target_code,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        with_retry_if(
            &RetryConfig::translate_api(),
            &format!("Translation {} -> {}", source_code, target_code),
            || async {
                let response = self
                    .client
                    .post(&self.api_url)
                    .json(&request)
                    .send()
                    .await
                    .context("Failed to send request to translation API")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("Translation API error ({}): {}", status, body);
                }

                let parsed: TranslateResponse = response
                    .json()
                    .await
                    .context("Failed to parse translation API response")?;

                Ok(parsed.translated_text)
            },
            is_retryable_error,
        )
        .await
    }
}

/// Retry 429 (rate limit), 5xx and network errors; never other 4xx.
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string();

    // Error format: "Translation API error (400 Bad Request): ..."
    if error_str.contains("Translation API error") {
        if let Some(start) = error_str.find('(') {
            if let Some(end) = error_str[start..].find(')') {
                let status_str = &error_str[start + 1..start + end];
                let status_num = status_str.split_whitespace().next().unwrap_or("");
                if let Ok(status) = status_num.parse::<u16>() {
                    return status == 429 || status >= 500;
                }
            }
        }
    }

    // Network errors, timeouts and parse failures are treated as transient
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn translate_response(text: &str) -> serde_json::Value {
        serde_json::json!({ "translatedText": text })
    }

    // ==================== Request Structure Tests ====================

    #[test]
    fn test_request_serialization() {
        let request = TranslateRequest {
            q: "Hello",
            source: "en",
            target: "fr",
            format: "text",
            api_key: None,
        };

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(json.contains("\"q\":\"Hello\""));
        assert!(json.contains("\"source\":\"en\""));
        assert!(json.contains("\"target\":\"fr\""));
        // api_key is omitted when not configured
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn test_request_serialization_with_api_key() {
        let request = TranslateRequest {
            q: "Hello",
            source: "en",
            target: "fr",
            format: "text",
            api_key: Some("tk-123"),
        };

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(json.contains("\"api_key\":\"tk-123\""));
    }

    // ==================== Translate Tests ====================

    #[tokio::test]
    async fn test_translate_same_language_skips_api_call() {
        // Invalid URL proves no request is made
        let translator = Translator::new("http://invalid.test/translate".to_string(), None);

        let result = translator
            .translate("Already in English", "en", "en")
            .await
            .expect("Should short-circuit");
        assert_eq!(result, "Already in English");
    }

    #[tokio::test]
    async fn test_translate_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(
                serde_json::json!({"q": "Hello", "source": "en", "target": "fr"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(translate_response("Bonjour")))
            .mount(&mock_server)
            .await;

        let translator = Translator::new(format!("{}/translate", mock_server.uri()), None);

        let result = translator
            .translate("Hello", "en", "fr")
            .await
            .expect("Should succeed");
        assert_eq!(result, "Bonjour");
    }

    #[tokio::test]
    async fn test_translate_retries_on_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(translate_response("Bonjour")))
            .mount(&mock_server)
            .await;

        let translator = Translator::new(format!("{}/translate", mock_server.uri()), None);

        let result = translator.translate("Hello", "en", "fr").await;
        assert!(result.is_ok(), "Should succeed after retries: {:?}", result);
        assert_eq!(result.unwrap(), "Bonjour");
    }

    #[tokio::test]
    async fn test_translate_no_retry_on_400() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .expect(1) // no retries
            .mount(&mock_server)
            .await;

        let translator = Translator::new(format!("{}/translate", mock_server.uri()), None);

        let start = std::time::Instant::now();
        let result = translator.translate("Hello", "en", "fr").await;
        let elapsed = start.elapsed();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("400"));
        assert!(
            elapsed < std::time::Duration::from_secs(1),
            "400 should fail immediately, took {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_translate_exhausts_retries_on_persistent_500() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("still broken"))
            .expect(3) // translate_api preset has 3 attempts
            .mount(&mock_server)
            .await;

        let translator = Translator::new(format!("{}/translate", mock_server.uri()), None);

        let result = translator.translate("Hello", "en", "fr").await;
        assert!(result.is_err(), "Should fail after exhausting retries");
        assert!(result.unwrap_err().to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_translate_malformed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"nope": true})),
            )
            .mount(&mock_server)
            .await;

        let translator = Translator::new(format!("{}/translate", mock_server.uri()), None);

        let result = translator.translate("Hello", "en", "fr").await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("parse translation API response"));
    }

    // ==================== is_retryable_error Tests ====================

    #[test]
    fn test_is_retryable_500() {
        let error = anyhow::anyhow!("Translation API error (500 Internal Server Error): boom");
        assert!(is_retryable_error(&error));
    }

    #[test]
    fn test_is_retryable_429() {
        let error = anyhow::anyhow!("Translation API error (429 Too Many Requests): slow down");
        assert!(is_retryable_error(&error));
    }

    #[test]
    fn test_not_retryable_400() {
        let error = anyhow::anyhow!("Translation API error (400 Bad Request): bad");
        assert!(!is_retryable_error(&error));
    }

    #[test]
    fn test_not_retryable_403() {
        let error = anyhow::anyhow!("Translation API error (403 Forbidden): denied");
        assert!(!is_retryable_error(&error));
    }

    #[test]
    fn test_network_error_is_retryable() {
        let error = anyhow::anyhow!("Failed to send request to translation API: refused");
        assert!(is_retryable_error(&error));
    }
}
