//! Generic HTTP webhook notifier.
//!
//! Delivers notifications as JSON payloads to a configured URL with
//! optional custom headers.

use std::collections::HashMap;

use crate::traits::{Notification, Notifier, NotifyError};

/// Delivers notifications as JSON over HTTP to a configured endpoint.
///
/// Environment variable references (`${VAR_NAME}`) in the URL and header
/// values are resolved at construction time.
#[derive(Debug)]
pub struct WebhookNotifier {
    url: String,
    method: reqwest::Method,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// `method` defaults to `POST` when `None`. Missing env vars produce
    /// a [`NotifyError::Config`] error.
    pub fn new(
        url: String,
        method: Option<reqwest::Method>,
        headers: HashMap<String, String>,
    ) -> Result<Self, NotifyError> {
        let resolved_url = resolve_env_vars(&url)?;

        let mut resolved_headers = HashMap::with_capacity(headers.len());
        for (key, value) in &headers {
            resolved_headers.insert(key.clone(), resolve_env_vars(value)?);
        }

        Ok(Self {
            url: resolved_url,
            method: method.unwrap_or(reqwest::Method::POST),
            headers: resolved_headers,
            client: reqwest::Client::new(),
        })
    }

    /// Construct from config-level primitives; `method` is parsed from a
    /// string such as `"POST"` or `"put"`.
    pub fn from_config(
        url: String,
        method: Option<String>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<Self, NotifyError> {
        let parsed_method = match method {
            Some(m) => m
                .to_uppercase()
                .parse::<reqwest::Method>()
                .map(Some)
                .map_err(|_| NotifyError::Config(format!("invalid HTTP method: {m}")))?,
            None => None,
        };

        Self::new(url, parsed_method, headers.unwrap_or_default())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = serde_json::to_string(notification).map_err(|e| {
            NotifyError::Config(format!("failed to serialize notification: {e}"))
        })?;

        let mut request = self
            .client
            .request(self.method.clone(), &self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);

        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(60);
            return Err(NotifyError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                url = %self.url,
                %status,
                body = %body_text,
                "webhook returned non-2xx status"
            );
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body_text,
            });
        }

        tracing::debug!(
            url = %self.url,
            method = %self.method,
            status = %status,
            "webhook notification delivered"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}

/// Resolve `${VAR_NAME}` patterns in a string using `std::env::var`.
fn resolve_env_vars(input: &str) -> Result<String, NotifyError> {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if !closed {
                return Err(NotifyError::Config(format!(
                    "unclosed env var reference in: {input}"
                )));
            }
            let value = std::env::var(&var_name)
                .map_err(|_| NotifyError::Config(format!("env var not found: {var_name}")))?;
            result.push_str(&value);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_substitutes() {
        std::env::set_var("CHARTEROPS_WT_HOST", "ops.example.com");
        let result = resolve_env_vars("https://${CHARTEROPS_WT_HOST}/alerts").unwrap();
        assert_eq!(result, "https://ops.example.com/alerts");
        std::env::remove_var("CHARTEROPS_WT_HOST");
    }

    #[test]
    fn resolve_env_vars_missing() {
        let result = resolve_env_vars("https://${CHARTEROPS_SURELY_UNSET_9876}/hook");
        match result.unwrap_err() {
            NotifyError::Config(msg) => assert!(msg.contains("CHARTEROPS_SURELY_UNSET_9876")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_env_vars_unclosed() {
        match resolve_env_vars("https://${UNCLOSED/hook").unwrap_err() {
            NotifyError::Config(msg) => assert!(msg.contains("unclosed")),
            other => panic!("expected Config error, got: {other:?}"),
        }
    }

    #[test]
    fn resolve_env_vars_plain() {
        let result = resolve_env_vars("https://plain.example.com/hook").unwrap();
        assert_eq!(result, "https://plain.example.com/hook");
    }

    #[test]
    fn from_config_methods() {
        let post = WebhookNotifier::from_config("https://example.com".into(), None, None).unwrap();
        assert_eq!(post.method, reqwest::Method::POST);

        let put =
            WebhookNotifier::from_config("https://example.com".into(), Some("put".into()), None)
                .unwrap();
        assert_eq!(put.method, reqwest::Method::PUT);

        let bad = WebhookNotifier::from_config(
            "https://example.com".into(),
            Some("NOT_A_METHOD\0".into()),
            None,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn from_config_resolves_headers() {
        std::env::set_var("CHARTEROPS_WT_TOKEN", "secret-123");
        let headers = HashMap::from([
            ("Authorization".to_string(), "Bearer ${CHARTEROPS_WT_TOKEN}".to_string()),
            ("X-Source".to_string(), "charterops".to_string()),
        ]);
        let notifier =
            WebhookNotifier::from_config("https://example.com".into(), None, Some(headers))
                .unwrap();
        assert_eq!(notifier.headers["Authorization"], "Bearer secret-123");
        assert_eq!(notifier.headers["X-Source"], "charterops");
        assert_eq!(notifier.channel_name(), "webhook");
        std::env::remove_var("CHARTEROPS_WT_TOKEN");
    }
}
