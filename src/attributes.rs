//! Attribute store client.
//!
//! Reads and writes single string-valued attributes on a user identity
//! record — most importantly the comma-joined followed-clubs roster. The
//! contract is deliberately soft: attribute sync is best-effort, not
//! transactional. A read miss surfaces as [`Error::AttributeNotFound`] and
//! is treated as "empty" by callers; a write failure is logged and collapsed
//! to `false`, never propagated.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::CoreConfig;
use crate::error::{Error, Result};
use crate::retry::retry_read;

/// Remote store of per-identity string attributes.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Fetch one named attribute for one identity.
    ///
    /// Returns [`Error::AttributeNotFound`] when the identity has no such
    /// attribute. Callers map that to "empty", not to a user-visible error.
    async fn get_attribute(&self, subject: &str, name: &str) -> Result<String>;

    /// Idempotent overwrite of one attribute with a new string value.
    ///
    /// Returns `false` (and logs) on any remote failure instead of
    /// propagating; the caller decides whether to retry or only log.
    async fn set_attribute(&self, subject: &str, name: &str, value: &str) -> bool;
}

/// HTTP implementation against the identity endpoints of the clubs backend.
pub struct HttpAttributeStore {
    client: Client,
    base_url: String,
    read_retries: u32,
}

impl HttpAttributeStore {
    /// Create a client from the core configuration.
    pub fn new(config: &CoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Network(format!("build http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base().to_string(),
            read_retries: config.read_retries,
        })
    }

    fn attribute_url(&self, subject: &str) -> String {
        format!(
            "{}/identity/{}/attribute",
            self.base_url,
            urlencoding::encode(subject)
        )
    }

    async fn fetch_attribute(&self, subject: &str, name: &str) -> Result<String> {
        let url = format!(
            "{}?name={}",
            self.attribute_url(subject),
            urlencoding::encode(name)
        );

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(Error::AttributeNotFound(name.to_string())),
            status if status.is_success() => {
                let body: Value = response.json().await?;
                // Response shape is { "<name>": "<value>" }
                match body.get(name).and_then(Value::as_str) {
                    Some(value) => Ok(value.to_string()),
                    None => Err(Error::AttributeNotFound(name.to_string())),
                }
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::InvalidResponse(format!(
                    "attribute fetch failed: {} - {}",
                    status, body
                )))
            }
        }
    }
}

#[async_trait]
impl AttributeStore for HttpAttributeStore {
    async fn get_attribute(&self, subject: &str, name: &str) -> Result<String> {
        retry_read(self.read_retries, "attribute fetch", || {
            self.fetch_attribute(subject, name)
        })
        .await
    }

    async fn set_attribute(&self, subject: &str, name: &str, value: &str) -> bool {
        let url = self.attribute_url(subject);
        let body = serde_json::json!({
            "attributeName": name,
            "value": value,
        });

        match self.client.post(&url).json(&body).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(
                    subject,
                    attribute = name,
                    "Attribute write failed: {} - {}",
                    status,
                    body
                );
                false
            }
            Err(e) => {
                tracing::error!(subject, attribute = name, "Attribute write failed: {}", e);
                false
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_url_encodes_subject() {
        let store = HttpAttributeStore::new(&CoreConfig::default()).unwrap();
        assert_eq!(
            store.attribute_url("us-east-1:ab cd"),
            "http://localhost:3000/identity/us-east-1%3Aab%20cd/attribute"
        );
    }
}
