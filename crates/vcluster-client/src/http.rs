//! HTTP implementation of the store contract.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use vcluster_model::Document;

use crate::error::{ClientError, Result};
use crate::store::InfoStore;

/// Store client speaking the info-service REST surface.
///
/// Category documents live under `/info/{category}`, single entities under
/// `/info/{category}/{name}`, pairing under `/pairing`. Every trait call is
/// one request/response round trip; timeouts and cancellation are the HTTP
/// client's concern and surface as [`ClientError::Connection`].
pub struct HttpInfoStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpInfoStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport(err: reqwest::Error) -> ClientError {
        ClientError::Connection(err.to_string())
    }
}

#[async_trait]
impl InfoStore for HttpInfoStore {
    async fn get_all(&self, category: &str) -> Result<Document> {
        let url = self.url(&format!("/info/{category}"));
        debug!(%url, "GET category");
        let resp = self.client.get(&url).send().await.map_err(Self::transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            // Never-written category.
            return Ok(Document::new());
        }
        let resp = resp.error_for_status().map_err(Self::transport)?;
        let value: Value = resp.json().await.map_err(Self::transport)?;
        match value {
            Value::Object(doc) => Ok(doc),
            Value::Null => Ok(Document::new()),
            other => Err(ClientError::Decode(format!(
                "category '{category}' is not a JSON object: {other}"
            ))),
        }
    }

    async fn replace_all(&self, category: &str, doc: Document) -> Result<()> {
        let url = self.url(&format!("/info/{category}"));
        debug!(%url, entries = doc.len(), "PUT category");
        self.client
            .put(&url)
            .json(&doc)
            .send()
            .await
            .map_err(Self::transport)?
            .error_for_status()
            .map_err(Self::transport)?;
        Ok(())
    }

    async fn get_one(&self, category: &str, name: &str) -> Result<Option<Document>> {
        let url = self.url(&format!("/info/{category}/{name}"));
        debug!(%url, "GET entity");
        let resp = self.client.get(&url).send().await.map_err(Self::transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status().map_err(Self::transport)?;
        let value: Value = resp.json().await.map_err(Self::transport)?;
        match value {
            Value::Object(attrs) => Ok(Some(attrs)),
            Value::Null => Ok(None),
            other => Err(ClientError::Decode(format!(
                "entity '{name}' is not a JSON object: {other}"
            ))),
        }
    }

    async fn delete_one(&self, category: &str, name: &str) -> Result<()> {
        let url = self.url(&format!("/info/{category}/{name}"));
        debug!(%url, "DELETE entity");
        let resp = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(Self::transport)?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::EntityMissing(name.to_string()));
        }
        resp.error_for_status().map_err(Self::transport)?;
        Ok(())
    }

    async fn request_pairing(&self, common_name: &str) -> Result<String> {
        let url = self.url("/pairing");
        debug!(%url, common_name, "POST pairing request");
        let body = serde_json::json!({ "commonname": common_name });
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?
            .error_for_status()
            .map_err(Self::transport)?;
        let value: Value = resp.json().await.map_err(Self::transport)?;
        value
            .get("pairingcode")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ClientError::Decode("pairing response missing 'pairingcode'".into()))
    }

    async fn get_pairing(&self, code: &str) -> Result<(String, String)> {
        let url = self.url(&format!("/pairing/{code}"));
        debug!(%url, "GET pairing");
        let resp = self.client.get(&url).send().await.map_err(Self::transport)?;
        // The service answers 404 until the keypair has been issued; the
        // caller is expected to poll.
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::PairingNotReady(code.to_string()));
        }
        let resp = resp.error_for_status().map_err(Self::transport)?;
        let value: Value = resp.json().await.map_err(Self::transport)?;
        let cert = value.get("cert").and_then(Value::as_str);
        let key = value.get("key").and_then(Value::as_str);
        match (cert, key) {
            (Some(cert), Some(key)) => Ok((cert.to_string(), key.to_string())),
            _ => Err(ClientError::Decode(
                "pairing response missing 'cert'/'key'".into(),
            )),
        }
    }
}
