//! Transport to the donation backend
//!
//! [`Backend`] is the only I/O boundary of the core. [`HttpBackend`] talks to
//! the real REST API; tests substitute an in-memory implementation.

use crate::config::ClientConfig;
use crate::error::{Error, Result, TransportError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET {base}{path}?{query}` and return the JSON body.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> TransportResult<Value>;

    /// `PATCH {base}{path}` with a JSON body. An empty reply yields `Null`.
    async fn patch_json(&self, path: &str, body: &Value, token: &str) -> TransportResult<Value>;
}

/// Path prefix served by the profile service.
const PROFILE_PREFIX: &str = "/usuarios";

pub struct HttpBackend {
    client: Client,
    api_base: String,
    profile_base: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base().to_string(),
            profile_base: config.profile_base().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        let base = if path.starts_with(PROFILE_PREFIX) {
            &self.profile_base
        } else {
            &self.api_base
        };
        format!("{base}{path}")
    }

    async fn send(&self, request: RequestBuilder, method: &str, url: &str) -> TransportResult<Value> {
        tracing::debug!(method, url, "Sending backend request");
        let response = request.send().await.map_err(map_reqwest_error)?;
        read_body(response).await
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> TransportResult<Value> {
        let url = self.url(path);
        let request = self.client.get(&url).query(query).bearer_auth(token);
        self.send(request, "GET", &url).await
    }

    async fn patch_json(&self, path: &str, body: &Value, token: &str) -> TransportResult<Value> {
        let url = self.url(path);
        let request = self.client.patch(&url).json(body).bearer_auth(token);
        self.send(request, "PATCH", &url).await
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        tracing::debug!(error = %e, "Backend request got no response");
        TransportError::NoResponse
    }
}

async fn read_body(response: Response) -> TransportResult<Value> {
    let status = response.status();
    let text = response.text().await.map_err(map_reqwest_error)?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => Value::Null,
            Err(e) => return Err(TransportError::Decode(e.to_string())),
        }
    };

    if status.is_success() {
        Ok(body)
    } else {
        let err = TransportError::from_body(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %err, "Backend returned an error");
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_paths_use_profile_base() {
        let config = ClientConfig {
            api_base_url: "http://api.local/".into(),
            profile_base_url: Some("http://users.local".into()),
            ..Default::default()
        };
        let backend = HttpBackend::new(&config).unwrap();

        assert_eq!(backend.url("/usuarios/7"), "http://users.local/usuarios/7");
        assert_eq!(
            backend.url("/solicitacoes/pedidos"),
            "http://api.local/solicitacoes/pedidos"
        );
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ClientConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(HttpBackend::new(&config), Err(Error::Config(_))));
    }
}
