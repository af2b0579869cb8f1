//! Common utilities for the NCloud API client
//!
//! Provides request signing, endpoint selection, and response unwrapping
//! shared by every API family.

pub mod query;

use crate::error::NcloudError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use std::fmt;
use tracing::debug;

pub use query::QueryParams;

type HmacSha256 = Hmac<Sha256>;

/// NCloud site (each site has its own API gateway hosts)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Site {
    #[default]
    Public,
    Gov,
    Fin,
}

impl Site {
    /// Parse a site name as used in configuration (`public`, `gov`, `fin`)
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "public" | "" => Some(Site::Public),
            "gov" => Some(Site::Gov),
            "fin" => Some(Site::Fin),
            _ => None,
        }
    }
}

/// Base URLs of the API gateways the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// RPC-style server/VPC API gateway
    pub api_url: String,
    /// Kubernetes service (NKS) REST gateway
    pub nks_url: String,
}

impl Endpoints {
    /// Default gateways for a site
    pub fn for_site(site: Site) -> Self {
        let (api_url, nks_url) = match site {
            Site::Public => (
                "https://ncloud.apigw.ntruss.com",
                "https://nks.apigw.ntruss.com",
            ),
            Site::Gov => (
                "https://ncloud.apigw.gov-ntruss.com",
                "https://nks.apigw.gov-ntruss.com",
            ),
            Site::Fin => (
                "https://fin-ncloud.apigw.fin-ntruss.com",
                "https://fin-nks.apigw.fin-ntruss.com",
            ),
        };
        Self::new(api_url, nks_url)
    }

    /// Explicit gateways (trailing slashes are trimmed)
    pub fn new(api_url: impl Into<String>, nks_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            nks_url: nks_url.into().trim_end_matches('/').to_string(),
        }
    }
}

/// API key pair used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Compute the API gateway signature v2 for one request.
///
/// The signed message is `"{METHOD} {uri}\n{timestamp}\n{access_key}"`, where
/// `uri` is the path plus query string exactly as sent.
pub fn make_signature(
    method: &str,
    uri: &str,
    timestamp: &str,
    access_key: &str,
    secret_key: &str,
) -> Result<String, NcloudError> {
    let message = format!("{} {}\n{}\n{}", method, uri, timestamp, access_key);
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| NcloudError::Authentication(format!("invalid secret key: {}", e)))?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// HTTP client wrapper with request signing
pub struct HttpClient {
    client: Client,
    endpoints: Endpoints,
    credentials: Credentials,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("endpoints", &self.endpoints)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, endpoints: Endpoints, credentials: Credentials) -> Self {
        Self {
            client,
            endpoints,
            credentials,
        }
    }

    /// Get the configured gateways
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn signed(
        &self,
        method: Method,
        base_url: &str,
        path_and_query: &str,
    ) -> Result<RequestBuilder, NcloudError> {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        let signature = make_signature(
            method.as_str(),
            path_and_query,
            &timestamp,
            &self.credentials.access_key,
            &self.credentials.secret_key,
        )?;

        Ok(self
            .client
            .request(method, format!("{}{}", base_url, path_and_query))
            .header("x-ncp-apigw-timestamp", timestamp)
            .header("x-ncp-iam-access-key", self.credentials.access_key.as_str())
            .header("x-ncp-apigw-signature-v2", signature)
            .header("Accept", "application/json"))
    }

    /// Call an RPC-style action (`GET /{service}/v2/{action}?...`) and unwrap
    /// its `{action}Response` envelope.
    pub async fn call_action<T: DeserializeOwned>(
        &self,
        service: &str,
        action: &str,
        params: &QueryParams,
    ) -> Result<T, NcloudError> {
        let mut params = params.clone();
        params.push("responseFormatType", "json");
        let path = format!("/{}/v2/{}?{}", service, action, params.to_query_string());
        debug!("GET {}{}", self.endpoints.api_url, path);

        let response = self
            .signed(Method::GET, &self.endpoints.api_url, &path)?
            .send()
            .await
            .map_err(NcloudError::Http)?;

        let status = response.status();
        let body = response.text().await.map_err(NcloudError::Http)?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &body, action));
        }

        unwrap_action_response(action, &body)
    }

    /// Call a REST endpoint of the NKS gateway and decode the JSON body
    pub async fn rest_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, NcloudError> {
        let text = self.rest_send(method, path, body).await?;
        decode_body(&text)
    }

    /// Call a REST endpoint of the NKS gateway, ignoring the response body
    pub async fn rest_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<(), NcloudError> {
        self.rest_send(method, path, body).await.map(|_| ())
    }

    async fn rest_send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String, NcloudError> {
        debug!("{} {}{}", method, self.endpoints.nks_url, path);

        let mut request = self.signed(method, &self.endpoints.nks_url, path)?;
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .json(body);
        }

        let response = request.send().await.map_err(NcloudError::Http)?;
        let status = response.status();
        let text = response.text().await.map_err(NcloudError::Http)?;
        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &text, path));
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    response_error: Option<ErrorDetail>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(alias = "errorCode")]
    return_code: Option<serde_json::Value>,
    #[serde(alias = "message")]
    return_message: Option<String>,
}

fn value_to_code(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(500).collect()
}

/// Decode a JSON response body; the first 500 chars are logged on failure
pub(crate) fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, NcloudError> {
    serde_json::from_str(text).map_err(|e| {
        debug!("error decoding response body: {} - Response (first 500 chars): {}", e, truncate(text));
        NcloudError::Serialization(e)
    })
}

/// Map a non-2xx response to an error, keeping the vendor return code
pub(crate) fn error_from_response(status: u16, body: &str, operation: &str) -> NcloudError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.response_error.or(envelope.error));

    let (code, message) = match detail {
        Some(detail) => (
            detail
                .return_code
                .as_ref()
                .map(value_to_code)
                .unwrap_or_else(|| status.to_string()),
            detail.return_message.unwrap_or_default(),
        ),
        None => (status.to_string(), truncate(body)),
    };

    match status {
        401 | 403 => NcloudError::Authentication(format!("{}: [{}] {}", operation, code, message)),
        404 => NcloudError::NotFound(format!("{}: [{}] {}", operation, code, message)),
        _ => NcloudError::Api {
            status,
            code,
            message: format!("{}: {}", operation, message),
        },
    }
}

/// Unwrap `{"{action}Response": {...}}`, rejecting non-zero return codes
pub(crate) fn unwrap_action_response<T: DeserializeOwned>(
    action: &str,
    body: &str,
) -> Result<T, NcloudError> {
    let envelope: serde_json::Value = serde_json::from_str(body)?;
    let key = format!("{}Response", action);

    let inner = envelope.get(&key).cloned().ok_or_else(|| NcloudError::Api {
        status: 200,
        code: "unexpected-response".to_string(),
        message: format!("missing `{}` in response: {}", key, truncate(body)),
    })?;

    let code = inner
        .get("returnCode")
        .map(value_to_code)
        .unwrap_or_else(|| "0".to_string());
    if code != "0" {
        let message = inner
            .get("returnMessage")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(NcloudError::Api {
            status: 200,
            code,
            message: format!("{}: {}", action, message),
        });
    }

    serde_json::from_value(inner).map_err(NcloudError::Serialization)
}
