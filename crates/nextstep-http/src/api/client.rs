//! HTTP client for the NextStep API.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace, warn};

use nextstep_core::error::{NetworkError, ServiceFailure};
use nextstep_core::{ApiEnvelope, ApiUrl, Error, Result};

use crate::config::ClientConfig;
use crate::interceptor::Interceptor;

/// Sends requests through the [`Interceptor`] and unwraps the response
/// envelope.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: ApiUrl,
    interceptor: Interceptor,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, interceptor: Interceptor) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(network_error)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            interceptor,
        })
    }

    pub fn base_url(&self) -> &ApiUrl {
        &self.base_url
    }

    /// `GET` an endpoint.
    pub async fn get<R>(&self, path: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        self.send::<(), R>(Method::GET, path, None).await
    }

    /// `POST` a JSON body to an endpoint.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send(Method::POST, path, Some(body)).await
    }

    #[instrument(skip(self, body), fields(base = %self.base_url))]
    async fn send<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = self.base_url.endpoint(path);
        debug!(%method, path, "API request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let (request, generation) = self.interceptor.outbound(request);

        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        trace!(%status, "API response");

        // Runs before the caller sees the outcome.
        self.interceptor.inbound(status, generation);

        let bytes = response.bytes().await.map_err(network_error)?;
        unwrap_envelope(status, &bytes)
    }
}

/// Decode a response body into the envelope payload.
///
/// Bodies that are not an envelope still produce a classified failure
/// carrying only the status.
fn unwrap_envelope<R: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<R> {
    let code = status.as_u16();
    let envelope = match serde_json::from_slice::<ApiEnvelope<Value>>(body) {
        Ok(envelope) => envelope,
        Err(e) if status.is_success() => {
            warn!(error = %e, "Response body is not an envelope");
            return Err(Error::Service(ServiceFailure::new(
                code,
                None,
                Some(format!("malformed response: {e}")),
            )));
        }
        Err(_) => return Err(ServiceFailure::new(code, None, None).classify(false)),
    };

    let data = envelope.into_result(code)?;
    serde_json::from_value(data).map_err(|e| {
        Error::Service(ServiceFailure::new(
            code,
            None,
            Some(format!("unexpected response data: {e}")),
        ))
    })
}

fn network_error(err: reqwest::Error) -> Error {
    let network = if err.is_timeout() {
        NetworkError::Timeout
    } else if err.is_connect() {
        NetworkError::Connection {
            message: err.to_string(),
        }
    } else {
        NetworkError::Http {
            message: err.to_string(),
        }
    };
    Error::Network(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn unwraps_successful_envelope() {
        let out: u32 = unwrap_envelope(
            StatusCode::OK,
            &body(json!({ "success": true, "message": "ok", "data": 3 })),
        )
        .unwrap();
        assert_eq!(out, 3);
    }

    #[test]
    fn non_envelope_error_body_keeps_status() {
        let err = unwrap_envelope::<u32>(StatusCode::UNAUTHORIZED, b"<html>nope</html>").unwrap_err();
        assert!(err.is_auth_rejected());
        assert_eq!(err.service_failure().unwrap().status, 401);
    }

    #[test]
    fn malformed_success_body_is_service_error() {
        let err = unwrap_envelope::<u32>(StatusCode::OK, b"not json").unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[test]
    fn failure_envelope_with_structured_data_still_classifies() {
        let err = unwrap_envelope::<u32>(
            StatusCode::BAD_REQUEST,
            &body(json!({
                "success": false,
                "message": "Validation failed",
                "data": { "email": "must be a well-formed email address" },
                "errorCode": "VALIDATION_ERROR"
            })),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.error_code(), Some("VALIDATION_ERROR"));
    }

    #[test]
    fn payload_of_wrong_shape_is_service_error() {
        let err = unwrap_envelope::<u32>(
            StatusCode::OK,
            &body(json!({ "success": true, "data": "three" })),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Service(_)));
    }

    #[test]
    fn client_creation() {
        use nextstep_core::{MemoryCredentialStore, SessionState, TransportEvents};
        use std::sync::Arc;

        let config = ClientConfig::new(ApiUrl::new("http://localhost:8080/api").unwrap());
        let state = SessionState::anonymous(Arc::new(MemoryCredentialStore::new()));
        let client =
            ApiClient::new(&config, Interceptor::new(state, TransportEvents::new())).unwrap();
        assert_eq!(client.base_url(), &config.base_url);
    }
}
