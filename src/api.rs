use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    config::AppConfig,
    error::ApiError,
    form::FormSubmitter,
    models::FieldErrors,
    validation::NormalizedValues,
};

/// ApiClient
///
/// Contract of the API Client Adapter. Request and response bodies are opaque JSON;
/// only the failure classification is specified.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// POSTs `payload` to `endpoint` with the bearer `token`.
    async fn submit_form(&self, endpoint: &str, payload: &Value, token: &str)
    -> Result<Value, ApiError>;

    /// Authenticated GET for read-only data (no caching).
    async fn fetch_json(&self, path: &str, token: &str) -> Result<Value, ApiError>;
}

/// ApiState
///
/// The shared handle type for the adapter.
pub type ApiState = Arc<dyn ApiClient>;

/// LavlusApi
///
/// reqwest implementation of [`ApiClient`] against the Lavlus backend. The configured
/// timeout bounds every call, so a hung server surfaces as `NetworkFailure`.
#[derive(Clone)]
pub struct LavlusApi {
    client: reqwest::Client,
    base_url: String,
}

/// Error body the backend sends with 400/422 answers.
#[derive(Deserialize)]
struct RejectionBody {
    #[serde(alias = "fieldErrors")]
    errors: FieldErrors,
}

impl LavlusApi {
    /// Builds the HTTP client. Fails if the client cannot be set up with the configured
    /// timeout.
    pub fn new(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self { client, base_url: config.api_base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_response(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;
        classify(status, &body)
    }
}

/// classify
///
/// Maps an HTTP answer onto the adapter contract:
/// - 2xx: parsed JSON body (`null` when empty)
/// - 401/403: `Unauthorized`
/// - 400/422 with a non-empty field map: `ValidationRejected`
/// - anything else: `ServerError`
pub fn classify(status: StatusCode, body: &str) -> Result<Value, ApiError> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(body).map_err(|e| ApiError::ServerError {
            status: status.as_u16(),
            message: format!("malformed response body: {}", e),
        });
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Unauthorized),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            match serde_json::from_str::<RejectionBody>(body) {
                Ok(rejection) if !rejection.errors.is_empty() => {
                    Err(ApiError::ValidationRejected(rejection.errors))
                }
                _ => Err(ApiError::ServerError {
                    status: status.as_u16(),
                    message: body.to_string(),
                }),
            }
        }
        _ => Err(ApiError::ServerError { status: status.as_u16(), message: body.to_string() }),
    }
}

#[async_trait]
impl ApiClient for LavlusApi {
    async fn submit_form(
        &self,
        endpoint: &str,
        payload: &Value,
        token: &str,
    ) -> Result<Value, ApiError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .bearer_auth(token)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint, error = %e, "form submission transport error");
                ApiError::NetworkFailure(e.to_string())
            })?;

        Self::read_response(response).await
    }

    async fn fetch_json(&self, path: &str, token: &str) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::NetworkFailure(e.to_string()))?;

        Self::read_response(response).await
    }
}

/// EndpointSubmitter
///
/// Binds an [`ApiClient`] to one endpoint so it can serve as a form's submit function.
#[derive(Clone)]
pub struct EndpointSubmitter {
    api: ApiState,
    endpoint: String,
}

impl EndpointSubmitter {
    pub fn new(api: ApiState, endpoint: impl Into<String>) -> Self {
        Self { api, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl FormSubmitter for EndpointSubmitter {
    async fn submit(&self, values: &NormalizedValues, token: &str) -> Result<Value, ApiError> {
        self.api.submit_form(&self.endpoint, &values.to_json(), token).await
    }
}

/// TypedSubmitter
///
/// Like [`EndpointSubmitter`], but the normalized values are first converted into the
/// endpoint's payload type `T`, which fixes the wire shape before anything is sent.
pub struct TypedSubmitter<T> {
    api: ApiState,
    endpoint: String,
    payload: PhantomData<fn() -> T>,
}

impl<T> TypedSubmitter<T> {
    pub fn new(api: ApiState, endpoint: impl Into<String>) -> Self {
        Self { api, endpoint: endpoint.into(), payload: PhantomData }
    }
}

#[async_trait]
impl<T> FormSubmitter for TypedSubmitter<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    async fn submit(&self, values: &NormalizedValues, token: &str) -> Result<Value, ApiError> {
        let payload = values
            .deserialize::<T>()
            .and_then(|typed| serde_json::to_value(&typed))
            .map_err(|e| {
                tracing::error!(endpoint = %self.endpoint, error = %e, "values do not fit payload");
                ApiError::InvalidPayload(e.to_string())
            })?;

        self.api.submit_form(&self.endpoint, &payload, token).await
    }
}
