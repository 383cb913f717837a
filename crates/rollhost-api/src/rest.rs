//! Plain-text error responses and opinionated extractors for the
//! rollup HTTP surface.

use alloy::primitives::Address;
use axum::extract::{FromRequest, Request};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use rollhost_da::GioError;
use rollhost_model::QueryError;
use rollhost_rollup::{ModelError, StateError};
use serde::de::DeserializeOwned;

/// An error response: a status code and a plain-text body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unsupported_media_type(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// For store failures: logs the cause, reports an opaque 500.
    pub fn store(err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "store error while serving request");
        Self::internal("store error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        ApiError::forbidden(err.to_string())
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::WrongState(err) => err.into(),
            ModelError::Store(err) => ApiError::store(err),
        }
    }
}

impl From<GioError> for ApiError {
    fn from(err: GioError) -> Self {
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        ApiError::new(status, err.to_string())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        if err.is_client_error() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::store(err)
        }
    }
}

/// JSON extractor with the error mapping this API promises: a missing
/// or foreign content type is 415, an undecodable body is 400.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("application/json") {
            return Err(ApiError::unsupported_media_type("invalid content type"));
        }
        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        serde_json::from_slice(&bytes)
            .map(ApiJson)
            .map_err(|err| ApiError::bad_request(format!("malformed JSON body: {err}")))
    }
}

/// Decodes a `0x`-prefixed hex string.
pub fn decode_hex(value: &str) -> Result<Vec<u8>, ApiError> {
    let stripped = value
        .strip_prefix("0x")
        .ok_or_else(|| ApiError::bad_request("invalid hex payload"))?;
    hex::decode(stripped).map_err(|_| ApiError::bad_request("invalid hex payload"))
}

/// Decodes a `0x`-prefixed 20-byte address.
pub fn decode_address(value: &str) -> Result<Address, ApiError> {
    let bytes = decode_hex(value)?;
    if bytes.len() != Address::len_bytes() {
        return Err(ApiError::bad_request("invalid address length"));
    }
    Ok(Address::from_slice(&bytes))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
