//! Handlers for the guest-facing rollup API.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollhost_da::GioResponse;
use rollhost_model::CompletionStatus;

use crate::rest::{decode_address, decode_hex, ApiError, ApiJson};
use crate::types::{
    FinishRequest, FinishStatus, GioRequest, IndexResponse, InspectResult, PayloadRequest,
    RollupRequest, VoucherRequest,
};
use crate::AppState;

const FINISH_RETRIES: usize = 50;
const FINISH_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// POST /finish. Polls the sequencer for the next input, bounded to
/// roughly five seconds, and 202s when nothing shows up.
pub(crate) async fn finish(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<FinishRequest>,
) -> Result<Response, ApiError> {
    let accept = matches!(request.status, FinishStatus::Accept);
    let mut shutdown = state.shutdown.clone();
    for _ in 0..FINISH_RETRIES {
        if let Some(input) = state.sequencer.finish_and_get_next(accept).await? {
            return Ok(Json(RollupRequest::from(input)).into_response());
        }
        tokio::select! {
            _ = shutdown.changed() => {
                return Err(ApiError::internal(
                    "request cancelled while waiting for the next input",
                ));
            }
            _ = tokio::time::sleep(FINISH_POLL_INTERVAL) => {}
        }
    }
    Ok((StatusCode::ACCEPTED, "no rollup request available").into_response())
}

/// POST /voucher.
pub(crate) async fn voucher(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VoucherRequest>,
) -> Result<Json<IndexResponse>, ApiError> {
    let destination = decode_address(&request.destination)?;
    let payload = decode_hex(&request.payload)?;
    let index = state.model.add_voucher(destination, payload).await?;
    Ok(Json(IndexResponse { index }))
}

/// POST /notice.
pub(crate) async fn notice(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PayloadRequest>,
) -> Result<Json<IndexResponse>, ApiError> {
    let payload = decode_hex(&request.payload)?;
    let index = state.model.add_notice(payload).await?;
    Ok(Json(IndexResponse { index }))
}

/// POST /report.
pub(crate) async fn report(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PayloadRequest>,
) -> Result<Response, ApiError> {
    let payload = decode_hex(&request.payload)?;
    state.model.add_report(payload).await?;
    Ok(StatusCode::OK.into_response())
}

/// POST /exception. Finalizes the in-flight input as `Exception`.
pub(crate) async fn exception(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PayloadRequest>,
) -> Result<Response, ApiError> {
    let payload = decode_hex(&request.payload)?;
    state.model.register_exception(payload).await?;
    Ok(StatusCode::OK.into_response())
}

/// POST /gio.
pub(crate) async fn gio(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GioRequest>,
) -> Result<Json<GioResponse>, ApiError> {
    let response = state
        .gio
        .fetch(request.domain, &request.id, &state.shutdown)
        .await?;
    Ok(Json(response))
}

/// POST /inspect. Enqueues an inspect request and waits for the state
/// machine to pick it up and finish it, with the same bound as
/// `/finish`.
pub(crate) async fn inspect(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PayloadRequest>,
) -> Result<Response, ApiError> {
    let payload = decode_hex(&request.payload)?;
    let index = state.model.add_inspect_input(payload).await;
    let mut shutdown = state.shutdown.clone();
    for _ in 0..FINISH_RETRIES {
        if let Some(inspect) = state.model.get_inspect_input(index).await {
            if inspect.status != CompletionStatus::Unprocessed {
                return Ok(Json(InspectResult::from(inspect)).into_response());
            }
        }
        tokio::select! {
            _ = shutdown.changed() => {
                return Err(ApiError::internal(
                    "request cancelled while waiting for the inspect result",
                ));
            }
            _ = tokio::time::sleep(FINISH_POLL_INTERVAL) => {}
        }
    }
    Ok((StatusCode::ACCEPTED, "inspect request not processed").into_response())
}
