//! Handlers for the read-only query API over the store.

use axum::extract::{Path, Query, State};
use axum::Json;
use rollhost_model::Filter;

use crate::rest::ApiError;
use crate::types::{InputView, NoticeView, PageResponse, ReportView, VoucherView};
use crate::AppState;

/// Connection-style paging plus an optional JSON-encoded filter list.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct PageQuery {
    first: Option<i64>,
    last: Option<i64>,
    after: Option<String>,
    before: Option<String>,
    filter: Option<String>,
}

impl PageQuery {
    fn filters(&self) -> Result<Vec<Filter>, ApiError> {
        match &self.filter {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|err| ApiError::bad_request(format!("malformed filter: {err}"))),
        }
    }
}

/// GET /inputs.
pub(crate) async fn list_inputs(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<InputView>>, ApiError> {
    let filters = query.filters()?;
    let page = state
        .inputs
        .find_all(
            query.first,
            query.last,
            query.after.as_deref(),
            query.before.as_deref(),
            &filters,
        )
        .await?;
    Ok(Json(page.into()))
}

/// GET /inputs/:index.
pub(crate) async fn get_input(
    State(state): State<AppState>,
    Path(index): Path<u64>,
) -> Result<Json<InputView>, ApiError> {
    let input = state
        .inputs
        .find_by_index(index)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::not_found(format!("input {index} not found")))?;
    Ok(Json(input.into()))
}

/// GET /vouchers.
pub(crate) async fn list_vouchers(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<VoucherView>>, ApiError> {
    let filters = query.filters()?;
    let page = state
        .vouchers
        .find_all(
            query.first,
            query.last,
            query.after.as_deref(),
            query.before.as_deref(),
            &filters,
        )
        .await?;
    Ok(Json(page.into()))
}

/// GET /vouchers/:input_index/:output_index.
pub(crate) async fn get_voucher(
    State(state): State<AppState>,
    Path((input_index, output_index)): Path<(u64, u64)>,
) -> Result<Json<VoucherView>, ApiError> {
    let voucher = state
        .vouchers
        .find_by_key(input_index, output_index)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| {
            ApiError::not_found(format!("voucher ({input_index}, {output_index}) not found"))
        })?;
    Ok(Json(voucher.into()))
}

/// GET /notices.
pub(crate) async fn list_notices(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<NoticeView>>, ApiError> {
    let filters = query.filters()?;
    let page = state
        .notices
        .find_all(
            query.first,
            query.last,
            query.after.as_deref(),
            query.before.as_deref(),
            &filters,
        )
        .await?;
    Ok(Json(page.into()))
}

/// GET /notices/:input_index/:output_index.
pub(crate) async fn get_notice(
    State(state): State<AppState>,
    Path((input_index, output_index)): Path<(u64, u64)>,
) -> Result<Json<NoticeView>, ApiError> {
    let notice = state
        .notices
        .find_by_key(input_index, output_index)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| {
            ApiError::not_found(format!("notice ({input_index}, {output_index}) not found"))
        })?;
    Ok(Json(notice.into()))
}

/// GET /reports.
pub(crate) async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<ReportView>>, ApiError> {
    let filters = query.filters()?;
    let page = state
        .reports
        .find_all(
            query.first,
            query.last,
            query.after.as_deref(),
            query.before.as_deref(),
            &filters,
        )
        .await?;
    Ok(Json(page.into()))
}
