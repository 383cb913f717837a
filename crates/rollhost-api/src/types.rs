//! Wire types for the guest-facing and query APIs. Payload and
//! address fields travel as `0x`-hex strings; integers are u64.

use rollhost_model::{AdvanceInput, InspectInput, Notice, PageResult, Report, Voucher};
use rollhost_rollup::RollupInput;

use crate::rest::encode_hex;

#[derive(Debug, serde::Deserialize)]
pub struct FinishRequest {
    pub status: FinishStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishStatus {
    Accept,
    Reject,
}

#[derive(Debug, serde::Deserialize)]
pub struct VoucherRequest {
    pub destination: String,
    pub payload: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct PayloadRequest {
    pub payload: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct GioRequest {
    pub domain: u16,
    pub id: String,
}

#[derive(Debug, serde::Serialize)]
pub struct IndexResponse {
    pub index: u64,
}

/// The envelope handed to the guest from `/finish`.
#[derive(Debug, serde::Serialize)]
#[serde(tag = "request_type", content = "data", rename_all = "snake_case")]
pub enum RollupRequest {
    AdvanceState(AdvanceBody),
    InspectState(InspectBody),
}

#[derive(Debug, serde::Serialize)]
pub struct AdvanceBody {
    pub metadata: AdvanceMetadata,
    pub payload: String,
}

#[derive(Debug, serde::Serialize)]
pub struct AdvanceMetadata {
    pub block_number: u64,
    pub input_index: u64,
    pub msg_sender: String,
    /// Seconds, as observed on L1.
    pub block_timestamp: u64,
}

#[derive(Debug, serde::Serialize)]
pub struct InspectBody {
    pub payload: String,
}

impl From<RollupInput> for RollupRequest {
    fn from(input: RollupInput) -> Self {
        match input {
            RollupInput::Advance(input) => RollupRequest::AdvanceState(AdvanceBody {
                metadata: AdvanceMetadata {
                    block_number: input.block_number,
                    input_index: input.index,
                    msg_sender: encode_hex(input.msg_sender.as_slice()),
                    block_timestamp: input.block_timestamp / 1000,
                },
                payload: encode_hex(&input.payload),
            }),
            RollupInput::Inspect(input) => RollupRequest::InspectState(InspectBody {
                payload: encode_hex(&input.payload),
            }),
        }
    }
}

/// Result of a completed inspect request.
#[derive(Debug, serde::Serialize)]
pub struct InspectResult {
    pub status: String,
    pub processed_input_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_payload: Option<String>,
    pub reports: Vec<InspectReport>,
}

#[derive(Debug, serde::Serialize)]
pub struct InspectReport {
    pub payload: String,
}

impl From<InspectInput> for InspectResult {
    fn from(input: InspectInput) -> Self {
        InspectResult {
            status: input.status.to_string(),
            processed_input_count: input.processed_input_count,
            exception_payload: if input.exception.is_empty() {
                None
            } else {
                Some(encode_hex(&input.exception))
            },
            reports: input
                .reports
                .iter()
                .map(|report| InspectReport {
                    payload: encode_hex(&report.payload),
                })
                .collect(),
        }
    }
}

/// Query-API page envelope.
#[derive(Debug, serde::Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub offset: u64,
}

impl<T, U: From<T>> From<PageResult<T>> for PageResponse<U> {
    fn from(page: PageResult<T>) -> Self {
        PageResponse {
            data: page.rows.into_iter().map(U::from).collect(),
            total: page.total,
            offset: page.offset,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct InputView {
    pub index: u64,
    pub status: String,
    pub msg_sender: String,
    pub payload: String,
    pub block_number: u64,
    /// Milliseconds, as stored.
    pub block_timestamp: u64,
    pub prev_randao: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl From<AdvanceInput> for InputView {
    fn from(input: AdvanceInput) -> Self {
        InputView {
            index: input.index,
            status: input.status.to_string(),
            msg_sender: encode_hex(input.msg_sender.as_slice()),
            payload: encode_hex(&input.payload),
            block_number: input.block_number,
            block_timestamp: input.block_timestamp,
            prev_randao: input.prev_randao,
            exception: if input.exception.is_empty() {
                None
            } else {
                Some(encode_hex(&input.exception))
            },
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct VoucherView {
    pub input_index: u64,
    pub output_index: u64,
    pub destination: String,
    pub payload: String,
    pub executed: bool,
}

impl From<Voucher> for VoucherView {
    fn from(voucher: Voucher) -> Self {
        VoucherView {
            input_index: voucher.input_index,
            output_index: voucher.output_index,
            destination: encode_hex(voucher.destination.as_slice()),
            payload: encode_hex(&voucher.payload),
            executed: voucher.executed,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct NoticeView {
    pub input_index: u64,
    pub output_index: u64,
    pub payload: String,
}

impl From<Notice> for NoticeView {
    fn from(notice: Notice) -> Self {
        NoticeView {
            input_index: notice.input_index,
            output_index: notice.output_index,
            payload: encode_hex(&notice.payload),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ReportView {
    pub input_index: u64,
    pub output_index: u64,
    pub payload: String,
}

impl From<Report> for ReportView {
    fn from(report: Report) -> Self {
        ReportView {
            input_index: report.input_index,
            output_index: report.output_index,
            payload: encode_hex(&report.payload),
        }
    }
}
