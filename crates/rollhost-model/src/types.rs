use alloy::primitives::Address;
use sea_orm::entity::prelude::*;

/// Completion status of an input.
///
/// `Unprocessed` is the only state an input is born in; the rollup
/// state machine moves it to exactly one of the terminal states when
/// the guest finishes the input.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStatus {
    #[sea_orm(string_value = "UNPROCESSED")]
    Unprocessed,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "EXCEPTION")]
    Exception,
}

impl std::fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompletionStatus::Unprocessed => "UNPROCESSED",
            CompletionStatus::Accepted => "ACCEPTED",
            CompletionStatus::Rejected => "REJECTED",
            CompletionStatus::Exception => "EXCEPTION",
        };
        f.write_str(s)
    }
}

/// An advance input read from the L1 input box.
///
/// Totally ordered by `index`, which the input-box contract assigns.
/// Only `status` and `exception` are mutable after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceInput {
    pub index: u64,
    pub status: CompletionStatus,
    pub msg_sender: Address,
    pub payload: Vec<u8>,
    pub block_number: u64,
    /// Milliseconds since the Unix epoch.
    pub block_timestamp: u64,
    pub prev_randao: u64,
    /// Empty unless the guest registered an exception.
    pub exception: Vec<u8>,
}

/// A read-only inspect request. Process-local, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectInput {
    /// Dense per-process index, assigned at arrival.
    pub index: u64,
    pub status: CompletionStatus,
    pub payload: Vec<u8>,
    /// Number of advances that had reached a terminal state when this
    /// inspect finished.
    pub processed_input_count: u64,
    pub reports: Vec<Report>,
    pub exception: Vec<u8>,
}

impl InspectInput {
    pub fn new(index: u64, payload: Vec<u8>) -> Self {
        Self {
            index,
            status: CompletionStatus::Unprocessed,
            payload,
            processed_input_count: 0,
            reports: Vec::new(),
            exception: Vec::new(),
        }
    }
}

/// A voucher: an output authorizing an on-chain action at a
/// destination address. Keyed by `(input_index, output_index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voucher {
    pub input_index: u64,
    pub output_index: u64,
    pub destination: Address,
    pub payload: Vec<u8>,
    pub executed: bool,
}

/// A notice: a verifiable application statement. Keyed by
/// `(input_index, output_index)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub input_index: u64,
    pub output_index: u64,
    pub payload: Vec<u8>,
}

/// A report: informational output, append-only and allowed to
/// duplicate its `(input_index, output_index)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub input_index: u64,
    pub output_index: u64,
    pub payload: Vec<u8>,
}
