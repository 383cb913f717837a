//! Persistent model for the rollup host.
//!
//! The store keeps four tables: `inputs`, `vouchers`, `notices` and
//! `reports`. Binary columns are lowercase hex text without a `0x`
//! prefix, addresses are 20-byte hex, and timestamps are milliseconds
//! since the Unix epoch. Tables are created on startup if missing; no
//! migrations are defined.

pub mod entity;
pub mod filter;
pub mod pagination;
pub mod repository;
#[cfg(test)]
pub(crate) mod test_utils;
mod types;

pub use filter::{Filter, FilterError};
pub use pagination::{compute_page, decode_cursor, encode_cursor, PageError, PageResult};
pub use repository::{
    InputRepository, NoticeRepository, QueryError, ReportRepository, VoucherRepository,
};
pub use types::{AdvanceInput, CompletionStatus, InspectInput, Notice, Report, Voucher};
