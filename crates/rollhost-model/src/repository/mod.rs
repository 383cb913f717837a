//! Repositories over the store tables.
//!
//! Every write is atomic on its own; batches are not. All repositories
//! are cheap to clone and share the underlying connection pool.

mod inputs;
mod notices;
mod reports;
mod vouchers;

pub use inputs::InputRepository;
pub use notices::NoticeRepository;
pub use reports::ReportRepository;
pub use vouchers::VoucherRepository;

use crate::{FilterError, PageError};

/// Errors from the filtered count/page queries. Filter and pagination
/// problems are client errors; database problems are not.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Db(#[from] sea_orm::DbErr),
}

impl QueryError {
    /// True when the request, not the store, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::Filter(_) | QueryError::Page(_))
    }
}
