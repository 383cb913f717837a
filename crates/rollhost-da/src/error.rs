/// Errors from the gio fetchers, each mapped to the HTTP status the
/// façade reports.
#[derive(Debug, thiserror::Error)]
pub enum GioError {
    #[error("unsupported domain {0}")]
    UnsupportedDomain(u16),
    #[error("{0}")]
    InvalidId(String),
    #[error(
        "requested data beyond current epoch '{current_epoch}' \
         (data estimated to belong to epoch '{requested_epoch}')"
    )]
    BeyondCurrentEpoch {
        requested_epoch: u64,
        current_epoch: u64,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("request cancelled while waiting for upstream data")]
    Cancelled,
    #[error("{0}")]
    Upstream(String),
}

impl GioError {
    pub fn status(&self) -> u16 {
        match self {
            GioError::UnsupportedDomain(_) | GioError::InvalidId(_) => 400,
            GioError::BeyondCurrentEpoch { .. } => 403,
            GioError::NotFound(_) => 404,
            GioError::Cancelled | GioError::Upstream(_) => 500,
        }
    }

    pub(crate) fn upstream(err: impl std::fmt::Display) -> Self {
        GioError::Upstream(err.to_string())
    }
}
