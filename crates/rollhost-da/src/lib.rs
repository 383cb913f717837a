//! Generalized I/O ("gio"): pluggable retrieval of off-chain data
//! blobs for the guest, keyed by a domain id and bounded by the L1
//! epoch of the newest processed input.

mod error;
mod espresso;
mod syscoin;

pub use error::GioError;
pub use espresso::{
    EspressoClient, EspressoFetcher, EspressoHeader, L1BlockInfo, NamespaceBlock,
    DEFAULT_ESPRESSO_BASE_URL,
};
pub use syscoin::{SyscoinClient, DEFAULT_SYSCOIN_BASE_URL};

use tokio::sync::watch;

pub const ESPRESSO_DOMAIN: u16 = 2222;
pub const SYSCOIN_DOMAIN: u16 = 5700;

/// The "ok" code returned to the guest alongside fetched data.
pub const GIO_OK_CODE: u16 = 42;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GioResponse {
    pub code: u16,
    pub data: String,
}

/// Dispatches gio requests to the backend registered for the domain.
pub struct GioFetcher {
    espresso: EspressoFetcher,
    syscoin: SyscoinClient,
}

impl GioFetcher {
    pub fn new(espresso: EspressoFetcher, syscoin: SyscoinClient) -> Self {
        Self { espresso, syscoin }
    }

    pub async fn fetch(
        &self,
        domain: u16,
        id: &str,
        shutdown: &watch::Receiver<()>,
    ) -> Result<GioResponse, GioError> {
        match domain {
            ESPRESSO_DOMAIN => {
                let data = self.espresso.fetch(id, shutdown).await?;
                Ok(GioResponse {
                    code: GIO_OK_CODE,
                    data,
                })
            }
            SYSCOIN_DOMAIN => {
                let data = self.syscoin.fetch(id).await?;
                Ok(GioResponse {
                    code: GIO_OK_CODE,
                    data,
                })
            }
            other => Err(GioError::UnsupportedDomain(other)),
        }
    }
}
