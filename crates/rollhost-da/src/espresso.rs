//! Fetches namespace-filtered blocks from an Espresso sequencer query
//! node, bounded by the L1 epoch of the newest processed input.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use rollhost_model::{CompletionStatus, InputRepository};
use tokio::sync::watch;

use crate::GioError;

pub const DEFAULT_ESPRESSO_BASE_URL: &str = "https://query.cappuccino.testnet.espresso.network";

/// `0x` + 64 hex chars for the max L1 block number + 64 hex chars for
/// the Espresso block height.
const ID_LENGTH: usize = 130;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Thin wrapper over the Espresso availability/status HTTP API.
#[derive(Debug, Clone)]
pub struct EspressoClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EspressoHeader {
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub l1_finalized: Option<L1BlockInfo>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct L1BlockInfo {
    #[serde(default)]
    pub number: u64,
}

/// The namespace-filtered view of one Espresso block, returned to the
/// guest verbatim (hex-encoded JSON).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NamespaceBlock {
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
    #[serde(default)]
    pub proof: serde_json::Value,
}

impl EspressoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// GET /status/block_height
    pub async fn latest_block_height(&self) -> anyhow::Result<u64> {
        let height = self
            .http
            .get(format!("{}/status/block_height", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json::<u64>()
            .await?;
        Ok(height)
    }

    /// GET /availability/header/:height
    pub async fn header_by_height(&self, height: u64) -> anyhow::Result<EspressoHeader> {
        let header = self
            .http
            .get(format!("{}/availability/header/{height}", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json::<EspressoHeader>()
            .await?;
        Ok(header)
    }

    /// GET /availability/block/:height/namespace/:namespace
    pub async fn transactions_in_namespace(
        &self,
        height: u64,
        namespace: u64,
    ) -> anyhow::Result<NamespaceBlock> {
        let block = self
            .http
            .get(format!(
                "{}/availability/block/{height}/namespace/{namespace}",
                self.base_url
            ))
            .send()
            .await?
            .error_for_status()?
            .json::<NamespaceBlock>()
            .await?;
        Ok(block)
    }
}

pub struct EspressoFetcher {
    inputs: InputRepository,
    client: EspressoClient,
    namespace: u64,
    epoch_duration: u64,
}

impl EspressoFetcher {
    /// The namespace is pinned to the first 16 bits of the application
    /// address.
    pub fn new(
        inputs: InputRepository,
        client: EspressoClient,
        application_address: Address,
        epoch_duration: u64,
    ) -> Self {
        assert!(epoch_duration > 0, "epoch duration must be positive");
        let namespace = u64::from(u16::from_be_bytes([
            application_address[0],
            application_address[1],
        ]));
        Self {
            inputs,
            client,
            namespace,
            epoch_duration,
        }
    }

    pub fn namespace(&self) -> u64 {
        self.namespace
    }

    /// Resolves an id to hex-encoded JSON of the namespace-filtered
    /// transactions at the requested Espresso height, waiting for the
    /// height to become available when necessary.
    pub async fn fetch(
        &self,
        id: &str,
        shutdown: &watch::Receiver<()>,
    ) -> Result<String, GioError> {
        let (max_block_number, espresso_height) = parse_id(id)?;

        let current = self
            .inputs
            .find_latest_with_status_ne(CompletionStatus::Unprocessed)
            .await
            .map_err(GioError::upstream)?
            .ok_or_else(|| {
                GioError::upstream("no processed input to bound the current epoch")
            })?;
        let current_epoch = current.block_number / self.epoch_duration;
        let requested_epoch = max_block_number / self.epoch_duration;
        if requested_epoch > current_epoch {
            tracing::error!(
                requested_epoch,
                current_epoch,
                "requested data beyond current epoch"
            );
            return Err(GioError::BeyondCurrentEpoch {
                requested_epoch,
                current_epoch,
            });
        }

        let mut shutdown = shutdown.clone();
        loop {
            let latest = self
                .client
                .latest_block_height()
                .await
                .map_err(GioError::upstream)?;
            if latest < espresso_height {
                // Not produced yet. Bail out if the L1 has already
                // moved past the requested scope, otherwise wait.
                let header = self
                    .client
                    .header_by_height(latest)
                    .await
                    .map_err(GioError::upstream)?;
                if l1_finalized_number(&header) > max_block_number {
                    return Err(GioError::Upstream(format!(
                        "espresso block height {espresso_height} is not finalized"
                    )));
                }
                tokio::select! {
                    _ = shutdown.changed() => return Err(GioError::Cancelled),
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                }
                continue;
            }

            let block = self
                .client
                .transactions_in_namespace(espresso_height, self.namespace)
                .await
                .map_err(GioError::upstream)?;
            let header = self
                .client
                .header_by_height(espresso_height)
                .await
                .map_err(GioError::upstream)?;
            let Some(l1_finalized) = header.l1_finalized.as_ref() else {
                return Err(GioError::NotFound(format!(
                    "espresso block {espresso_height} with undefined L1 block number"
                )));
            };
            if l1_finalized.number > max_block_number {
                return Err(GioError::NotFound(format!(
                    "espresso block height {espresso_height} beyond requested L1 block number"
                )));
            }
            let serialized = serde_json::to_vec(&block).map_err(GioError::upstream)?;
            tracing::info!(
                height = espresso_height,
                transactions = block.transactions.len(),
                "fetched espresso block"
            );
            return Ok(format!("0x{}", hex::encode(serialized)));
        }
    }
}

fn l1_finalized_number(header: &EspressoHeader) -> u64 {
    header
        .l1_finalized
        .as_ref()
        .map(|info| info.number)
        .unwrap_or_default()
}

/// Splits the id into `(max_block_number, espresso_block_height)`,
/// both hex-encoded 256-bit integers that must fit a u64.
fn parse_id(id: &str) -> Result<(u64, u64), GioError> {
    let invalid = || {
        GioError::InvalidId(format!(
            "invalid id {id}: must be a hex string with 32 bytes for the max block \
             number and 32 bytes for the espresso block height"
        ))
    };
    if id.len() != ID_LENGTH || !id.starts_with("0x") {
        return Err(invalid());
    }
    let max_block_number = U256::from_str_radix(&id[2..66], 16).map_err(|_| invalid())?;
    let espresso_height = U256::from_str_radix(&id[66..130], 16).map_err(|_| invalid())?;
    let max_block_number = u64::try_from(max_block_number).map_err(|_| invalid())?;
    let espresso_height = u64::try_from(espresso_height).map_err(|_| invalid())?;
    Ok((max_block_number, espresso_height))
}
