use alloy::primitives::Address;
use anyhow::Context;
use async_trait::async_trait;
use rollhost_model::{Notice, NoticeRepository, Voucher, VoucherRepository};

/// 4-byte selector identifying a voucher output.
pub const VOUCHER_SELECTOR: &str = "ef615e2f";
/// 4-byte selector identifying a notice output.
pub const NOTICE_SELECTOR: &str = "c258d6e5";

/// Receives every output of an accepted advance, framed as
/// `0x` + selector + payload hex.
#[async_trait]
pub trait OutputHandler: Send + Sync {
    async fn handle_output(
        &self,
        destination: Address,
        payload: &str,
        input_index: u64,
        output_index: u64,
    ) -> anyhow::Result<()>;
}

/// Classifies outputs by selector and persists them. Upserts on
/// `(input_index, output_index)`, so reprocessing an input is safe.
pub struct OutputDecoder {
    vouchers: VoucherRepository,
    notices: NoticeRepository,
    http: reqwest::Client,
}

impl OutputDecoder {
    pub fn new(vouchers: VoucherRepository, notices: NoticeRepository) -> Self {
        Self {
            vouchers,
            notices,
            http: reqwest::Client::new(),
        }
    }

    /// Best-effort ABI lookup for a destination address via a public
    /// block explorer. Convenience only; callers must tolerate any
    /// failure.
    pub async fn resolve_abi(&self, address: Address) -> anyhow::Result<serde_json::Value> {
        #[derive(serde::Deserialize)]
        struct ExplorerResponse {
            result: Vec<ExplorerEntry>,
        }
        #[derive(serde::Deserialize)]
        struct ExplorerEntry {
            #[serde(rename = "ABI")]
            abi: String,
        }

        let url = format!(
            "https://api.etherscan.io/api?module=contract&action=getsourcecode&address=0x{}",
            hex::encode(address)
        );
        let response: ExplorerResponse = self
            .http
            .get(&url)
            .send()
            .await
            .context("block explorer request failed")?
            .error_for_status()
            .context("block explorer returned an error status")?
            .json()
            .await
            .context("block explorer response is not JSON")?;
        let entry = response
            .result
            .first()
            .ok_or_else(|| anyhow::anyhow!("block explorer returned an empty result"))?;
        serde_json::from_str(&entry.abi).context("block explorer returned a malformed ABI")
    }
}

#[async_trait]
impl OutputHandler for OutputDecoder {
    async fn handle_output(
        &self,
        destination: Address,
        payload: &str,
        input_index: u64,
        output_index: u64,
    ) -> anyhow::Result<()> {
        let body = payload
            .strip_prefix("0x")
            .with_context(|| format!("output payload missing 0x prefix: {payload}"))?;
        if body.len() < 8 {
            anyhow::bail!("output payload shorter than a selector: {payload}");
        }
        let (selector, rest) = body.split_at(8);
        let data = hex::decode(rest).context("output payload is not valid hex")?;
        match selector {
            VOUCHER_SELECTOR => {
                self.vouchers
                    .upsert(Voucher {
                        input_index,
                        output_index,
                        destination,
                        payload: data,
                        executed: false,
                    })
                    .await?;
            }
            NOTICE_SELECTOR => {
                self.notices
                    .upsert(Notice {
                        input_index,
                        output_index,
                        payload: data,
                    })
                    .await?;
            }
            other => {
                tracing::warn!(
                    selector = other,
                    input_index,
                    output_index,
                    "ignoring output with unknown selector"
                );
            }
        }
        Ok(())
    }
}
