//! Worker that reads advance inputs from the L1 input box and appends
//! them to the store.
//!
//! The live subscription is installed before the backfill scan, so no
//! input can land in the gap between the two phases; the overlap this
//! creates is absorbed by the store's idempotent append.

pub mod contracts;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::rpc::types::{Filter, Log};
use alloy::sol_types::{SolCall, SolEvent};
use anyhow::Context;
use futures::StreamExt;
use rollhost_model::{AdvanceInput, CompletionStatus, InputRepository};
use tokio::sync::watch;

use crate::contracts::{EvmAdvanceCall, InputAdded};

/// Tails `InputAdded` events for one application and appends each
/// decoded advance to the store.
pub struct InputterWorker {
    pub provider_url: String,
    pub input_box_address: Address,
    /// Block the input box was deployed at; the backfill starts here.
    pub input_box_block: u64,
    pub application_address: Address,
    pub inputs: InputRepository,
}

impl InputterWorker {
    /// Runs until the shutdown signal fires. A failed subscription is
    /// an error: the caller decides how fatal that is.
    pub async fn run(self, mut shutdown: watch::Receiver<()>) -> anyhow::Result<()> {
        let provider = ProviderBuilder::new()
            .connect_ws(WsConnect::new(self.provider_url.clone()))
            .await
            .context("inputter: dial provider")?;
        let filter = Filter::new()
            .address(self.input_box_address)
            .event_signature(InputAdded::SIGNATURE_HASH)
            .topic1(self.application_address.into_word());

        let subscription = provider
            .subscribe_logs(&filter)
            .await
            .context("inputter: subscribe to input added")?;
        let mut live = subscription.into_stream();

        self.read_past_inputs(&provider, filter).await?;

        tracing::info!("inputter: watching new inputs");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("inputter: shutdown requested");
                    return Ok(());
                }
                log = live.next() => match log {
                    Some(log) => self.add_input(&provider, log).await?,
                    None => anyhow::bail!("inputter: subscription closed"),
                },
            }
        }
    }

    /// Reads inputs from the input-box deployment block to the current
    /// head.
    async fn read_past_inputs(
        &self,
        provider: &impl Provider,
        filter: Filter,
    ) -> anyhow::Result<()> {
        let filter = filter
            .from_block(self.input_box_block)
            .to_block(BlockNumberOrTag::Latest);
        let logs = provider
            .get_logs(&filter)
            .await
            .context("inputter: filter input added")?;
        tracing::debug!(
            count = logs.len(),
            from_block = self.input_box_block,
            "inputter: backfilling past inputs"
        );
        for log in logs {
            self.add_input(provider, log).await?;
        }
        Ok(())
    }

    async fn add_input(&self, provider: &impl Provider, log: Log) -> anyhow::Result<()> {
        let event = InputAdded::decode_log(&log.inner)
            .context("inputter: decode input added event")?
            .data;
        let block_hash = log
            .block_hash
            .context("inputter: log carries no block hash")?;
        let block = provider
            .get_block_by_hash(block_hash)
            .await
            .context("inputter: fetch block header")?
            .with_context(|| format!("inputter: block {block_hash} not found"))?;

        let call = EvmAdvanceCall::abi_decode(&event.input)
            .context("inputter: decode EvmAdvance calldata")?;
        let index = u64::try_from(event.index)
            .map_err(|_| anyhow::anyhow!("inputter: input index out of range"))?;

        let input = AdvanceInput {
            index,
            status: CompletionStatus::Unprocessed,
            msg_sender: call.msgSender,
            payload: call.payload.to_vec(),
            block_number: log.block_number.unwrap_or_default(),
            block_timestamp: block.header.timestamp * 1000,
            // randao does not fit a u64 in general; saturate.
            prev_randao: u64::try_from(call.prevRandao).unwrap_or(u64::MAX),
            exception: Vec::new(),
        };
        tracing::debug!(
            dapp = %event.appContract,
            index,
            sender = %input.msg_sender,
            payload = %hex::encode(&input.payload),
            block_number = input.block_number,
            "inputter: read event"
        );
        self.inputs.create(input).await?;
        Ok(())
    }
}
