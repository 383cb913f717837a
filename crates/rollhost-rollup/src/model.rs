use std::sync::Arc;

use alloy::primitives::Address;
use rollhost_model::{
    AdvanceInput, CompletionStatus, Filter, InputRepository, InspectInput, Report,
    ReportRepository,
};
use tokio::sync::Mutex;

use crate::decoder::{OutputHandler, NOTICE_SELECTOR, VOUCHER_SELECTOR};
use crate::state::{BufferedVoucher, RollupState};
use crate::StateError;

/// The input handed to the guest on `finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollupInput {
    Advance(AdvanceInput),
    Inspect(InspectInput),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The guest called an operation its current state forbids.
    #[error(transparent)]
    WrongState(#[from] StateError),
    /// The store (or the decoder behind it) failed.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

struct Inner {
    state: RollupState,
    inspects: Vec<InspectInput>,
}

/// Shared rollup model. All state-machine operations serialize behind
/// the single mutex; the only I/O under the lock is the persistence
/// performed when an input finishes.
pub struct RollupModel {
    inner: Mutex<Inner>,
    decoder: Arc<dyn OutputHandler>,
    inputs: InputRepository,
    reports: ReportRepository,
}

impl RollupModel {
    pub fn new(
        decoder: Arc<dyn OutputHandler>,
        inputs: InputRepository,
        reports: ReportRepository,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RollupState::Idle,
                inspects: Vec::new(),
            }),
            decoder,
            inputs,
            reports,
        }
    }

    /// Enqueues an inspect request and returns the index to poll.
    pub async fn add_inspect_input(&self, payload: Vec<u8>) -> u64 {
        let mut inner = self.inner.lock().await;
        let index = inner.inspects.len() as u64;
        tracing::info!(index, payload = %hex::encode(&payload), "added inspect input");
        inner.inspects.push(InspectInput::new(index, payload));
        index
    }

    pub async fn get_inspect_input(&self, index: u64) -> Option<InspectInput> {
        let inner = self.inner.lock().await;
        inner.inspects.get(index as usize).cloned()
    }

    /// Finishes the in-flight input (no-op when idle) and selects the
    /// next one: the oldest unprocessed inspect wins over the oldest
    /// unprocessed advance. Returns `None` and goes idle when there is
    /// no work.
    pub async fn finish_and_get_next(
        &self,
        accept: bool,
    ) -> Result<Option<RollupInput>, ModelError> {
        let mut inner = self.inner.lock().await;
        let status = if accept {
            CompletionStatus::Accepted
        } else {
            CompletionStatus::Rejected
        };
        self.finish_current(&mut inner, status).await?;

        if let Some(inspect) = inner
            .inspects
            .iter()
            .find(|inspect| inspect.status == CompletionStatus::Unprocessed)
            .cloned()
        {
            tracing::info!(index = inspect.index, "processing inspect");
            inner.state = RollupState::Inspect {
                index: inspect.index,
                reports: Vec::new(),
            };
            return Ok(Some(RollupInput::Inspect(inspect)));
        }

        if let Some(input) = self
            .inputs
            .find_first_by_status(CompletionStatus::Unprocessed)
            .await?
        {
            tracing::info!(index = input.index, "processing advance");
            inner.state = RollupState::Advance {
                input: input.clone(),
                vouchers: Vec::new(),
                notices: Vec::new(),
                reports: Vec::new(),
            };
            return Ok(Some(RollupInput::Advance(input)));
        }

        inner.state = RollupState::Idle;
        Ok(None)
    }

    /// Buffers a voucher in the in-flight advance and returns its
    /// index within the input.
    pub async fn add_voucher(
        &self,
        destination: Address,
        payload: Vec<u8>,
    ) -> Result<u64, StateError> {
        let mut inner = self.inner.lock().await;
        inner.state.add_voucher(destination, payload)
    }

    /// Buffers a notice in the in-flight advance and returns its index
    /// within the input.
    pub async fn add_notice(&self, payload: Vec<u8>) -> Result<u64, StateError> {
        let mut inner = self.inner.lock().await;
        inner.state.add_notice(payload)
    }

    /// Buffers a report in the in-flight advance or inspect.
    pub async fn add_report(&self, payload: Vec<u8>) -> Result<(), StateError> {
        let mut inner = self.inner.lock().await;
        inner.state.add_report(payload)
    }

    /// Finalizes the in-flight input as `Exception`. Buffered vouchers
    /// and notices are discarded; reports and the exception payload
    /// are persisted.
    pub async fn register_exception(&self, payload: Vec<u8>) -> Result<(), ModelError> {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, RollupState::Idle) {
            return Err(StateError {
                operation: "register exception",
                state: "idle",
            }
            .into());
        }
        match std::mem::replace(&mut inner.state, RollupState::Idle) {
            RollupState::Advance { input, reports, .. } => {
                self.save_reports(input.index, &reports).await?;
                self.inputs
                    .update(input.index, CompletionStatus::Exception, &payload)
                    .await?;
                tracing::info!(index = input.index, "finished advance with exception");
            }
            RollupState::Inspect { index, reports } => {
                let processed_input_count = self.processed_input_count().await?;
                let attached = attach_reports(index, &reports);
                if let Some(inspect) = inner.inspects.get_mut(index as usize) {
                    inspect.status = CompletionStatus::Exception;
                    inspect.processed_input_count = processed_input_count;
                    inspect.reports = attached;
                    inspect.exception = payload;
                }
                tracing::info!(index, "finished inspect with exception");
            }
            RollupState::Idle => unreachable!("idle state checked above"),
        }
        Ok(())
    }

    /// Number of advances that have reached a terminal state.
    pub async fn processed_input_count(&self) -> anyhow::Result<u64> {
        let count = self
            .inputs
            .count(&[Filter::ne("Status", CompletionStatus::Unprocessed)])
            .await?;
        Ok(count)
    }

    async fn finish_current(
        &self,
        inner: &mut Inner,
        status: CompletionStatus,
    ) -> anyhow::Result<()> {
        match std::mem::replace(&mut inner.state, RollupState::Idle) {
            RollupState::Idle => {}
            RollupState::Advance {
                mut input,
                vouchers,
                notices,
                reports,
            } => {
                input.status = status;
                if status == CompletionStatus::Accepted {
                    self.decode_outputs(input.index, &vouchers, &notices).await?;
                }
                self.save_reports(input.index, &reports).await?;
                self.inputs.update(input.index, status, &[]).await?;
                tracing::info!(index = input.index, %status, "finished advance");
            }
            RollupState::Inspect { index, reports } => {
                let processed_input_count = self.processed_input_count().await?;
                let attached = attach_reports(index, &reports);
                if let Some(inspect) = inner.inspects.get_mut(index as usize) {
                    inspect.status = status;
                    inspect.processed_input_count = processed_input_count;
                    inspect.reports = attached;
                }
                tracing::info!(index, %status, "finished inspect");
            }
        }
        Ok(())
    }

    /// Hands every buffered voucher and notice to the decoder, framed
    /// with its selector the way outputs appear on the wire.
    async fn decode_outputs(
        &self,
        input_index: u64,
        vouchers: &[BufferedVoucher],
        notices: &[Vec<u8>],
    ) -> anyhow::Result<()> {
        for (output_index, voucher) in vouchers.iter().enumerate() {
            let adapted = format!("0x{}{}", VOUCHER_SELECTOR, hex::encode(&voucher.payload));
            self.decoder
                .handle_output(
                    voucher.destination,
                    &adapted,
                    input_index,
                    output_index as u64,
                )
                .await?;
        }
        for (output_index, payload) in notices.iter().enumerate() {
            let adapted = format!("0x{}{}", NOTICE_SELECTOR, hex::encode(payload));
            self.decoder
                .handle_output(Address::ZERO, &adapted, input_index, output_index as u64)
                .await?;
        }
        Ok(())
    }

    async fn save_reports(&self, input_index: u64, reports: &[Vec<u8>]) -> anyhow::Result<()> {
        for (output_index, payload) in reports.iter().enumerate() {
            self.reports
                .create(Report {
                    input_index,
                    output_index: output_index as u64,
                    payload: payload.clone(),
                })
                .await?;
        }
        Ok(())
    }
}

fn attach_reports(inspect_index: u64, reports: &[Vec<u8>]) -> Vec<Report> {
    reports
        .iter()
        .enumerate()
        .map(|(output_index, payload)| Report {
            input_index: inspect_index,
            output_index: output_index as u64,
            payload: payload.clone(),
        })
        .collect()
}
