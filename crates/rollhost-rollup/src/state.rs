use alloy::primitives::Address;
use rollhost_model::AdvanceInput;

/// A guest operation arrived in a state that forbids it. Never fatal;
/// the façade reports it and the state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {operation} in {state} state")]
pub struct StateError {
    pub operation: &'static str,
    pub state: &'static str,
}

/// A voucher buffered during an advance, before any persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BufferedVoucher {
    pub destination: Address,
    pub payload: Vec<u8>,
}

/// The rollup lifecycle. Exactly one input is in flight at a time;
/// outputs accumulate in buffers until the guest finishes the input.
#[derive(Debug)]
pub(crate) enum RollupState {
    Idle,
    Advance {
        input: AdvanceInput,
        vouchers: Vec<BufferedVoucher>,
        notices: Vec<Vec<u8>>,
        reports: Vec<Vec<u8>>,
    },
    Inspect {
        /// Index into the process-local inspect list.
        index: u64,
        reports: Vec<Vec<u8>>,
    },
}

impl RollupState {
    pub fn name(&self) -> &'static str {
        match self {
            RollupState::Idle => "idle",
            RollupState::Advance { .. } => "advance",
            RollupState::Inspect { .. } => "inspect",
        }
    }

    fn wrong_state(&self, operation: &'static str) -> StateError {
        StateError {
            operation,
            state: self.name(),
        }
    }

    /// Buffers a voucher; only legal during an advance. Returns the
    /// voucher index within the input.
    pub fn add_voucher(
        &mut self,
        destination: Address,
        payload: Vec<u8>,
    ) -> Result<u64, StateError> {
        match self {
            RollupState::Advance { vouchers, .. } => {
                let index = vouchers.len() as u64;
                tracing::info!(
                    index,
                    %destination,
                    payload = %hex::encode(&payload),
                    "added voucher"
                );
                vouchers.push(BufferedVoucher {
                    destination,
                    payload,
                });
                Ok(index)
            }
            _ => Err(self.wrong_state("add voucher")),
        }
    }

    /// Buffers a notice; only legal during an advance. Returns the
    /// notice index within the input.
    pub fn add_notice(&mut self, payload: Vec<u8>) -> Result<u64, StateError> {
        match self {
            RollupState::Advance { notices, .. } => {
                let index = notices.len() as u64;
                tracing::info!(index, payload = %hex::encode(&payload), "added notice");
                notices.push(payload);
                Ok(index)
            }
            _ => Err(self.wrong_state("add notice")),
        }
    }

    /// Buffers a report; legal during an advance or an inspect.
    pub fn add_report(&mut self, payload: Vec<u8>) -> Result<(), StateError> {
        match self {
            RollupState::Advance { reports, .. } | RollupState::Inspect { reports, .. } => {
                tracing::info!(
                    index = reports.len(),
                    payload = %hex::encode(&payload),
                    "added report"
                );
                reports.push(payload);
                Ok(())
            }
            _ => Err(self.wrong_state("add report")),
        }
    }
}
