//! The rollup core: a state machine that drives a single guest through
//! the advance / inspect / idle lifecycle, the sequencer that selects
//! the next input, and the decoder that classifies accepted outputs.

mod decoder;
mod model;
mod sequencer;
mod state;

pub use decoder::{OutputDecoder, OutputHandler, NOTICE_SELECTOR, VOUCHER_SELECTOR};
pub use model::{ModelError, RollupInput, RollupModel};
pub use sequencer::{InputBoxSequencer, Sequencer};
pub use state::StateError;
