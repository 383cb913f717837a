use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{ModelError, RollupInput, RollupModel};

/// Selects the next input for the guest. Both the input-box flavor and
/// a DA-driven flavor share the same selection semantics, so there is
/// a single implementation parameterized by where its inputs come
/// from; the provenance is whoever appends to the store.
#[async_trait]
pub trait Sequencer: Send + Sync {
    /// Finishes the in-flight input with the guest's verdict and hands
    /// out the next one, inspects first, then advances in FIFO order.
    async fn finish_and_get_next(&self, accept: bool)
        -> Result<Option<RollupInput>, ModelError>;
}

/// Sequencer over inputs appended from the L1 input box.
pub struct InputBoxSequencer {
    model: Arc<RollupModel>,
}

impl InputBoxSequencer {
    pub fn new(model: Arc<RollupModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Sequencer for InputBoxSequencer {
    async fn finish_and_get_next(
        &self,
        accept: bool,
    ) -> Result<Option<RollupInput>, ModelError> {
        self.model.finish_and_get_next(accept).await
    }
}
