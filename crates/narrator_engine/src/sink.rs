use std::sync::mpsc;

use crate::EngineEvent;

/// Receives engine events as they happen. Implementations must not block.
///
/// Generation outcomes are emitted with no workflow lock held, so a sink may
/// call [`GenerationWorkflow::view`](crate::GenerationWorkflow::view) when it
/// sees one. `Narration` events can be emitted while the workflow is locked;
/// a sink must not call back into the workflow for those.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        // Receiver gone means the front end has shut down.
        let _ = self.tx.send(event);
    }
}
