//! Progress events emitted while a pipeline runs.

use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Something observable happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    AgentStarted {
        agent: String,
    },
    ToolCalled {
        agent: String,
        tool: String,
        arguments: String,
    },
    Retrying {
        agent: String,
        attempt: u32,
        delay: Duration,
    },
    AgentFinished {
        agent: String,
        output_key: String,
        elapsed_ms: u64,
    },
}

/// Optional sender for [`PipelineEvent`]s. The default sink drops everything.
#[derive(Debug, Clone, Default)]
pub struct EventSink(Option<UnboundedSender<PipelineEvent>>);

impl EventSink {
    /// Create a connected sink and its receiver.
    pub fn channel() -> (Self, UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self(Some(tx)), rx)
    }

    pub fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.0 {
            // Receiver gone means nobody is watching; not an error.
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sink_discards() {
        EventSink::default().emit(PipelineEvent::AgentStarted {
            agent: "A".to_string(),
        });
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.emit(PipelineEvent::AgentStarted { agent: "A".to_string() });
        sink.emit(PipelineEvent::AgentStarted { agent: "B".to_string() });
        assert_eq!(rx.try_recv().unwrap(), PipelineEvent::AgentStarted { agent: "A".to_string() });
        assert_eq!(rx.try_recv().unwrap(), PipelineEvent::AgentStarted { agent: "B".to_string() });
    }
}
