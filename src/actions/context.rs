//! Per-build execution context handed to strategies and branches.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::actions::registry::DynamicStrategyRegistry;

/// Informational events surfaced to the build console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    Info { message: String },
    Warning { message: String },
}

/// Hands scheduler events to whoever is listening, if anyone is.
///
/// Emission never blocks the scheduler: events go through a bounded channel
/// and are silently dropped when no listener was attached or the listener
/// has fallen behind. The events are advisory, the race outcome never
/// depends on one being observed.
#[derive(Clone)]
pub struct EventEmitter {
    tx: Option<mpsc::Sender<ExecutionEvent>>,
}

impl EventEmitter {
    pub fn new(tx: mpsc::Sender<ExecutionEvent>) -> Self {
        EventEmitter { tx: Some(tx) }
    }

    /// An emitter without a listener; every event is dropped.
    pub fn disabled() -> Self {
        EventEmitter { tx: None }
    }

    pub fn emit(&self, event: ExecutionEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.try_send(event);
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(ExecutionEvent::Info {
            message: message.into(),
        });
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.emit(ExecutionEvent::Warning {
            message: message.into(),
        });
    }
}

/// Context of one action execution: the strategy registry, the event sink,
/// and the top-level interrupt signal.
pub struct ActionExecutionContext {
    registry: Arc<dyn DynamicStrategyRegistry>,
    event_emitter: EventEmitter,
    interrupt: CancellationToken,
}

impl ActionExecutionContext {
    pub fn new(registry: Arc<dyn DynamicStrategyRegistry>) -> Self {
        ActionExecutionContext {
            registry,
            event_emitter: EventEmitter::disabled(),
            interrupt: CancellationToken::new(),
        }
    }

    pub fn with_event_emitter(mut self, event_emitter: EventEmitter) -> Self {
        self.event_emitter = event_emitter;
        self
    }

    pub fn with_interrupt(mut self, interrupt: CancellationToken) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn registry(&self) -> &Arc<dyn DynamicStrategyRegistry> {
        &self.registry
    }

    pub fn event_emitter(&self) -> &EventEmitter {
        &self.event_emitter
    }

    /// Token fired when the whole build is being interrupted.
    pub fn interrupt(&self) -> &CancellationToken {
        &self.interrupt
    }
}
