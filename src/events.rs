//! Interaction notifications for analytics
//!
//! The world reports every gaze acquisition and every fuse through an
//! [`EventSink`]. Delivery is the host's business; closures work as sinks.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// The gaze settled on a new target
    Acquire,
    /// The dwell timer completed on a target
    Fuse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    /// `node`, `button` or `intro`
    pub target: &'static str,
    /// Node name or control label
    pub label: String,
}

pub trait EventSink {
    fn emit(&mut self, event: &InteractionEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&InteractionEvent),
{
    fn emit(&mut self, event: &InteractionEvent) {
        self(event)
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<InteractionEvent>,
}

impl EventLog {
    pub fn events(&self) -> &[InteractionEvent] {
        &self.events
    }

    pub fn fuses(&self) -> impl Iterator<Item = &InteractionEvent> {
        self.events
            .iter()
            .filter(|e| e.kind == InteractionKind::Fuse)
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &InteractionEvent) {
        self.events.push(event.clone());
    }
}
