//! In-memory event source: replays recorded traces into registered handlers.

use super::{EventSource, Handler, HandlerId, InteractionEvent, RegionId, Scope, Viewport};
use serde::{Deserialize, Serialize};

/// One line of a recorded interaction trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Region the event happened in; absent for document-level events
    #[serde(default)]
    pub region: Option<RegionId>,
    #[serde(flatten)]
    pub event: InteractionEvent,
}

pub struct ScriptedSource {
    viewport: Viewport,
    handlers: Vec<(HandlerId, Scope, Handler)>,
    next_id: u64,
}

impl ScriptedSource {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            handlers: Vec::new(),
            next_id: 1,
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Deliver one event to every handler whose scope covers `origin`.
    /// Each handler runs to completion before the next.
    pub fn dispatch(&mut self, origin: Option<RegionId>, event: &InteractionEvent) -> usize {
        let mut delivered = 0;
        for (_, scope, handler) in self.handlers.iter_mut() {
            if scope.matches(origin) {
                handler(event);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn replay(&mut self, trace: &[TraceEntry]) {
        for entry in trace {
            self.dispatch(entry.region, &entry.event);
        }
    }
}

impl EventSource for ScriptedSource {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn register(&mut self, scope: Scope, handler: Handler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, scope, handler));
        id
    }

    fn unregister(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _, _)| *h != id);
        self.handlers.len() != before
    }
}

/// A recorded login session, as replayed by the command-line driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTrace {
    pub started_at: i64,
    /// Submission time; defaults to the last event
    #[serde(default)]
    pub submitted_at: Option<i64>,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    /// Region the collector is attached to; whole document when absent
    #[serde(default)]
    pub region: Option<RegionId>,
    /// The hidden decoy field was filled
    #[serde(default)]
    pub honeypot: bool,
    pub events: Vec<TraceEntry>,
}

impl SessionTrace {
    pub fn submitted_at(&self) -> i64 {
        self.submitted_at
            .or_else(|| self.events.iter().map(|e| e.event.at()).max())
            .unwrap_or(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_entries_parse_flat() {
        let raw = r#"[
            {"type":"key_down","key":"a","at":10,"region":1},
            {"type":"pointer_move","x":3.0,"at":12},
            {"type":"visibility","hidden":true,"at":20}
        ]"#;
        let trace: Vec<TraceEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(trace[0].region, Some(RegionId(1)));
        assert_eq!(
            trace[1].event,
            InteractionEvent::PointerMove { x: Some(3.0), y: None, at: 12 }
        );
        assert!(trace[2].region.is_none());
    }

    #[test]
    fn trace_submission_time_defaults_to_last_event() {
        let raw = r#"{"started_at":100,"events":[
            {"type":"click","x":1.0,"y":2.0,"at":450},
            {"type":"paste","at":300}
        ]}"#;
        let t: SessionTrace = serde_json::from_str(raw).unwrap();
        assert_eq!(t.submitted_at(), 450);
        assert!(!t.honeypot);
        let empty: SessionTrace = serde_json::from_str(r#"{"started_at":7,"events":[]}"#).unwrap();
        assert_eq!(empty.submitted_at(), 7);
    }

    #[test]
    fn unregister_unknown_is_false() {
        let mut src = ScriptedSource::new(Viewport::new(1.0, 1.0));
        assert!(!src.unregister(HandlerId(42)));
    }
}
