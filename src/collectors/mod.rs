//! Passive interaction capture: keyboard, pointer, focus and visibility events
//! observed through an abstract event source and folded into a [`RawSession`].

mod focus;
mod keyboard;
mod pointer;
mod session;
mod source;

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use crate::config::CollectorConfig;
use crate::features::{FeatureExtractor, FeatureVector};

pub use pointer::Octant;
pub use session::{ClickPosition, KeyRecord, PointerSample, RawSession};
pub use source::{ScriptedSource, SessionTrace, TraceEntry};

/// Tracked UI region (e.g. the login form container).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

/// Opaque identity of a focusable element. Never dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandlerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Where a handler listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Region(RegionId),
    Document,
}

impl Scope {
    pub fn matches(&self, origin: Option<RegionId>) -> bool {
        match self {
            Scope::Document => true,
            Scope::Region(r) => origin == Some(*r),
        }
    }
}

/// Raw UI event. `at` is epoch milliseconds from the event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionEvent {
    KeyDown {
        #[serde(default)]
        key: String,
        at: i64,
    },
    KeyUp {
        #[serde(default)]
        key: String,
        at: i64,
    },
    Paste {
        at: i64,
    },
    PointerMove {
        x: Option<f64>,
        y: Option<f64>,
        at: i64,
    },
    Click {
        x: Option<f64>,
        y: Option<f64>,
        at: i64,
    },
    FocusIn {
        target: TargetHandle,
        at: i64,
    },
    Visibility {
        hidden: bool,
        at: i64,
    },
}

impl InteractionEvent {
    pub fn at(&self) -> i64 {
        match self {
            InteractionEvent::KeyDown { at, .. }
            | InteractionEvent::KeyUp { at, .. }
            | InteractionEvent::Paste { at }
            | InteractionEvent::PointerMove { at, .. }
            | InteractionEvent::Click { at, .. }
            | InteractionEvent::FocusIn { at, .. }
            | InteractionEvent::Visibility { at, .. } => *at,
        }
    }

    fn is_visibility(&self) -> bool {
        matches!(self, InteractionEvent::Visibility { .. })
    }
}

pub type Handler = Box<dyn FnMut(&InteractionEvent)>;

/// Capability the collector needs from a UI toolkit.
pub trait EventSource {
    fn viewport(&self) -> Viewport;
    fn register(&mut self, scope: Scope, handler: Handler) -> HandlerId;
    /// Returns false when the id is unknown.
    fn unregister(&mut self, id: HandlerId) -> bool;
}

impl RawSession {
    /// Fold one event into the session. Malformed events are dropped.
    pub fn apply(&mut self, event: &InteractionEvent, noise_floor_px: f64) {
        match event {
            InteractionEvent::KeyDown { key, at } => self.on_key_down(key, *at),
            InteractionEvent::KeyUp { key, at } => self.on_key_up(key, *at),
            InteractionEvent::Paste { at } => self.on_paste(*at),
            InteractionEvent::PointerMove {
                x: Some(x),
                y: Some(y),
                at,
            } => self.on_pointer_move(*x, *y, *at, noise_floor_px),
            InteractionEvent::Click {
                x: Some(x),
                y: Some(y),
                at,
            } => self.on_click(*x, *y, *at),
            InteractionEvent::FocusIn { target, .. } => self.on_focus_in(*target),
            InteractionEvent::Visibility { hidden, at } => self.on_visibility(*hidden, *at),
            InteractionEvent::PointerMove { .. } | InteractionEvent::Click { .. } => {}
        }
    }
}

/// Caller-owned capture session for one page/form lifetime.
pub struct Collector {
    config: CollectorConfig,
    session: Rc<RefCell<RawSession>>,
    handlers: Vec<HandlerId>,
}

impl Collector {
    pub fn new(config: CollectorConfig, started_at: i64) -> Self {
        let viewport = Viewport::new(config.fallback_viewport_width, config.fallback_viewport_height);
        Self {
            config,
            session: Rc::new(RefCell::new(RawSession::new(started_at, viewport))),
            handlers: Vec::new(),
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Listen on `region`, or the whole document when none is given.
    /// Visibility is always observed document-wide.
    pub fn attach(&mut self, source: &mut dyn EventSource, region: Option<RegionId>) {
        if self.is_attached() {
            debug!("collector already attached");
            return;
        }
        let viewport = source.viewport();
        if !viewport.is_empty() {
            if let Ok(mut s) = self.session.try_borrow_mut() {
                s.viewport = viewport;
            }
        }

        let scope = region.map(Scope::Region).unwrap_or(Scope::Document);
        let floor = self.config.direction_noise_floor_px;

        let session = Rc::clone(&self.session);
        let input = source.register(
            scope,
            Box::new(move |ev: &InteractionEvent| {
                if ev.is_visibility() {
                    return;
                }
                // a re-entrant dispatch loses the event rather than panicking
                if let Ok(mut s) = session.try_borrow_mut() {
                    s.apply(ev, floor);
                }
            }),
        );

        let session = Rc::clone(&self.session);
        let visibility = source.register(
            Scope::Document,
            Box::new(move |ev: &InteractionEvent| {
                if !ev.is_visibility() {
                    return;
                }
                if let Ok(mut s) = session.try_borrow_mut() {
                    s.apply(ev, floor);
                }
            }),
        );

        self.handlers = vec![input, visibility];
        debug!(?scope, "collector attached");
    }

    /// Idempotent.
    pub fn detach(&mut self, source: &mut dyn EventSource) {
        for id in self.handlers.drain(..) {
            source.unregister(id);
        }
    }

    pub fn trigger_honeypot(&self) {
        self.session.borrow_mut().trigger_honeypot();
    }

    /// Record an outgoing request (form submit, fetch).
    pub fn track_request(&self, at: i64) {
        self.session.borrow_mut().track_request(at);
    }

    /// Owned copy of the current state.
    pub fn snapshot(&self) -> RawSession {
        self.session.borrow().clone()
    }

    pub fn extract(&self, extractor: &FeatureExtractor, user_id: &str, now: i64) -> FeatureVector {
        extractor.extract(&self.session.borrow(), user_id, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(kind: &str, k: &str, at: i64) -> InteractionEvent {
        match kind {
            "down" => InteractionEvent::KeyDown { key: k.into(), at },
            _ => InteractionEvent::KeyUp { key: k.into(), at },
        }
    }

    #[test]
    fn region_scope_filters_foreign_events() {
        let mut src = ScriptedSource::new(Viewport::new(800.0, 600.0));
        let mut c = Collector::new(CollectorConfig::default(), 0);
        c.attach(&mut src, Some(RegionId(7)));

        src.dispatch(Some(RegionId(7)), &key("down", "a", 10));
        src.dispatch(Some(RegionId(7)), &key("up", "a", 60));
        src.dispatch(Some(RegionId(9)), &key("down", "b", 70));
        src.dispatch(None, &InteractionEvent::Visibility { hidden: true, at: 100 });
        src.dispatch(None, &InteractionEvent::Visibility { hidden: false, at: 400 });

        let s = c.snapshot();
        assert_eq!(s.key_events.len(), 1);
        assert!(s.keys_down.is_empty());
        assert_eq!(s.idle_accumulated_ms, 300);
        assert_eq!(s.viewport, Viewport::new(800.0, 600.0));
    }

    #[test]
    fn document_fallback_sees_everything_once() {
        let mut src = ScriptedSource::new(Viewport::new(800.0, 600.0));
        let mut c = Collector::new(CollectorConfig::default(), 0);
        c.attach(&mut src, None);
        src.dispatch(Some(RegionId(3)), &InteractionEvent::Paste { at: 5 });
        src.dispatch(None, &InteractionEvent::Visibility { hidden: true, at: 10 });
        src.dispatch(None, &InteractionEvent::Visibility { hidden: false, at: 20 });
        let s = c.snapshot();
        assert_eq!(s.paste_count, 1);
        assert_eq!(s.idle_accumulated_ms, 10);
    }

    #[test]
    fn detach_is_idempotent() {
        let mut src = ScriptedSource::new(Viewport::new(800.0, 600.0));
        let mut c = Collector::new(CollectorConfig::default(), 0);
        c.attach(&mut src, None);
        assert_eq!(src.handler_count(), 2);
        c.detach(&mut src);
        c.detach(&mut src);
        assert_eq!(src.handler_count(), 0);
        assert!(!c.is_attached());

        src.dispatch(None, &InteractionEvent::Paste { at: 5 });
        assert_eq!(c.snapshot().paste_count, 0);
    }

    #[test]
    fn double_attach_registers_once() {
        let mut src = ScriptedSource::new(Viewport::new(800.0, 600.0));
        let mut c = Collector::new(CollectorConfig::default(), 0);
        c.attach(&mut src, None);
        c.attach(&mut src, None);
        assert_eq!(src.handler_count(), 2);
    }

    #[test]
    fn missing_coordinates_are_ignored() {
        let mut src = ScriptedSource::new(Viewport::new(800.0, 600.0));
        let mut c = Collector::new(CollectorConfig::default(), 0);
        c.attach(&mut src, None);
        src.dispatch(None, &InteractionEvent::PointerMove { x: None, y: Some(3.0), at: 5 });
        src.dispatch(None, &InteractionEvent::Click { x: Some(1.0), y: None, at: 6 });
        let s = c.snapshot();
        assert_eq!(s.pointer_move_count, 0);
        assert!(s.click_timestamps.is_empty());
        assert_eq!(s.request_count, 1);
    }

    #[test]
    fn empty_viewport_keeps_fallback() {
        let mut src = ScriptedSource::new(Viewport::new(0.0, 0.0));
        let mut c = Collector::new(CollectorConfig::default(), 0);
        c.attach(&mut src, None);
        assert_eq!(c.snapshot().viewport, Viewport::new(1280.0, 720.0));
    }
}
