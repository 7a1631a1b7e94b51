//! Notifications published by the text surface.
//!
//! Everything runs on the UI thread, so the bus is a plain synchronous
//! observer list: `emit` calls every listener before returning. Listeners
//! must not call back into the surface that emitted the event; the gutter
//! only queues what it hears and acts on it during synchronisation.

use std::fmt;

use crate::paint::Rect;

/// Something the gutter (or any other observer) needs to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The caret moved to a different line. Never sent for column-only moves.
    CaretLineChanged { previous: usize, current: usize },

    /// Geometry or content changed in a way that affects what is painted.
    GeometryInvalidated(Invalidation),
}

/// What kind of geometry change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// Content scrolled vertically by `dy` pixels (negative: content moved up).
    Scrolled { dy: i32 },

    /// Content changed inside this widget-space rectangle without changing
    /// the line count.
    Region(Rect),

    /// The total number of lines changed.
    LineCountChanged(usize),

    /// The widget was resized.
    Resized { width: i32, height: i32 },

    /// Line heights changed wholesale (font metrics, soft wrap).
    Reflowed,
}

impl Invalidation {
    /// Whether this change can alter the gutter width or the text area's
    /// left margin.
    pub fn affects_width(&self) -> bool {
        matches!(
            self,
            Invalidation::LineCountChanged(_) | Invalidation::Resized { .. } | Invalidation::Reflowed
        )
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SurfaceEvent)>;

/// Synchronous publish/subscribe for [`SurfaceEvent`]s.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It is called for every event emitted from now on.
    pub fn subscribe(&mut self, listener: impl FnMut(&SurfaceEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Delivers `event` to every listener, in subscription order.
    pub fn emit(&mut self, event: SurfaceEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
