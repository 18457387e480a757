//! Delivery of classified events to subscribers.
//!
//! The bus owns the subscriber lists and drives one read's buffer through
//! decode, classification and delivery. Listeners are invoked synchronously
//! on the caller's thread, in registration order within a category; the bus
//! never waits on a listener's outcome and a listener cannot affect delivery
//! to its peers.

use std::fmt;

use crate::config::DeliveryMode;
use crate::decode::RecordIter;
use crate::event::{Category, ClassifiedEvent};
use crate::{BatchListener, EventListener};

/// Dispatches classified events to per-category and whole-read batch
/// subscribers.
///
/// The delivery mode is chosen at construction. In per-event mode only
/// category subscribers are notified; in batch mode only batch subscribers
/// are. Events from one read are always delivered in the byte order they
/// appeared in the buffer, and unclassifiable records are dropped without
/// disturbing the order of the rest.
pub struct EventBus {
    mode: DeliveryMode,
    listeners: [Vec<Box<dyn EventListener>>; Category::COUNT],
    batch_listeners: Vec<Box<dyn BatchListener>>,
}

impl EventBus {
    /// Create a bus with no subscribers, delivering in the given mode.
    pub fn new(mode: DeliveryMode) -> Self {
        EventBus {
            mode,
            listeners: Default::default(),
            batch_listeners: Vec::new(),
        }
    }

    /// Register a listener for one category.
    ///
    /// Any number of listeners may be registered per category; each receives
    /// every event dispatched under it.
    pub fn subscribe<L: EventListener>(&mut self, category: Category, listener: L) {
        self.listeners[category.index()].push(Box::new(listener));
    }

    /// Register a listener for whole-read batches.
    pub fn subscribe_batch<L: BatchListener>(&mut self, listener: L) {
        self.batch_listeners.push(Box::new(listener));
    }

    /// The currently selected delivery mode.
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.mode
    }

    /// Switch the delivery mode.
    ///
    /// When the bus is owned by an [`Engine`](crate::Engine), use
    /// [`Engine::set_delivery_mode`](crate::Engine::set_delivery_mode)
    /// instead; the change then lands between reads.
    pub fn set_delivery_mode(&mut self, mode: DeliveryMode) {
        self.mode = mode;
    }

    /// Decode, classify and deliver one read's buffer.
    ///
    /// Records whose mask carries no recognised semantic bit produce no
    /// notification. In batch mode every batch listener receives exactly one
    /// call per buffer, with the ordered list of classified events (possibly
    /// empty when every record was dropped).
    pub fn dispatch(&mut self, buf: &[u8]) {
        match self.mode {
            DeliveryMode::PerEvent => {
                for record in RecordIter::new(buf) {
                    if let Some(event) = ClassifiedEvent::classify(record) {
                        self.deliver(&event);
                    }
                }
            }
            DeliveryMode::Batch => {
                let events: Vec<ClassifiedEvent> = RecordIter::new(buf)
                    .filter_map(ClassifiedEvent::classify)
                    .collect();
                for listener in &mut self.batch_listeners {
                    listener.handle_batch(&events);
                }
            }
        }
    }

    fn deliver(&mut self, event: &ClassifiedEvent) {
        for listener in &mut self.listeners[event.category().index()] {
            listener.handle_event(event);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("mode", &self.mode)
            .field(
                "listeners",
                &self.listeners.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .field("batch_listeners", &self.batch_listeners.len())
            .finish()
    }
}
