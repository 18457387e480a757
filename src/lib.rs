//! Categorised inotify event decoding and dispatch for Linux
//!
//! This crate drains the byte stream produced by an inotify file descriptor,
//! reconstructs the packed records it carries, resolves every record's
//! bitmask to exactly one semantic [`EventKind`] under a fixed precedence
//! policy, and hands the result to subscribers grouped by [`Category`],
//! either one event at a time or as one ordered batch per read.
//!
//! The crate deliberately stays below path semantics: events carry the raw
//! watch descriptor and the entry name the kernel reported, and mapping
//! those back to paths, deduplicating or coalescing events, and reacting to
//! invalidated watches are all left to the caller.
//!
//! # Examples
//!
//! ```no_run
//! use inobus::{Category, DeliveryMode, Engine, EventBus, EventMask, Result};
//! use std::path::Path;
//!
//! fn main() -> Result<()> {
//!     let mut bus = EventBus::new(DeliveryMode::PerEvent);
//!
//!     // A listener can be a closure, a `std::sync::mpsc::Sender`, or a
//!     // `crossbeam_channel::Sender` (with the `crossbeam-channel` feature).
//!     bus.subscribe(Category::DirectoryChange, |event: &inobus::ClassifiedEvent| {
//!         println!("directory change: {event:?}");
//!     });
//!
//!     let mut engine = Engine::new(bus, |error: inobus::Error| {
//!         eprintln!("notification stream failed: {error}");
//!     })?;
//!
//!     let wd = engine.watch(Path::new("/tmp"), EventMask::ALL_EVENTS)?;
//!     // ... run the rest of the program; events arrive on the engine's
//!     // thread until the watch is removed or the engine is dropped.
//!     engine.unwatch(wd)?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]

pub use bus::EventBus;
pub use config::{Config, DeliveryMode};
pub use decode::{RawRecord, RecordIter, EVENT_HEADER_SIZE};
#[cfg(any(target_os = "linux", target_os = "android"))]
pub use engine::{Engine, WatchId};
pub use error::{Error, ErrorKind, Result};
pub use event::{Category, ClassifiedEvent, EventKind};
pub use flags::EventMask;

pub mod bus;
pub mod decode;
pub mod event;
pub mod flags;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub mod engine;

mod config;
mod error;

/// The set of requirements for per-category event listeners.
///
/// Listeners run synchronously on the dispatching thread and their outcome
/// is not observed; a slow listener delays the next notification, which is
/// the accepted trade-off of the single-threaded read loop.
///
/// # Example implementation
///
/// ```no_run
/// use inobus::{ClassifiedEvent, EventListener};
///
/// /// Prints received events
/// struct EventPrinter;
///
/// impl EventListener for EventPrinter {
///     fn handle_event(&mut self, event: &ClassifiedEvent) {
///         println!("event: {event:?}");
///     }
/// }
/// ```
pub trait EventListener: Send + 'static {
    /// Handles one classified event.
    fn handle_event(&mut self, event: &ClassifiedEvent);
}

impl<F> EventListener for F
where
    F: FnMut(&ClassifiedEvent) + Send + 'static,
{
    fn handle_event(&mut self, event: &ClassifiedEvent) {
        (self)(event);
    }
}

impl EventListener for std::sync::mpsc::Sender<ClassifiedEvent> {
    fn handle_event(&mut self, event: &ClassifiedEvent) {
        let _ = self.send(event.clone());
    }
}

#[cfg(feature = "crossbeam-channel")]
impl EventListener for crossbeam_channel::Sender<ClassifiedEvent> {
    fn handle_event(&mut self, event: &ClassifiedEvent) {
        let _ = self.send(event.clone());
    }
}

/// The set of requirements for whole-read batch listeners.
///
/// In batch delivery mode every listener receives one call per read of the
/// notification stream, with all classified events of that read in arrival
/// order.
pub trait BatchListener: Send + 'static {
    /// Handles the ordered events of one read.
    fn handle_batch(&mut self, events: &[ClassifiedEvent]);
}

impl<F> BatchListener for F
where
    F: FnMut(&[ClassifiedEvent]) + Send + 'static,
{
    fn handle_batch(&mut self, events: &[ClassifiedEvent]) {
        (self)(events);
    }
}

impl BatchListener for std::sync::mpsc::Sender<Vec<ClassifiedEvent>> {
    fn handle_batch(&mut self, events: &[ClassifiedEvent]) {
        let _ = self.send(events.to_vec());
    }
}

#[cfg(feature = "crossbeam-channel")]
impl BatchListener for crossbeam_channel::Sender<Vec<ClassifiedEvent>> {
    fn handle_batch(&mut self, events: &[ClassifiedEvent]) {
        let _ = self.send(events.to_vec());
    }
}

/// The set of requirements for the engine's terminal failure handler.
///
/// A read failure on the notification stream is fatal to the engine
/// instance: it stops reading and reports the failure here exactly once.
/// Registration failures are not reported this way; they are returned to
/// the caller of the registration call.
pub trait ErrorHandler: Send + 'static {
    /// Handles the terminal failure.
    fn handle_error(&mut self, error: Error);
}

impl<F> ErrorHandler for F
where
    F: FnMut(Error) + Send + 'static,
{
    fn handle_error(&mut self, error: Error) {
        (self)(error);
    }
}

impl ErrorHandler for std::sync::mpsc::Sender<Error> {
    fn handle_error(&mut self, error: Error) {
        let _ = self.send(error);
    }
}

#[cfg(feature = "crossbeam-channel")]
impl ErrorHandler for crossbeam_channel::Sender<Error> {
    fn handle_error(&mut self, error: Error) {
        let _ = self.send(error);
    }
}
