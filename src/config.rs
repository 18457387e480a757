//! Configuration types

use crate::decode::EVENT_HEADER_SIZE;

/// Longest filename a record can carry, per the kernel's `NAME_MAX`.
pub(crate) const NAME_MAX: usize = 255;

/// Indicates whether classified events are handed to subscribers one at a
/// time or as one ordered list per read of the notification stream.
///
/// The mode is fixed when the bus is constructed. It can later be swapped
/// through [`Engine::set_delivery_mode`](crate::Engine::set_delivery_mode),
/// which takes effect between reads, never mid-drain.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum DeliveryMode {
    /// Classify and deliver each record as it is decoded, in decode order.
    /// Batch subscribers receive nothing.
    PerEvent,

    /// Decode and classify a whole read first, then hand the ordered list to
    /// every batch subscriber in one call. Per-category subscribers receive
    /// nothing.
    Batch,
}

/// Engine configuration
///
/// ```rust
/// # use inobus::Config;
/// let config = Config::default().with_event_buffer_size(8192);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Config {
    /// See [`Config::with_event_buffer_size`]
    event_buffer_size: usize,
}

impl Config {
    /// Size in bytes of the buffer one read of the notification stream is
    /// drained into.
    ///
    /// Larger buffers let one read return more queued records. Values below
    /// the size of a single maximal record are rounded up, since the kernel
    /// refuses reads that cannot fit the next event.
    ///
    /// The default holds ten maximal records.
    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size.max(EVENT_HEADER_SIZE + NAME_MAX + 1);
        self
    }

    /// Returns current setting
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            event_buffer_size: 10 * (EVENT_HEADER_SIZE + NAME_MAX + 1),
        }
    }
}
