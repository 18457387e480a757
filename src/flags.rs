//! Raw inotify event mask bits.
//!
//! The values are fixed by the kernel ABI and must not change; they appear
//! verbatim in every record header read from the notification stream and in
//! the mask passed to watch registration.

use bitflags::bitflags;

bitflags! {
    /// Bitmask carried in a raw record header, and accepted by
    /// [`Engine::watch`](crate::Engine::watch) to select which events a watch
    /// reports.
    ///
    /// A single record from the kernel may have several semantic bits set at
    /// once; classification resolves that to one
    /// [`EventKind`](crate::EventKind).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        /// File was accessed (read).
        const ACCESS = 0x0000_0001;

        /// File content was modified.
        const MODIFY = 0x0000_0002;

        /// Metadata changed: permissions, timestamps, ownership, link count.
        const ATTRIB = 0x0000_0004;

        /// File opened for writing was closed.
        const CLOSE_WRITE = 0x0000_0008;

        /// File not opened for writing was closed.
        const CLOSE_NOWRITE = 0x0000_0010;

        /// File was opened.
        const OPEN = 0x0000_0020;

        /// Entry was moved out of a watched directory.
        ///
        /// Paired with a `MOVED_TO` record through the cookie.
        const MOVED_FROM = 0x0000_0040;

        /// Entry was moved into a watched directory.
        const MOVED_TO = 0x0000_0080;

        /// Entry was created inside a watched directory.
        const CREATE = 0x0000_0100;

        /// Entry was deleted from a watched directory.
        const DELETE = 0x0000_0200;

        /// The watched file or directory itself was deleted.
        const DELETE_SELF = 0x0000_0400;

        /// The watched file or directory itself was moved.
        const MOVE_SELF = 0x0000_0800;

        /// Filesystem containing the watched object was unmounted.
        const UNMOUNT = 0x0000_2000;

        /// The kernel event queue overflowed and records were lost.
        const Q_OVERFLOW = 0x0000_4000;

        /// The watch was removed, explicitly or because its target went away.
        const IGNORED = 0x0000_8000;

        /// The subject of the record is a directory.
        const ISDIR = 0x4000_0000;

        /// Entry was moved out of or into a watched directory.
        const MOVE = Self::MOVED_FROM.bits() | Self::MOVED_TO.bits();

        /// File was closed, regardless of write access.
        const CLOSE = Self::CLOSE_WRITE.bits() | Self::CLOSE_NOWRITE.bits();

        /// Every semantic event a watch can report.
        const ALL_EVENTS = Self::ACCESS.bits()
            | Self::MODIFY.bits()
            | Self::ATTRIB.bits()
            | Self::CLOSE_WRITE.bits()
            | Self::CLOSE_NOWRITE.bits()
            | Self::OPEN.bits()
            | Self::MOVED_FROM.bits()
            | Self::MOVED_TO.bits()
            | Self::CREATE.bits()
            | Self::DELETE.bits()
            | Self::DELETE_SELF.bits()
            | Self::MOVE_SELF.bits();
    }
}
