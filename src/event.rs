//! The classified event model: `EventKind`, `Category` and
//! `ClassifiedEvent`.
//!
//! A raw record's mask can legitimately set more than one semantic bit at
//! once. Classification resolves that to exactly one kind by testing bits in
//! a fixed precedence order, first match wins; the remaining bits are
//! discarded. The order is part of the public contract and must not be
//! rearranged.

use std::ffi::OsString;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::decode::RawRecord;
use crate::flags::EventMask;

/// The canonical kind of a classified event, always exactly one value even
/// when the raw mask combined several semantic bits.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EventKind {
    /// An entry was moved out of a watched directory.
    MovedFrom,

    /// An entry was moved into a watched directory.
    MovedTo,

    /// An entry was deleted from a watched directory.
    Delete,

    /// An entry was created inside a watched directory.
    Create,

    /// Metadata of the watched object or an entry changed.
    Attrib,

    /// File content was modified.
    Modify,

    /// The watched object itself was moved.
    MoveSelf,

    /// The watched object itself was deleted.
    DeleteSelf,

    /// A file opened for writing was closed.
    CloseWrite,

    /// A file not opened for writing was closed.
    CloseNoWrite,

    /// A file was opened.
    Open,

    /// A file was accessed.
    Access,

    /// The filesystem containing the watched object was unmounted.
    Unmount,

    /// The kernel event queue overflowed; records were lost.
    QueueOverflow,

    /// The watch was removed and will report nothing further.
    Ignored,
}

/// The four disjoint groupings events are dispatched under.
///
/// The set is closed; subscriber slots for each category are laid out at
/// construction time, there is no runtime category registration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Category {
    /// Creation, deletion or movement of an entry inside a watched
    /// directory.
    DirectoryChange,

    /// A change to the watched object itself: metadata, content, a
    /// self-move or self-delete.
    SelfOrAttributeChange,

    /// Non-mutating activity: open, read access, close.
    AccessOrClose,

    /// Stream housekeeping: unmount, queue overflow, watch removal.
    Informational,
}

impl Category {
    /// Number of categories; sizes the bus's subscriber table.
    pub(crate) const COUNT: usize = 4;

    pub(crate) fn index(self) -> usize {
        match self {
            Category::DirectoryChange => 0,
            Category::SelfOrAttributeChange => 1,
            Category::AccessOrClose => 2,
            Category::Informational => 3,
        }
    }
}

impl EventKind {
    /// Resolve a raw mask to one canonical kind.
    ///
    /// Bits are tested in a fixed precedence order and the first match wins;
    /// any further semantic bits in the mask are dropped. A mask with no
    /// recognised semantic bit yields `None`: the kernel can emit
    /// implementation-defined bits outside the documented set, and those
    /// records produce no event at all.
    pub fn from_mask(mask: EventMask) -> Option<EventKind> {
        if mask.contains(EventMask::MOVED_FROM) {
            Some(EventKind::MovedFrom)
        } else if mask.contains(EventMask::MOVED_TO) {
            Some(EventKind::MovedTo)
        } else if mask.contains(EventMask::DELETE) {
            Some(EventKind::Delete)
        } else if mask.contains(EventMask::CREATE) {
            Some(EventKind::Create)
        } else if mask.contains(EventMask::ATTRIB) {
            Some(EventKind::Attrib)
        } else if mask.contains(EventMask::MODIFY) {
            Some(EventKind::Modify)
        } else if mask.contains(EventMask::MOVE_SELF) {
            Some(EventKind::MoveSelf)
        } else if mask.contains(EventMask::DELETE_SELF) {
            Some(EventKind::DeleteSelf)
        } else if mask.contains(EventMask::CLOSE_WRITE) {
            Some(EventKind::CloseWrite)
        } else if mask.contains(EventMask::CLOSE_NOWRITE) {
            Some(EventKind::CloseNoWrite)
        } else if mask.contains(EventMask::OPEN) {
            Some(EventKind::Open)
        } else if mask.contains(EventMask::ACCESS) {
            Some(EventKind::Access)
        } else if mask.contains(EventMask::UNMOUNT) {
            Some(EventKind::Unmount)
        } else if mask.contains(EventMask::Q_OVERFLOW) {
            Some(EventKind::QueueOverflow)
        } else if mask.contains(EventMask::IGNORED) {
            Some(EventKind::Ignored)
        } else {
            None
        }
    }

    /// The category this kind is dispatched under.
    pub fn category(self) -> Category {
        match self {
            EventKind::MovedFrom | EventKind::MovedTo | EventKind::Delete | EventKind::Create => {
                Category::DirectoryChange
            }
            EventKind::Attrib
            | EventKind::Modify
            | EventKind::MoveSelf
            | EventKind::DeleteSelf => Category::SelfOrAttributeChange,
            EventKind::CloseWrite
            | EventKind::CloseNoWrite
            | EventKind::Open
            | EventKind::Access => Category::AccessOrClose,
            EventKind::Unmount | EventKind::QueueOverflow | EventKind::Ignored => {
                Category::Informational
            }
        }
    }
}

/// A fully classified notification, ready for dispatch.
///
/// Owned by the bus for the duration of one dispatch call; nothing retains
/// events across reads.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassifiedEvent {
    /// Watch descriptor of the watch that produced the event.
    pub wd: i32,

    /// The single canonical kind resolved from the raw mask.
    pub kind: EventKind,

    /// Whether the subject of the event is a directory. Derived from the
    /// directory flag independently of which kind won classification.
    pub is_dir: bool,

    /// Correlates the two halves of a rename; `0` everywhere else.
    pub cookie: u32,

    /// Name of the affected directory entry, absent when the event concerns
    /// the watched object itself.
    pub name: Option<OsString>,
}

impl ClassifiedEvent {
    /// Classify one raw record, or `None` when its mask carries no
    /// recognised semantic bit (the record is then dropped silently, which
    /// is not an error).
    pub fn classify(record: RawRecord) -> Option<ClassifiedEvent> {
        let kind = EventKind::from_mask(record.mask)?;
        Some(ClassifiedEvent {
            wd: record.wd,
            kind,
            is_dir: record.mask.contains(EventMask::ISDIR),
            cookie: record.cookie,
            name: record.name,
        })
    }

    /// The category this event is dispatched under.
    pub fn category(&self) -> Category {
        self.kind.category()
    }
}
