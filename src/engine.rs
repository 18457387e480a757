//! The read-and-dispatch engine over an inotify file descriptor.
//!
//! The engine owns the notification channel and a dedicated thread running a
//! `mio` poll loop. When the descriptor becomes readable the loop drains it
//! one buffer at a time and pushes each buffer through the owned
//! [`EventBus`]; control requests (watch registration, delivery mode
//! changes, shutdown) arrive over an internal channel paired with a waker.
//!
//! A read failure is terminal for the engine instance: the descriptor is
//! deregistered, no further reads are attempted, and the failure is
//! reported once through the [`ErrorHandler`] the engine was constructed
//! with. Registration calls keep working after that.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use mio::unix::SourceFd;

use crate::bus::EventBus;
use crate::config::{Config, DeliveryMode};
use crate::error::{Error, ErrorKind, Result};
use crate::flags::EventMask;
use crate::ErrorHandler;

const STREAM: mio::Token = mio::Token(0);
const MESSAGE: mio::Token = mio::Token(1);

/// Opaque handle to one registered watch.
///
/// Every event produced by the watch carries the same raw descriptor, so a
/// caller that needs to tell watches apart can compare
/// [`ClassifiedEvent::wd`](crate::ClassifiedEvent::wd) against
/// [`WatchId::as_raw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(i32);

impl WatchId {
    /// The raw watch descriptor as it appears in decoded records.
    pub fn as_raw(self) -> i32 {
        self.0
    }
}

enum EventLoopMsg {
    AddWatch(PathBuf, EventMask, Sender<Result<WatchId>>),
    RemoveWatch(WatchId, Sender<Result<()>>),
    SetDeliveryMode(DeliveryMode),
    Shutdown,
}

/// Where the read loop currently stands. `Stopped` is terminal and only
/// entered on a read failure; control messages are still served there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Draining,
    Stopped,
}

// The event loop waits on a mio::Poll for two things:
//
// -  messages telling it what to do
//
// -  readability of the inotify descriptor, meaning queued records can be
//    drained.

struct EventLoop {
    running: bool,
    state: State,
    poll: mio::Poll,
    event_loop_waker: Arc<mio::Waker>,
    event_loop_tx: Sender<EventLoopMsg>,
    event_loop_rx: Receiver<EventLoopMsg>,
    stream_fd: Option<OwnedFd>,
    bus: EventBus,
    error_handler: Box<dyn ErrorHandler>,
    read_buffer: Vec<u8>,
}

/// The decoding, classification and dispatch engine.
///
/// Constructed from an [`EventBus`] carrying the subscriptions and an
/// [`ErrorHandler`] for the terminal failure signal. Dropping the engine
/// shuts the loop down and closes the notification channel, which releases
/// every kernel watch.
#[derive(Debug)]
pub struct Engine {
    channel: Sender<EventLoopMsg>,
    waker: Arc<mio::Waker>,
}

impl EventLoop {
    fn new(bus: EventBus, error_handler: Box<dyn ErrorHandler>, config: Config) -> Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(Error::io(io::Error::last_os_error()));
        }
        let stream_fd = unsafe { OwnedFd::from_raw_fd(fd) };

        let (event_loop_tx, event_loop_rx) = channel();
        let poll = mio::Poll::new()?;
        let event_loop_waker = Arc::new(mio::Waker::new(poll.registry(), MESSAGE)?);

        poll.registry().register(
            &mut SourceFd(&stream_fd.as_raw_fd()),
            STREAM,
            mio::Interest::READABLE,
        )?;

        Ok(EventLoop {
            running: true,
            state: State::Idle,
            poll,
            event_loop_waker,
            event_loop_tx,
            event_loop_rx,
            stream_fd: Some(stream_fd),
            bus,
            error_handler,
            read_buffer: vec![0; config.event_buffer_size()],
        })
    }

    // Run the event loop on its own thread.
    fn run(self) {
        let _ = thread::Builder::new()
            .name("inobus event loop".to_string())
            .spawn(|| self.event_loop_thread());
    }

    fn event_loop_thread(mut self) {
        let mut events = mio::Events::with_capacity(16);
        loop {
            // Wait for something to happen.
            match self.poll.poll(&mut events, None) {
                Err(ref e) if matches!(e.kind(), io::ErrorKind::Interrupted) => {
                    // System call was interrupted, we will retry
                }
                Err(e) => panic!("poll failed: {}", e),
                Ok(()) => {}
            }

            // Process whatever happened.
            for event in &events {
                self.handle_event(event);
            }

            // Stop, if we're done.
            if !self.running {
                break;
            }
        }
    }

    // Handle a single event.
    fn handle_event(&mut self, event: &mio::event::Event) {
        match event.token() {
            MESSAGE => {
                // The channel is readable - handle messages.
                self.handle_messages()
            }
            STREAM => {
                // The notification stream has something to tell us.
                self.handle_stream()
            }
            _ => unreachable!(),
        }
    }

    fn handle_messages(&mut self) {
        while let Ok(msg) = self.event_loop_rx.try_recv() {
            match msg {
                EventLoopMsg::AddWatch(path, mask, tx) => {
                    let _ = tx.send(self.add_watch(path, mask));
                }
                EventLoopMsg::RemoveWatch(wd, tx) => {
                    let _ = tx.send(self.remove_watch(wd));
                }
                EventLoopMsg::SetDeliveryMode(mode) => {
                    self.bus.set_delivery_mode(mode);
                }
                EventLoopMsg::Shutdown => {
                    if let Some(fd) = self.stream_fd.take() {
                        let _ = self
                            .poll
                            .registry()
                            .deregister(&mut SourceFd(&fd.as_raw_fd()));
                        // OwnedFd drop closes the descriptor, which releases
                        // every kernel watch.
                    }
                    self.running = false;
                    break;
                }
            }
        }
    }

    /// Drain the stream to completion: decode, classify and dispatch every
    /// buffer the descriptor has queued, then return to `Idle`.
    fn handle_stream(&mut self) {
        if self.state == State::Stopped {
            return;
        }
        let fd = match &self.stream_fd {
            Some(fd) => fd.as_raw_fd(),
            None => return,
        };

        self.state = State::Draining;
        loop {
            let n = unsafe {
                libc::read(
                    fd,
                    self.read_buffer.as_mut_ptr() as *mut libc::c_void,
                    self.read_buffer.len(),
                )
            };
            if n > 0 {
                let n = n as usize;
                log::trace!("drained {n} byte(s) from the notification stream");
                self.bus.dispatch(&self.read_buffer[..n]);
            } else if n == 0 {
                break;
            } else {
                let err = io::Error::last_os_error();
                match err.kind() {
                    // All queued records are drained.
                    io::ErrorKind::WouldBlock => break,
                    // The poll is level-triggered; anything left re-arms it.
                    io::ErrorKind::Interrupted => break,
                    _ => {
                        self.stop(err);
                        return;
                    }
                }
            }
        }
        self.state = State::Idle;
    }

    /// A read failure disables the notification listener for good: the
    /// descriptor is deregistered so readiness can no longer wake the loop,
    /// and the owner hears about it exactly once.
    fn stop(&mut self, err: io::Error) {
        log::warn!("error reading the notification stream: {err}");
        if let Some(fd) = &self.stream_fd {
            let _ = self
                .poll
                .registry()
                .deregister(&mut SourceFd(&fd.as_raw_fd()));
        }
        self.state = State::Stopped;
        self.error_handler.handle_error(Error::io(err));
    }

    fn add_watch(&mut self, path: PathBuf, mask: EventMask) -> Result<WatchId> {
        let fd = match &self.stream_fd {
            Some(fd) => fd.as_raw_fd(),
            None => return Err(Error::generic("notification channel is closed")),
        };
        let cpath = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            Error::generic("path contains an interior NUL byte").add_path(path.clone())
        })?;

        log::trace!("adding watch: {}", path.display());

        let wd = unsafe { libc::inotify_add_watch(fd, cpath.as_ptr(), mask.bits()) };
        if wd < 0 {
            let err = io::Error::last_os_error();
            Err(if err.raw_os_error() == Some(libc::ENOSPC) {
                // do not report inotify limits as "no more space"
                Error::new(ErrorKind::MaxFilesWatch)
            } else if err.kind() == io::ErrorKind::NotFound {
                Error::path_not_found()
            } else {
                Error::io(err)
            }
            .add_path(path))
        } else {
            Ok(WatchId(wd))
        }
    }

    fn remove_watch(&mut self, wd: WatchId) -> Result<()> {
        let fd = match &self.stream_fd {
            Some(fd) => fd.as_raw_fd(),
            None => return Err(Error::generic("notification channel is closed")),
        };

        log::trace!("removing watch: {}", wd.as_raw());

        let ret = unsafe { libc::inotify_rm_watch(fd, wd.as_raw()) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EINVAL) {
                Err(Error::watch_not_found())
            } else {
                Err(Error::io(err))
            }
        } else {
            Ok(())
        }
    }
}

impl Engine {
    /// Create an engine over a fresh notification channel, with the default
    /// configuration.
    ///
    /// The bus carries the subscriptions events will be delivered to; the
    /// error handler receives the terminal failure signal if the stream
    /// ever fails to read.
    pub fn new<E: ErrorHandler>(bus: EventBus, error_handler: E) -> Result<Self> {
        Self::with_config(bus, error_handler, Config::default())
    }

    /// Create an engine with an explicit [`Config`].
    pub fn with_config<E: ErrorHandler>(
        bus: EventBus,
        error_handler: E,
        config: Config,
    ) -> Result<Self> {
        let event_loop = EventLoop::new(bus, Box::new(error_handler), config)?;
        let channel = event_loop.event_loop_tx.clone();
        let waker = event_loop.event_loop_waker.clone();
        event_loop.run();
        Ok(Engine { channel, waker })
    }

    /// Begin watching a path.
    ///
    /// `mask` selects which events the watch reports; pass
    /// [`EventMask::ALL_EVENTS`] for everything. Watching the same path
    /// again replaces the previous mask and returns the same id.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::PathNotFound`] when the path does not exist,
    /// [`ErrorKind::MaxFilesWatch`] when the per-user watch limit is
    /// reached, [`ErrorKind::Io`] otherwise.
    pub fn watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchId> {
        let (tx, rx) = channel();
        self.channel
            .send(EventLoopMsg::AddWatch(path.to_owned(), mask, tx))?;
        self.waker.wake()?;
        rx.recv()?
    }

    /// Stop watching.
    ///
    /// Records already queued on the stream for this watch are still
    /// decoded and dispatched; the kernel follows up with a final
    /// [`EventKind::Ignored`](crate::EventKind::Ignored) event for the
    /// watch.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::WatchNotFound`] when the watch does not exist (e.g.
    /// removed twice).
    pub fn unwatch(&mut self, wd: WatchId) -> Result<()> {
        let (tx, rx) = channel();
        self.channel.send(EventLoopMsg::RemoveWatch(wd, tx))?;
        self.waker.wake()?;
        rx.recv()?
    }

    /// Switch the owned bus between per-event and batch delivery.
    ///
    /// The change is applied between reads; a buffer currently being
    /// drained is finished in the old mode.
    pub fn set_delivery_mode(&mut self, mode: DeliveryMode) -> Result<()> {
        self.channel.send(EventLoopMsg::SetDeliveryMode(mode))?;
        self.waker.wake()?;
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // we expect the event loop to live => unwrap must not panic
        self.channel.send(EventLoopMsg::Shutdown).unwrap();
        self.waker.wake().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeliveryMode;

    #[test]
    fn engine_is_send() {
        fn check<T: Send>() {}
        check::<Engine>();
    }

    #[test]
    fn native_error_type_on_missing_path() {
        let mut engine = Engine::new(EventBus::new(DeliveryMode::PerEvent), |_: Error| {}).unwrap();

        let result = engine.watch(
            Path::new("/some/non/existent/path"),
            EventMask::ALL_EVENTS,
        );

        assert!(matches!(
            result,
            Err(Error {
                paths: _,
                kind: ErrorKind::PathNotFound
            })
        ))
    }
}
