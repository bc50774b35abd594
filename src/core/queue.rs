//! Deferred command execution.
//!
//! Requests made off the main thread, or with a delay, are recorded as
//! [`QueueEntry`]s. Any thread may push entries through a [`CommandSubmitter`];
//! the main thread drains them once per frame in [`tick`](super::tick).
//!
//! Delays are counted in ticks, not wall-clock time, so deferred work follows the
//! host's frame rate.

use std::fmt::{self, Display};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bevy::prelude::*;

/// Thread a request originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThreadKind {
    /// The host's update loop. Settings and commands are only touched here.
    #[default]
    Main,
    /// The render/UI thread.
    Render,
    /// Any thread the host does not drive.
    Detached,
}

impl ThreadKind {
    /// Whether entries submitted from this thread may be dispatched.
    #[inline]
    pub fn is_dispatchable(self) -> bool {
        matches!(self, ThreadKind::Main | ThreadKind::Render)
    }
}

impl Display for ThreadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThreadKind::Main => "main",
            ThreadKind::Render => "render",
            ThreadKind::Detached => "detached",
        })
    }
}

/// A command or setting write waiting for the main thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    command: String,
    arguments: String,
    thread: ThreadKind,
    internal: bool,
    delay_ticks: u32,
    elapsed_ticks: u32,
    completed: bool,
}

impl QueueEntry {
    /// A user-facing request; its outcome is reported to the console.
    pub fn new(command: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arguments: arguments.into(),
            thread: ThreadKind::Main,
            internal: false,
            delay_ticks: 0,
            elapsed_ticks: 0,
            completed: false,
        }
    }

    /// A programmatic request; its outcome is not reported.
    pub fn internal(command: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            internal: true,
            ..Self::new(command, arguments)
        }
    }

    /// Wait `ticks` frames before dispatching.
    pub fn with_delay(mut self, ticks: u32) -> Self {
        self.delay_ticks = ticks;
        self
    }

    #[inline]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[inline]
    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    #[inline]
    pub fn thread(&self) -> ThreadKind {
        self.thread
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    #[inline]
    pub fn delay_ticks(&self) -> u32 {
        self.delay_ticks
    }

    #[inline]
    pub fn elapsed_ticks(&self) -> u32 {
        self.elapsed_ticks
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Count one tick and report whether the entry may dispatch now.
    ///
    /// Once the delay is met it is cleared and never re-armed.
    pub(crate) fn advance(&mut self) -> bool {
        if self.delay_ticks == 0 {
            return true;
        }
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.elapsed_ticks >= self.delay_ticks {
            self.delay_ticks = 0;
            true
        } else {
            false
        }
    }

    pub(crate) fn complete(&mut self) {
        self.completed = true;
    }
}

/// Cloneable handle that pushes entries into the pending buffer.
///
/// Safe to use from any thread.
#[derive(Clone, Default)]
pub struct CommandSubmitter {
    pending: Arc<Mutex<Vec<QueueEntry>>>,
}

impl CommandSubmitter {
    fn lock(&self) -> MutexGuard<'_, Vec<QueueEntry>> {
        // Pushes cannot leave the buffer half-written.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tag `entry` with `thread` and append it to the pending buffer.
    pub fn submit(&self, mut entry: QueueEntry, thread: ThreadKind) {
        entry.thread = thread;
        self.lock().push(entry);
    }

    /// Number of entries waiting for the next tick.
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    fn take_pending(&self) -> Vec<QueueEntry> {
        std::mem::take(&mut *self.lock())
    }
}

impl fmt::Debug for CommandSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSubmitter")
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Two-stage queue drained by [`tick`](super::tick).
///
/// Entries move from the shared pending buffer into the active buffer at the
/// start of a tick. The active buffer is only cleared once every entry in it
/// has completed.
#[derive(Resource, Debug, Default)]
pub struct CommandQueue {
    submitter: CommandSubmitter,
    active: Vec<QueueEntry>,
    ticks: u64,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle for other threads and for the [`Registry`](super::Registry).
    pub fn submitter(&self) -> CommandSubmitter {
        self.submitter.clone()
    }

    /// Shorthand for `self.submitter().submit(entry, thread)`.
    pub fn submit(&self, entry: QueueEntry, thread: ThreadKind) {
        self.submitter.submit(entry, thread);
    }

    pub fn pending_len(&self) -> usize {
        self.submitter.pending_len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Iterate over the active buffer.
    pub fn active(&self) -> impl Iterator<Item = &QueueEntry> {
        self.active.iter()
    }

    /// Move pending entries behind the active ones and hand the buffer out.
    pub(crate) fn begin_tick(&mut self) -> Vec<QueueEntry> {
        let mut active = std::mem::take(&mut self.active);
        active.extend(self.submitter.take_pending());
        active
    }

    /// Put the buffer back, or drop it whole if everything completed.
    pub(crate) fn end_tick(&mut self, mut active: Vec<QueueEntry>) {
        if active.iter().all(QueueEntry::is_completed) {
            active.clear();
        }
        self.active = active;
        self.ticks += 1;
    }
}
