//! Messages exchanged with the host.
//!
//! - Host -> engine: console lines to execute
//! - Engine -> host: output lines at one of four severities
//! - Engine -> systems: setting changes made from the console

use bevy::prelude::*;

/// A console line submitted by the host.
///
/// The line is split on `;` and each part executed on the main thread.
///
/// # Examples
///
/// ```ignore
/// fn submit_line(mut input: MessageWriter<ConsoleInputEvent>) {
///     input.write(ConsoleInputEvent::new("toggle_setting show_fps"));
/// }
/// ```
#[derive(Message, Debug, Clone)]
pub struct ConsoleInputEvent {
    /// The raw line.
    pub command: String,
}

impl ConsoleInputEvent {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

/// A line of console output.
///
/// Timestamping, coloring and writing to a file are left to whoever reads these.
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct ConsoleOutputEvent {
    /// The message text.
    pub message: String,
    /// The severity.
    pub level: ConsoleOutputLevel,
}

/// Severity of console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsoleOutputLevel {
    #[default]
    Info,
    Warn,
    Error,
    /// A command or write went through.
    Success,
}

impl ConsoleOutputEvent {
    pub fn new(level: ConsoleOutputLevel, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ConsoleOutputLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(ConsoleOutputLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ConsoleOutputLevel::Error, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ConsoleOutputLevel::Success, message)
    }
}

/// Sent when a console line changes a setting.
///
/// # Examples
///
/// ```ignore
/// fn on_fov_change(mut changes: MessageReader<SettingChangedEvent>) {
///     for change in changes.read() {
///         if &*change.name == "cl_fov" {
///             info!("FOV changed to {}", change.new_value);
///         }
///     }
/// }
/// ```
#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub struct SettingChangedEvent {
    /// Registered (lower-case) name.
    pub name: Box<str>,
    pub old_value: String,
    pub new_value: String,
}

impl SettingChangedEvent {
    pub fn new(
        name: impl Into<Box<str>>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

/// Output and change notifications produced while the `World` is borrowed
/// exclusively. Flushed into messages by a regular system.
#[derive(Resource, Debug, Default)]
pub struct PendingOutput {
    pub(crate) lines: Vec<ConsoleOutputEvent>,
    pub(crate) changes: Vec<SettingChangedEvent>,
}

impl PendingOutput {
    pub fn push(&mut self, event: ConsoleOutputEvent) {
        self.lines.push(event);
    }

    pub fn push_change(&mut self, event: SettingChangedEvent) {
        self.changes.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.changes.is_empty()
    }

    /// Lines queued so far, oldest first.
    pub fn lines(&self) -> &[ConsoleOutputEvent] {
        &self.lines
    }
}

/// Forward buffered output as messages.
pub fn flush_pending_output(
    mut pending: ResMut<PendingOutput>,
    mut output: MessageWriter<ConsoleOutputEvent>,
    mut changes: MessageWriter<SettingChangedEvent>,
) {
    for line in pending.lines.drain(..) {
        output.write(line);
    }
    for change in pending.changes.drain(..) {
        changes.write(change);
    }
}

/// Registers the console messages.
pub struct ConsoleEventsPlugin;

impl Plugin for ConsoleEventsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<ConsoleInputEvent>()
            .add_message::<ConsoleOutputEvent>()
            .add_message::<SettingChangedEvent>()
            .init_resource::<PendingOutput>();
    }
}
