//! Settings, commands and the machinery that drives them.
//!
//! - [`Setting`] / [`Command`] - named entries sharing a [`Variable`] identity
//! - [`Registry`] - owns every entry, handles persistence
//! - [`CommandQueue`] - cross-thread submission, drained by [`tick`]
//! - [`resolve`] / [`execute`] - the console protocol
//! - [`codec`] - string syntax of every [`SettingType`]

pub mod codec;
mod variable;
mod setting;
mod command;
mod registry;
mod queue;
mod dispatch;
mod tokenizer;
mod events;
mod console;

pub use codec::{Color, Rotator, SettingType, SettingValue, ValueError};
pub use variable::{Variable, VariableFlags, VariableId, MAX_NAME_LENGTH};
pub use setting::{SetChange, Setting, SettingCallback, SettingError, MAX_VALUE_LENGTH};
pub use command::{Command, CommandCallback, CommandError};
pub use registry::{Registry, SetOutcome};
pub use queue::{CommandQueue, CommandSubmitter, QueueEntry, ThreadKind};
pub use dispatch::{execute, execute_command, resolve, tick, Report};
pub use tokenizer::{parse_command_line, split_commands, tokenize_string, CommandLine, TokenizeError};
pub use events::{
    flush_pending_output, ConsoleEventsPlugin, ConsoleInputEvent, ConsoleOutputEvent,
    ConsoleOutputLevel, PendingOutput, SettingChangedEvent,
};
pub use console::{Variables, VariablesRef};
