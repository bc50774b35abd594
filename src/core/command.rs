//! Named actions invoked from the console or programmatically.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;
use thiserror::Error;

use super::{Variable, VariableFlags, VariableId};

/// Handler bound to a [`Command`].
///
/// Handlers receive the `World` so they can reach the [`Registry`](super::Registry)
/// and any other resource.
#[derive(Clone, Default)]
pub enum CommandCallback {
    #[default]
    None,
    /// Takes no arguments.
    Simple(Arc<dyn Fn(&mut World) + Send + Sync>),
    /// Takes the raw argument text.
    WithArgs(Arc<dyn Fn(&str, &mut World) + Send + Sync>),
}

impl fmt::Debug for CommandCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandCallback::None => "None",
            CommandCallback::Simple(_) => "Simple",
            CommandCallback::WithArgs(_) => "WithArgs",
        })
    }
}

/// Why a command did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command is locked")]
    Locked,

    #[error("no matching callback is bound")]
    Unbound,

    #[error("command needs arguments")]
    EmptyArguments,
}

/// A console command.
///
/// # Examples
///
/// ```ignore
/// let unload = Command::new(UNLOAD_MODULE)
///     .description("Unload the module")
///     .on_trigger(|world| {
///         world.resource_mut::<ModuleState>().unload_requested = true;
///     });
///
/// let say = Command::new(SAY)
///     .description("Print text to the console")
///     .on_arguments(|args, _world| info!("{}", args));
/// ```
#[derive(Clone)]
pub struct Command {
    variable: Variable,
    description: Box<str>,
    needs_args: bool,
    callback: CommandCallback,
}

impl Command {
    /// Create an unbound command. Commands need arguments unless told otherwise.
    pub fn new(id: VariableId) -> Self {
        Self {
            variable: Variable::new(id),
            description: "".into(),
            needs_args: true,
            callback: CommandCallback::None,
        }
    }

    /// Set the description.
    pub fn description(mut self, desc: impl Into<Box<str>>) -> Self {
        self.description = desc.into();
        self
    }

    /// Set the flags.
    pub fn flags(mut self, flags: VariableFlags) -> Self {
        self.variable.set_flags(flags);
        self
    }

    /// Allow the argument callback to run with empty arguments.
    pub fn needs_args(mut self, needs_args: bool) -> Self {
        self.needs_args = needs_args;
        self
    }

    /// Bind a no-argument handler.
    pub fn on_trigger<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut World) + Send + Sync + 'static,
    {
        self.callback = CommandCallback::Simple(Arc::new(f));
        self
    }

    /// Bind an argument handler.
    pub fn on_arguments<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &mut World) + Send + Sync + 'static,
    {
        self.callback = CommandCallback::WithArgs(Arc::new(f));
        self
    }

    #[inline]
    pub fn id(&self) -> VariableId {
        self.variable.id()
    }

    #[inline]
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    #[inline]
    pub fn get_description(&self) -> &str {
        &self.description
    }

    #[inline]
    pub fn get_callback(&self) -> &CommandCallback {
        &self.callback
    }

    #[inline]
    pub fn has_simple_callback(&self) -> bool {
        matches!(self.callback, CommandCallback::Simple(_))
    }

    #[inline]
    pub fn has_args_callback(&self) -> bool {
        matches!(self.callback, CommandCallback::WithArgs(_))
    }

    #[inline]
    pub fn get_needs_args(&self) -> bool {
        self.needs_args
    }

    pub fn set_needs_args(&mut self, needs_args: bool) -> &mut Self {
        self.needs_args = needs_args;
        self
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.variable.is_locked()
    }

    pub fn set_locked(&mut self, locked: bool) -> &mut Self {
        self.variable.set_locked(locked);
        self
    }

    #[inline]
    pub fn is_hidden(&self, skip_dev_override: bool) -> bool {
        self.variable.is_hidden(skip_dev_override)
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        self.variable.set_hidden(hidden);
        self
    }

    /// Run the no-argument handler.
    pub fn trigger(&self, world: &mut World) -> Result<(), CommandError> {
        if self.is_locked() {
            return Err(CommandError::Locked);
        }
        match &self.callback {
            CommandCallback::Simple(f) => {
                f(world);
                Ok(())
            }
            _ => Err(CommandError::Unbound),
        }
    }

    /// Run the argument handler.
    ///
    /// Empty `args` are refused while [`get_needs_args`](Self::get_needs_args) is set.
    pub fn trigger_with_args(&self, args: &str, world: &mut World) -> Result<(), CommandError> {
        if self.is_locked() {
            return Err(CommandError::Locked);
        }
        match &self.callback {
            CommandCallback::WithArgs(_) if self.needs_args && args.is_empty() => {
                Err(CommandError::EmptyArguments)
            }
            CommandCallback::WithArgs(f) => {
                f(args, world);
                Ok(())
            }
            _ => Err(CommandError::Unbound),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id())
            .field("description", &self.description)
            .field("needs_args", &self.needs_args)
            .field("callback", &self.callback)
            .finish()
    }
}
