//! System parameters over the [`Registry`] and [`CommandQueue`].

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use super::registry::SetOutcome;
use super::{
    Command, CommandQueue, CommandSubmitter, QueueEntry, Registry, Setting, SettingError,
    SettingValue, ThreadKind,
};

/// Read-write access for regular systems.
///
/// Systems run on the main thread, so writes made here apply immediately.
/// Commands need the whole `World`, so they are queued for the next
/// [`tick`](super::tick).
///
/// # Examples
///
/// ```ignore
/// const SHOW_FPS: VariableId = VariableId::new(1);
///
/// fn setup(mut vars: Variables) {
///     vars.create_setting("show_fps", Setting::typed(SHOW_FPS, false).description("Draw the FPS counter"));
/// }
///
/// fn hud(vars: VariablesRef) {
///     if vars.get::<bool>("show_fps").unwrap_or_default() {
///         // ...
///     }
/// }
/// ```
#[derive(SystemParam)]
pub struct Variables<'w> {
    registry: ResMut<'w, Registry>,
    queue: Res<'w, CommandQueue>,
}

impl Variables<'_> {
    /// Register a setting. Returns `false` on a name or id collision.
    pub fn create_setting(&mut self, name: &str, setting: Setting) -> bool {
        self.registry.create_setting(name, setting).is_some()
    }

    /// Register a command. Returns `false` on a name or id collision.
    pub fn create_command(&mut self, name: &str, command: Command) -> bool {
        self.registry.create_command(name, command).is_some()
    }

    /// Typed value of a setting.
    pub fn get<T: SettingValue>(&self, name: &str) -> Option<T> {
        self.registry.setting(name).map(|setting| setting.get::<T>())
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.registry.setting(name).map(Setting::get_string_value)
    }

    pub fn set<T: SettingValue>(&mut self, name: &str, value: T) -> Result<SetOutcome, SettingError> {
        self.registry.set_value(name, value, ThreadKind::Main)
    }

    pub fn set_string(&mut self, name: &str, raw: &str) -> Result<SetOutcome, SettingError> {
        self.registry.set_string_value(name, raw, ThreadKind::Main)
    }

    pub fn reset(&mut self, name: &str) -> bool {
        self.registry.reset_setting(name, false)
    }

    pub fn toggle(&mut self, name: &str) -> bool {
        self.registry.toggle_setting(name, false)
    }

    /// Queue a command or setting write for a later tick.
    pub fn queue(&self, name: &str, args: &str, delay_ticks: u32) {
        self.queue.submit(
            QueueEntry::new(name, args).with_delay(delay_ticks),
            ThreadKind::Main,
        );
    }

    /// A handle for handing to other threads.
    pub fn submitter(&self) -> CommandSubmitter {
        self.queue.submitter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access for anything not covered above.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

/// Read-only access.
///
/// Lets the scheduler run readers in parallel.
#[derive(SystemParam)]
pub struct VariablesRef<'w> {
    registry: Res<'w, Registry>,
}

impl VariablesRef<'_> {
    pub fn get<T: SettingValue>(&self, name: &str) -> Option<T> {
        self.registry.setting(name).map(|setting| setting.get::<T>())
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.registry.setting(name).map(Setting::get_string_value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Iterate over settings not at their default.
    pub fn modified_settings(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.registry.modified_settings()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
