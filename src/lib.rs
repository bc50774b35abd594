//! Typed, persisted settings and a deferred command queue for Bevy apps.
//!
//! - **Setting**: a named, typed value with an optional range, saved to a flat file
//! - **Command**: a named action, optionally taking argument text
//! - **Registry**: owns both, keyed by lower-case name and by [`VariableId`]
//! - **CommandQueue**: lets any thread request work that runs on the next tick
//!
//! # Features
//!
//! - `log-capture` (default): forward log records into [`ConsoleOutputEvent`]s
//! - `dev`: hidden settings and commands are treated as visible
//!
//! # Quick Start
//!
//! ```ignore
//! use bevy::prelude::*;
//! use bevy_runtime_vars::prelude::*;
//!
//! const SHOW_FPS: VariableId = VariableId::new(1);
//! const FOV: VariableId = VariableId::new(2);
//! const UNLOAD: VariableId = VariableId::new(3);
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(VariablesPlugin::default())
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut vars: Variables) {
//!     vars.create_setting("show_fps", Setting::typed(SHOW_FPS, true));
//!     vars.create_setting("cl_fov", Setting::typed(FOV, 90).range(60, 120));
//!     vars.create_command(
//!         "unload",
//!         Command::new(UNLOAD).on_trigger(|_world| info!("Unloading")),
//!     );
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod persist;

#[cfg(feature = "log-capture")]
pub mod logging;

pub use config::{ConfigError, FrameworkConfig};
pub use crate::core::{
    Color, Command, CommandCallback, CommandError, CommandQueue, CommandSubmitter,
    ConsoleEventsPlugin, ConsoleInputEvent, ConsoleOutputEvent, ConsoleOutputLevel, QueueEntry,
    Registry, Report, Rotator, SetChange, SetOutcome, Setting, SettingCallback,
    SettingChangedEvent, SettingError, SettingType, SettingValue, ThreadKind, ValueError,
    Variable, VariableFlags, VariableId, Variables, VariablesRef,
};
pub use persist::{SettingsStore, StoreError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::core::{
        Color, Command, CommandQueue, CommandSubmitter, ConsoleInputEvent, ConsoleOutputEvent,
        ConsoleOutputLevel, QueueEntry, Registry, Rotator, Setting, SettingChangedEvent,
        SettingType, ThreadKind, VariableFlags, VariableId, Variables, VariablesRef,
    };
    pub use crate::{EngineCommandHook, FrameworkConfig, VariablesPlugin};
}

/// Installs the registry, the command queue and the per-frame systems.
///
/// Settings read from disk in `PostStartup`, so register them in `Startup`.
///
/// ```ignore
/// App::new().add_plugins(VariablesPlugin::from_config_file("framework.ron"));
/// ```
#[derive(Default)]
pub struct VariablesPlugin {
    config: FrameworkConfig,
}

impl VariablesPlugin {
    pub fn with_config(config: FrameworkConfig) -> Self {
        Self { config }
    }

    /// Read the config from a RON file, or use defaults if that fails.
    pub fn from_config_file(path: impl AsRef<Path>) -> Self {
        Self::with_config(FrameworkConfig::load_or_default(path))
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }
}

impl Plugin for VariablesPlugin {
    fn build(&self, app: &mut App) {
        let queue = CommandQueue::new();
        let registry = Registry::new(
            queue.submitter(),
            SettingsStore::new(&self.config.settings_file),
        )
        .with_creation_log(self.config.log_creation);

        app.insert_resource(queue)
            .insert_resource(registry)
            .insert_resource(self.config.clone())
            .init_resource::<PendingInput>()
            .add_plugins(ConsoleEventsPlugin);

        app.add_systems(Startup, register_builtin_commands)
            .add_systems(PostStartup, load_settings);

        // 1. collect_console_input: read input messages
        // 2. execute_console_input: run them with exclusive World access
        // 3. tick: drain the command queue
        // 4. flush_pending_output: send output and change messages
        app.add_systems(
            Update,
            (
                collect_console_input,
                execute_console_input,
                crate::core::tick,
                crate::core::flush_pending_output,
            )
                .chain(),
        );
    }
}

/// Host-provided executor for `engine_command`.
///
/// ```ignore
/// app.insert_resource(EngineCommandHook::new(|text, _world| {
///     engine.exec(text);
/// }));
/// ```
#[derive(Resource, Clone)]
pub struct EngineCommandHook(Arc<dyn Fn(&str, &mut World) + Send + Sync>);

impl EngineCommandHook {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, &mut World) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn run(&self, text: &str, world: &mut World) {
        (self.0)(text, world)
    }
}

fn first_argument(args: &str) -> Option<&str> {
    crate::core::tokenize_string(args).ok()?.into_iter().next()
}

/// Register `reset_setting`, `toggle_setting` and `engine_command`.
fn register_builtin_commands(mut registry: ResMut<Registry>) {
    registry.create_command(
        "reset_setting",
        Command::new(VariableId::RESET_SETTING)
            .description("Reset a setting to its default value")
            .on_arguments(|args, world| match first_argument(args) {
                Some(name) => {
                    world.resource_mut::<Registry>().reset_setting(name, true);
                }
                None => warn!("Usage: reset_setting <name>"),
            }),
    );

    registry.create_command(
        "toggle_setting",
        Command::new(VariableId::TOGGLE_SETTING)
            .description("Flip a boolean setting")
            .on_arguments(|args, world| match first_argument(args) {
                Some(name) => {
                    world.resource_mut::<Registry>().toggle_setting(name, true);
                }
                None => warn!("Usage: toggle_setting <name>"),
            }),
    );

    registry.create_command(
        "engine_command",
        Command::new(VariableId::ENGINE_COMMAND)
            .description("Pass raw text to the host engine")
            .on_arguments(|args, world| {
                let Some(hook) = world.get_resource::<EngineCommandHook>().cloned() else {
                    warn!("No engine command hook installed, dropping \"{}\"", args);
                    return;
                };
                hook.run(args, world);
            }),
    );
}

fn load_settings(mut registry: ResMut<Registry>) {
    registry.parse_variables();
}

/// Console lines waiting for [`execute_console_input`].
#[derive(Resource, Default)]
struct PendingInput(Vec<String>);

fn collect_console_input(
    mut input: MessageReader<ConsoleInputEvent>,
    mut pending: ResMut<PendingInput>,
) {
    pending
        .0
        .extend(input.read().map(|event| event.command.clone()));
}

fn execute_console_input(world: &mut World) {
    let lines = std::mem::take(&mut world.resource_mut::<PendingInput>().0);
    for line in lines {
        crate::core::execute(world, &line, ThreadKind::Main);
    }
}
