//! Resolving console lines against the [`Registry`] and draining the
//! [`CommandQueue`].
//!
//! Everything here runs on the main thread with exclusive `World` access.
//! Other threads reach it only through a [`CommandSubmitter`](super::CommandSubmitter).

use std::fmt;

use bevy::prelude::*;

use super::events::{ConsoleOutputEvent, ConsoleOutputLevel, PendingOutput, SettingChangedEvent};
use super::registry::SetOutcome;
use super::tokenizer::{parse_command_line, split_commands};
use super::variable::fold_name;
use super::{CommandError, CommandQueue, QueueEntry, Registry, ThreadKind};

/// What happened to a console request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A command callback ran.
    Triggered { name: String },
    /// The command wants arguments and none were given.
    EmptyArguments { name: String },
    /// The command has no callback of the right shape.
    InvalidArguments { name: String },
    /// A setting took a new value.
    ModifiedSetting { name: String, old: String, new: String },
    /// The command or setting refused the request.
    Rejected { name: String, reason: String },
    /// A setting was named without a value.
    PrintSetting {
        name: String,
        value: String,
        description: String,
    },
    /// Nothing usable is registered under that name.
    Unrecognized { name: String },
    /// Handed to the queue for a later tick.
    Queued { name: String },
}

impl Report {
    /// Severity used when the report is shown.
    pub fn level(&self) -> ConsoleOutputLevel {
        match self {
            Report::Triggered { .. } | Report::ModifiedSetting { .. } => ConsoleOutputLevel::Success,
            Report::PrintSetting { .. } | Report::Queued { .. } => ConsoleOutputLevel::Info,
            Report::EmptyArguments { .. } | Report::InvalidArguments { .. } => ConsoleOutputLevel::Warn,
            Report::Rejected { .. } | Report::Unrecognized { .. } => ConsoleOutputLevel::Error,
        }
    }

    /// Name the request was made with.
    pub fn name(&self) -> &str {
        match self {
            Report::Triggered { name }
            | Report::EmptyArguments { name }
            | Report::InvalidArguments { name }
            | Report::ModifiedSetting { name, .. }
            | Report::Rejected { name, .. }
            | Report::PrintSetting { name, .. }
            | Report::Unrecognized { name }
            | Report::Queued { name } => name,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Triggered { name } => write!(f, "Executed \"{}\"", name),
            Report::EmptyArguments { name } => write!(f, "\"{}\" needs arguments", name),
            Report::InvalidArguments { name } => write!(f, "Invalid arguments for \"{}\"", name),
            Report::ModifiedSetting { name, old, new } => {
                write!(f, "\"{}\" changed from \"{}\" to \"{}\"", name, old, new)
            }
            Report::Rejected { name, reason } => write!(f, "Cannot apply \"{}\": {}", name, reason),
            Report::PrintSetting {
                name,
                value,
                description,
            } => {
                write!(f, "\"{}\" = \"{}\"", name, value)?;
                if !description.is_empty() {
                    write!(f, " - {}", description)?;
                }
                Ok(())
            }
            Report::Unrecognized { name } => write!(f, "Unrecognized command or setting \"{}\"", name),
            Report::Queued { name } => write!(f, "Queued \"{}\"", name),
        }
    }
}

/// Resolve `name` against the registry and act on it now.
///
/// Commands win over settings. A locked setting is treated as unknown. With
/// `internal` set a setting is always written, even with empty `args`, and no
/// report is shown.
pub fn resolve(world: &mut World, name: &str, args: &str, internal: bool) -> Report {
    let (key, _) = fold_name(name);
    let Some(registry) = world.get_resource::<Registry>() else {
        error!("No Registry resource, cannot resolve \"{}\"", key);
        return Report::Unrecognized { name: key };
    };

    // Cloned so the callback can borrow the registry itself.
    let command = registry.command(&key).cloned();
    let setting_unlocked = registry.setting(&key).map(|s| !s.is_locked());

    let report = if let Some(command) = command {
        let result = if command.has_simple_callback() && args.is_empty() {
            command.trigger(world)
        } else if command.has_args_callback() && (!args.is_empty() || !command.get_needs_args()) {
            command.trigger_with_args(args, world)
        } else if command.has_args_callback() {
            Err(CommandError::EmptyArguments)
        } else {
            Err(CommandError::Unbound)
        };

        match result {
            Ok(()) => Report::Triggered { name: key },
            Err(CommandError::EmptyArguments) => Report::EmptyArguments { name: key },
            Err(CommandError::Unbound) => Report::InvalidArguments { name: key },
            Err(e @ CommandError::Locked) => {
                warn!("Command \"{}\": {}", key, e);
                Report::Rejected {
                    name: key,
                    reason: e.to_string(),
                }
            }
        }
    } else if setting_unlocked == Some(true) {
        if args.is_empty() && !internal {
            print_setting(world, key)
        } else {
            write_setting(world, key, args)
        }
    } else {
        Report::Unrecognized { name: key }
    };

    if !internal {
        emit(world, &report);
    }
    report
}

fn print_setting(world: &World, name: String) -> Report {
    let registry = world.resource::<Registry>();
    match registry.setting(&name) {
        Some(setting) => Report::PrintSetting {
            value: setting.get_string_value().to_string(),
            description: setting.get_description().to_string(),
            name,
        },
        None => Report::Unrecognized { name },
    }
}

fn write_setting(world: &mut World, name: String, raw: &str) -> Report {
    let result = world
        .resource_mut::<Registry>()
        .set_string_value(&name, raw, ThreadKind::Main);

    match result {
        Ok(SetOutcome::Applied(change)) => {
            if let Some(mut pending) = world.get_resource_mut::<PendingOutput>() {
                pending.push_change(SettingChangedEvent::new(
                    name.as_str(),
                    change.old.as_str(),
                    change.new.as_str(),
                ));
            }
            Report::ModifiedSetting {
                name,
                old: change.old,
                new: change.new,
            }
        }
        Ok(SetOutcome::Deferred) => Report::Queued { name },
        Err(e) => Report::Rejected {
            name,
            reason: e.to_string(),
        },
    }
}

// Logged at debug so captured logs do not echo the report a second time.
fn emit(world: &mut World, report: &Report) {
    debug!("{}", report);
    if let Some(mut pending) = world.get_resource_mut::<PendingOutput>() {
        pending.push(ConsoleOutputEvent::new(report.level(), report.to_string()));
    }
}

/// Run a single request, or queue it when it comes from another thread or
/// asks for a delay.
pub fn execute_command(
    world: &mut World,
    name: &str,
    args: &str,
    thread: ThreadKind,
    delay_ticks: u32,
    internal: bool,
) -> Report {
    if thread == ThreadKind::Main && delay_ticks == 0 {
        return resolve(world, name, args, internal);
    }

    let (key, _) = fold_name(name);
    let Some(queue) = world.get_resource::<CommandQueue>() else {
        error!("No CommandQueue resource, dropping \"{}\"", key);
        return Report::Unrecognized { name: key };
    };

    let entry = if internal {
        QueueEntry::internal(key.as_str(), args)
    } else {
        QueueEntry::new(key.as_str(), args)
    };
    queue.submit(entry.with_delay(delay_ticks), thread);
    debug!("Queued \"{}\" from the {} thread, delay {}", key, thread, delay_ticks);
    Report::Queued { name: key }
}

/// Parse and run a console line. `;` separates several commands.
///
/// Lines from threads other than [`ThreadKind::Main`] are queued.
pub fn execute(world: &mut World, line: &str, thread: ThreadKind) -> Vec<Report> {
    let mut reports = Vec::new();
    for part in split_commands(line) {
        match parse_command_line(part) {
            Ok(parsed) => {
                reports.push(execute_command(world, parsed.name, parsed.args, thread, 0, false));
            }
            Err(e) => {
                warn!("Cannot parse \"{}\": {}", part, e);
                if let Some(mut pending) = world.get_resource_mut::<PendingOutput>() {
                    pending.push(ConsoleOutputEvent::error(format!("Parse error: {}", e)));
                }
            }
        }
    }
    reports
}

/// Drain the command queue. Call once per frame from the main thread.
///
/// Pending submissions join the active buffer first. Each unfinished entry
/// counts one tick against its delay and is dispatched once the delay is met.
/// Entries from a thread that may not dispatch are dropped with a warning.
pub fn tick(world: &mut World) {
    let Some(mut queue) = world.get_resource_mut::<CommandQueue>() else {
        return;
    };
    let mut active = queue.begin_tick();

    for entry in active.iter_mut().filter(|entry| !entry.is_completed()) {
        if !entry.advance() {
            continue;
        }

        if !entry.thread().is_dispatchable() {
            warn!(
                "Skipping \"{}\" submitted from the {} thread",
                entry.command(),
                entry.thread()
            );
            entry.complete();
            continue;
        }

        resolve(world, entry.command(), entry.arguments(), entry.is_internal());
        entry.complete();
    }

    world.resource_mut::<CommandQueue>().end_tick(active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Command, Setting, SettingType, VariableFlags, VariableId};
    use crate::persist::SettingsStore;

    #[derive(Resource, Default)]
    struct Calls(Vec<String>);

    const VOLUME: VariableId = VariableId::new(1);
    const SAY: VariableId = VariableId::new(2);
    const PING: VariableId = VariableId::new(3);
    const SECRET: VariableId = VariableId::new(4);

    fn world() -> World {
        let mut world = World::new();
        let queue = CommandQueue::new();
        let mut registry = Registry::new(queue.submitter(), SettingsStore::in_memory());

        registry.create_setting(
            "volume",
            Setting::new(VOLUME, SettingType::Int32, "50")
                .description("Master volume")
                .range(0, 100),
        );
        registry.create_setting(
            "secret",
            Setting::new(SECRET, SettingType::Int32, "1").flags(VariableFlags::LOCKED),
        );
        registry.create_command(
            "say",
            Command::new(SAY).on_arguments(|args, world| {
                world.resource_mut::<Calls>().0.push(args.to_string());
            }),
        );
        registry.create_command(
            "ping",
            Command::new(PING).on_trigger(|world| {
                world.resource_mut::<Calls>().0.push("pong".into());
            }),
        );

        world.insert_resource(queue);
        world.insert_resource(registry);
        world.init_resource::<PendingOutput>();
        world.init_resource::<Calls>();
        world
    }

    fn volume(world: &World) -> i32 {
        world.resource::<Registry>().setting("volume").unwrap().get()
    }

    #[test]
    fn test_resolve_commands() {
        let mut world = world();

        assert!(matches!(resolve(&mut world, "PING", "", false), Report::Triggered { .. }));
        assert!(matches!(resolve(&mut world, "ping", "x", false), Report::InvalidArguments { .. }));
        assert!(matches!(resolve(&mut world, "say", "", false), Report::EmptyArguments { .. }));
        assert!(matches!(resolve(&mut world, "say", "hi there", false), Report::Triggered { .. }));

        assert_eq!(world.resource::<Calls>().0, vec!["pong", "hi there"]);
    }

    #[test]
    fn test_resolve_settings() {
        let mut world = world();

        let report = resolve(&mut world, "volume", "", false);
        assert_eq!(
            report,
            Report::PrintSetting {
                name: "volume".into(),
                value: "50".into(),
                description: "Master volume".into(),
            }
        );

        let report = resolve(&mut world, "Volume", "70", false);
        assert_eq!(
            report,
            Report::ModifiedSetting {
                name: "volume".into(),
                old: "50".into(),
                new: "70".into(),
            }
        );

        assert!(matches!(resolve(&mut world, "volume", "700", false), Report::Rejected { .. }));
        assert_eq!(volume(&world), 70);

        let pending = world.resource::<PendingOutput>();
        assert_eq!(pending.lines().len(), 3);
        assert_eq!(pending.lines()[1].level, ConsoleOutputLevel::Success);
        assert_eq!(pending.changes.len(), 1);
    }

    #[test]
    fn test_locked_setting_is_unrecognized() {
        let mut world = world();
        assert!(matches!(resolve(&mut world, "secret", "2", false), Report::Unrecognized { .. }));
        assert!(matches!(resolve(&mut world, "nothing", "", false), Report::Unrecognized { .. }));
    }

    #[test]
    fn test_internal_is_silent() {
        let mut world = world();
        let report = resolve(&mut world, "volume", "10", true);
        assert!(matches!(report, Report::ModifiedSetting { .. }));
        assert!(world.resource::<PendingOutput>().lines().is_empty());
    }

    #[test]
    fn test_execute_line() {
        let mut world = world();
        let reports = execute(&mut world, "volume 20; say a b; ping", ThreadKind::Main);
        assert_eq!(reports.len(), 3);
        assert_eq!(volume(&world), 20);
        assert_eq!(world.resource::<Calls>().0, vec!["a b", "pong"]);
    }

    #[test]
    fn test_off_thread_execute_waits_for_tick() {
        let mut world = world();
        let reports = execute(&mut world, "volume 30", ThreadKind::Render);
        assert!(matches!(reports[0], Report::Queued { .. }));
        assert_eq!(volume(&world), 50);

        tick(&mut world);
        assert_eq!(volume(&world), 30);
        assert_eq!(world.resource::<CommandQueue>().active_len(), 0);
    }

    #[test]
    fn test_delay_honored() {
        let mut world = world();
        execute_command(&mut world, "ping", "", ThreadKind::Main, 5, false);

        for _ in 0..4 {
            tick(&mut world);
            assert!(world.resource::<Calls>().0.is_empty());
        }
        tick(&mut world);
        assert_eq!(world.resource::<Calls>().0, vec!["pong"]);

        tick(&mut world);
        assert_eq!(world.resource::<Calls>().0.len(), 1);
    }

    #[test]
    fn test_fast_entry_not_blocked_by_delayed() {
        let mut world = world();
        execute_command(&mut world, "say", "slow", ThreadKind::Main, 3, true);
        execute_command(&mut world, "say", "fast", ThreadKind::Render, 0, true);

        tick(&mut world);
        assert_eq!(world.resource::<Calls>().0, vec!["fast"]);
        // Buffer is kept until the delayed entry completes.
        assert_eq!(world.resource::<CommandQueue>().active_len(), 2);

        tick(&mut world);
        tick(&mut world);
        assert_eq!(world.resource::<Calls>().0, vec!["fast", "slow"]);
        assert_eq!(world.resource::<CommandQueue>().active_len(), 0);
    }

    #[test]
    fn test_detached_entries_skipped() {
        let mut world = world();
        world
            .resource::<CommandQueue>()
            .submit(QueueEntry::new("ping", ""), ThreadKind::Detached);

        tick(&mut world);
        assert!(world.resource::<Calls>().0.is_empty());
        assert_eq!(world.resource::<CommandQueue>().active_len(), 0);
    }

    #[test]
    fn test_registry_deferral_resolves_on_tick() {
        let mut world = world();
        let outcome = world
            .resource_mut::<Registry>()
            .set_string_value("volume", "5", ThreadKind::Render);
        assert_eq!(outcome, Ok(SetOutcome::Deferred));
        assert_eq!(volume(&world), 50);

        tick(&mut world);
        assert_eq!(volume(&world), 5);
        // Internal entries stay off the console.
        assert!(world.resource::<PendingOutput>().lines().is_empty());
    }
}
