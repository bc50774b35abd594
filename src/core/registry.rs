//! Registry of settings and commands.
//!
//! Names are folded to lower case and must be unique across settings and
//! commands alike; ids must be unique too. Value writes go through the
//! registry so that off-thread requests are queued and every accepted change
//! is persisted.

use std::collections::HashMap;

use bevy::prelude::*;

use super::codec::{self, SettingType, SettingValue};
use super::setting::{SetChange, SettingError};
use super::variable::fold_name;
use super::{
    Command, CommandSubmitter, QueueEntry, Setting, ThreadKind, VariableId, MAX_NAME_LENGTH,
};
use crate::persist::{self, SettingsStore};

/// Outcome of a value write that was not refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetOutcome {
    /// Written now.
    Applied(SetChange),
    /// Handed to the command queue for the next tick.
    Deferred,
}

/// Central store for settings and commands.
///
/// # Examples
///
/// ```ignore
/// let queue = CommandQueue::new();
/// let mut registry = Registry::new(queue.submitter(), SettingsStore::in_memory());
///
/// registry.create_setting("cl_fov", Setting::new(FOV, SettingType::Int32, "90").range(60, 120));
/// registry.set_string_value("cl_fov", "100", ThreadKind::Main)?;
///
/// let fov: i32 = registry.setting("cl_fov").unwrap().get();
/// ```
#[derive(Resource, Debug)]
pub struct Registry {
    names: HashMap<VariableId, Box<str>>,
    settings: HashMap<Box<str>, Setting>,
    commands: HashMap<Box<str>, Command>,
    store: SettingsStore,
    submitter: CommandSubmitter,
    log_creation: bool,
}

impl Registry {
    /// Create an empty registry.
    ///
    /// Off-thread writes are pushed through `submitter`.
    pub fn new(submitter: CommandSubmitter, store: SettingsStore) -> Self {
        Self {
            names: HashMap::new(),
            settings: HashMap::new(),
            commands: HashMap::new(),
            store,
            submitter,
            log_creation: true,
        }
    }

    /// Enable or disable the creation log line.
    pub fn with_creation_log(mut self, enabled: bool) -> Self {
        self.log_creation = enabled;
        self
    }

    /// Reserve `name` for `id`.
    ///
    /// Fails if the folded name is empty, contains whitespace, is already used
    /// by any variable, or if `id` is taken. Names longer than
    /// [`MAX_NAME_LENGTH`] are truncated.
    pub fn create_variable(&mut self, name: &str, id: VariableId) -> bool {
        let (name, truncated) = fold_name(name);
        if truncated {
            warn!(
                "Variable {}: name truncated to {} characters, \"{}\"",
                id, MAX_NAME_LENGTH, name
            );
        }

        if name.is_empty() {
            error!("Variable {}: name is empty", id);
            return false;
        }

        // Console lines and settings file lines both end the name at the first space.
        if name.contains(char::is_whitespace) {
            error!("Variable {}: name \"{}\" contains whitespace", id, name);
            return false;
        }

        // Linear scan; variable counts stay in the hundreds.
        if self.names.values().any(|existing| **existing == *name) {
            error!("Variable {}: name \"{}\" is already registered", id, name);
            return false;
        }

        if let Some(existing) = self.names.get(&id) {
            error!(
                "Variable \"{}\": id {} is already registered to \"{}\"",
                name, id, existing
            );
            return false;
        }

        self.names.insert(id, name.into());
        true
    }

    /// Register a setting under `name`.
    pub fn create_setting(&mut self, name: &str, setting: Setting) -> Option<&Setting> {
        let id = setting.id();
        if !self.create_variable(name, id) {
            return None;
        }
        let key = self.names.get(&id)?.clone();

        if self.settings.contains_key(&key) {
            error!("Setting \"{}\" already exists", key);
            self.names.remove(&id);
            return None;
        }

        if self.log_creation && !setting.is_hidden(false) {
            info!("Created setting \"{}\" = \"{}\"", key, setting.get_string_value());
        }
        let stored = self.settings.entry(key).or_insert(setting);
        Some(&*stored)
    }

    /// Register a command under `name`.
    pub fn create_command(&mut self, name: &str, command: Command) -> Option<&Command> {
        let id = command.id();
        if !self.create_variable(name, id) {
            return None;
        }
        let key = self.names.get(&id)?.clone();

        if self.commands.contains_key(&key) {
            error!("Command \"{}\" already exists", key);
            self.names.remove(&id);
            return None;
        }

        if self.log_creation && !command.is_hidden(false) {
            info!("Created command \"{}\"", key);
        }
        let stored = self.commands.entry(key).or_insert(command);
        Some(&*stored)
    }

    /// The registered name of `id`.
    pub fn name_of(&self, id: VariableId) -> Option<&str> {
        self.names.get(&id).map(|name| &**name)
    }

    pub fn setting(&self, name: &str) -> Option<&Setting> {
        self.settings.get(fold_name(name).0.as_str())
    }

    pub fn setting_by_id(&self, id: VariableId) -> Option<&Setting> {
        self.settings.get(self.names.get(&id)?)
    }

    /// Mutable access for configuration: ranges, flags, description, callback.
    ///
    /// Values can only be written through the registry.
    pub fn setting_mut(&mut self, name: &str) -> Option<&mut Setting> {
        self.settings.get_mut(fold_name(name).0.as_str())
    }

    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(fold_name(name).0.as_str())
    }

    pub fn command_by_id(&self, id: VariableId) -> Option<&Command> {
        self.commands.get(self.names.get(&id)?)
    }

    pub fn command_mut(&mut self, name: &str) -> Option<&mut Command> {
        self.commands.get_mut(fold_name(name).0.as_str())
    }

    /// Check if a setting or command is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        let (name, _) = fold_name(name);
        self.settings.contains_key(name.as_str()) || self.commands.contains_key(name.as_str())
    }

    /// Number of registered settings and commands.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all settings.
    pub fn settings(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.settings.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Iterate over all commands.
    pub fn commands(&self) -> impl Iterator<Item = (&str, &Command)> {
        self.commands.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Iterate over settings with non-default values.
    pub fn modified_settings(&self) -> impl Iterator<Item = (&str, &Setting)> {
        self.settings().filter(|(_, setting)| setting.is_modified())
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    pub fn submitter(&self) -> &CommandSubmitter {
        &self.submitter
    }

    /// Write `raw` into a setting and persist.
    ///
    /// Calls from any thread other than [`ThreadKind::Main`] are queued and
    /// applied on the next tick.
    pub fn set_string_value(
        &mut self,
        name: &str,
        raw: &str,
        thread: ThreadKind,
    ) -> Result<SetOutcome, SettingError> {
        self.set_string_value_with(name, raw, thread, false)
    }

    /// [`set_string_value`](Self::set_string_value) with control over persistence.
    pub fn set_string_value_with(
        &mut self,
        name: &str,
        raw: &str,
        thread: ThreadKind,
        skip_persist: bool,
    ) -> Result<SetOutcome, SettingError> {
        let (key, _) = fold_name(name);
        let Some(setting) = self.settings.get_mut(key.as_str()) else {
            error!("Unknown setting \"{}\"", key);
            return Err(SettingError::NotFound(key));
        };

        if thread != ThreadKind::Main {
            debug!("Deferring \"{}\" = \"{}\" from the {} thread", key, raw, thread);
            self.submitter.submit(QueueEntry::internal(key, raw), thread);
            return Ok(SetOutcome::Deferred);
        }

        let result = setting.apply_string_value(raw);
        self.finish_write(&key, result, skip_persist)
    }

    /// Typed form of [`set_string_value`](Self::set_string_value).
    pub fn set_value<T: SettingValue>(
        &mut self,
        name: &str,
        value: T,
        thread: ThreadKind,
    ) -> Result<SetOutcome, SettingError> {
        self.set_string_value(name, &value.to_setting_string(), thread)
    }

    /// Write the default value back, with full validation.
    ///
    /// A default outside a range that was narrowed later is refused and the
    /// current value kept.
    pub fn reset_to_default(&mut self, name: &str, thread: ThreadKind) -> Result<SetOutcome, SettingError> {
        let default = self
            .setting(name)
            .map(|setting| setting.get_default_value().to_string())
            .ok_or_else(|| SettingError::NotFound(fold_name(name).0))?;
        self.set_string_value(name, &default, thread)
    }

    /// Write `raw` and lock the setting, only if `raw` is valid.
    ///
    /// On failure the lock state is left as it was.
    pub fn lock_with_value(&mut self, name: &str, raw: &str) -> Result<SetOutcome, SettingError> {
        let (key, _) = fold_name(name);
        let Some(setting) = self.settings.get_mut(key.as_str()) else {
            error!("Unknown setting \"{}\"", key);
            return Err(SettingError::NotFound(key));
        };
        let result = setting.apply_locked_value(raw);
        self.finish_write(&key, result, false)
    }

    fn finish_write(
        &mut self,
        key: &str,
        result: Result<SetChange, SettingError>,
        skip_persist: bool,
    ) -> Result<SetOutcome, SettingError> {
        match result {
            Ok(change) => {
                if change.truncated {
                    warn!(
                        "Setting \"{}\": value truncated to {} characters",
                        key,
                        super::MAX_VALUE_LENGTH
                    );
                }
                if !skip_persist {
                    self.write_variables();
                }
                Ok(SetOutcome::Applied(change))
            }
            Err(SettingError::Locked) => {
                debug!("Setting \"{}\" is locked, ignoring write", key);
                Err(SettingError::Locked)
            }
            Err(e) => {
                warn!("Setting \"{}\": {}", key, e);
                Err(e)
            }
        }
    }

    /// Reset a setting and log the transition.
    pub fn reset_setting(&mut self, name: &str, verbose: bool) -> bool {
        let Some(old) = self.setting(name).map(|s| s.get_string_value().to_string()) else {
            error!("Failed to reset setting \"{}\": not found", fold_name(name).0);
            return false;
        };

        let ok = self.reset_to_default(name, ThreadKind::Main).is_ok();
        if verbose {
            if let Some(setting) = self.setting(name) {
                info!(
                    "Reset \"{}\" from \"{}\" to \"{}\"",
                    fold_name(name).0,
                    old,
                    setting.get_string_value()
                );
            }
        }
        ok
    }

    /// Flip a bool setting and log the transition.
    pub fn toggle_setting(&mut self, name: &str, verbose: bool) -> bool {
        let (key, _) = fold_name(name);
        let current = match self.setting(&key) {
            Some(setting) if setting.is_type(SettingType::Bool) => setting.get::<bool>(),
            Some(_) => {
                error!("Failed to toggle \"{}\": {}", key, SettingError::NotBool(key.clone()));
                return false;
            }
            None => {
                error!("Failed to toggle \"{}\": not found", key);
                return false;
            }
        };

        let ok = self.set_value(&key, !current, ThreadKind::Main).is_ok();
        if verbose && ok {
            info!("Toggled \"{}\" from \"{}\" to \"{}\"", key, current, !current);
        }
        ok
    }

    /// Reset every setting to its default, persisting once.
    pub fn reset_all_settings(&mut self) -> usize {
        let mut reset = 0;
        for setting in self.settings.values_mut() {
            if setting.apply_default().is_ok() {
                reset += 1;
            }
        }
        self.write_variables();
        reset
    }

    /// Rewrite the whole backing store.
    ///
    /// Does nothing before the first [`parse_variables`](Self::parse_variables)
    /// has completed, or while it runs.
    pub fn write_variables(&self) -> bool {
        if !self.store.can_write() {
            debug!("Skipping settings write, store not ready");
            return false;
        }

        let mut entries: Vec<_> = self
            .settings
            .iter()
            .map(|(name, setting)| (name.as_ref(), setting.get_string_value()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

        match self.store.write(&persist::format_lines(entries)) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to save settings: {}", e);
                false
            }
        }
    }

    /// Load values from the backing store. Once a load succeeds, later calls do nothing.
    ///
    /// Each line is applied through the normal write path, so locks and ranges
    /// still hold. If the file does not exist the defaults are written out. If
    /// it exists but cannot be read, the store stays unloaded and saving stays off.
    pub fn parse_variables(&mut self) {
        if self.store.is_loaded() {
            return;
        }

        let contents = match self.store.read() {
            Ok(contents) => contents.unwrap_or_default(),
            Err(e) if e.is_not_found() => {
                info!("No settings file found, writing defaults");
                self.store.mark_loaded();
                self.write_variables();
                return;
            }
            Err(e) => {
                // Stay unloaded so the unread file is never overwritten.
                error!("Failed to load settings, saving disabled: {}", e);
                return;
            }
        };

        self.store.set_suppressed(true);
        let mut applied = 0;
        for (number, line) in persist::split_lines(&contents) {
            let Some(line) = line else {
                warn!("Skipping settings line {}: not valid UTF-8", number);
                continue;
            };
            if self.parse_line(line) {
                applied += 1;
            }
        }
        self.store.set_suppressed(false);
        self.store.mark_loaded();

        info!("Loaded {} settings", applied);
    }

    fn parse_line(&mut self, line: &str) -> bool {
        let Some((name, value)) = persist::parse_line(line) else {
            return false;
        };
        let Some(setting) = self.setting(name) else {
            warn!("Skipping unknown setting \"{}\" in settings file", name);
            return false;
        };
        if let Err(e) = codec::validate(setting.get_type(), value) {
            warn!("Skipping stored value for \"{}\": {}", name, e);
            return false;
        }
        self.set_string_value_with(name, value, ThreadKind::Main, true)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tempfile::TempDir;

    use crate::core::{Color, CommandQueue, ValueError, VariableFlags};

    const VOLUME: VariableId = VariableId::new(1);
    const ENABLED: VariableId = VariableId::new(2);
    const TINT: VariableId = VariableId::new(3);
    const GREET: VariableId = VariableId::new(4);

    fn registry() -> Registry {
        Registry::new(CommandQueue::new().submitter(), SettingsStore::in_memory())
    }

    fn volume() -> Setting {
        Setting::new(VOLUME, SettingType::Int32, "50").range(0, 100)
    }

    #[test]
    fn test_create_and_lookup() {
        let mut registry = registry();
        assert!(registry.create_setting("Sound_Volume", volume()).is_some());

        assert!(registry.contains("sound_volume"));
        assert_eq!(registry.name_of(VOLUME), Some("sound_volume"));
        assert_eq!(registry.setting("SOUND_VOLUME").unwrap().get::<i32>(), 50);
        assert_eq!(registry.setting_by_id(VOLUME).unwrap().get::<i32>(), 50);
        assert!(registry.command("sound_volume").is_none());
    }

    #[test]
    fn test_name_collision() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();
        registry.set_string_value("volume", "70", ThreadKind::Main).unwrap();

        let second = Setting::new(VariableId::new(99), SettingType::Int32, "1");
        assert!(registry.create_setting("VOLUME", second).is_none());
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 70);
        assert!(registry.name_of(VariableId::new(99)).is_none());

        // Names are shared between settings and commands.
        assert!(registry.create_command("volume", Command::new(GREET)).is_none());
    }

    #[test]
    fn test_id_collision() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();
        assert!(registry.create_command("greet", Command::new(VOLUME)).is_none());
        assert!(!registry.contains("greet"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = registry();
        assert!(!registry.create_variable("   ", VOLUME));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_whitespace_name_rejected() {
        let mut registry = registry();
        assert!(registry.create_setting("master volume", volume()).is_none());
        assert!(!registry.create_variable("tab\tname", ENABLED));
        assert!(registry.is_empty());

        // Surrounding whitespace is trimmed, not rejected.
        assert!(registry.create_variable("  volume ", VOLUME));
        assert_eq!(registry.name_of(VOLUME), Some("volume"));
    }

    #[test]
    fn test_range_enforcement() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();

        let result = registry.set_string_value("volume", "150", ThreadKind::Main);
        assert!(result.is_err());
        assert_eq!(registry.setting("volume").unwrap().get_string_value(), "50");
    }

    #[test]
    fn test_off_thread_write_is_deferred() {
        let queue = CommandQueue::new();
        let mut registry = Registry::new(queue.submitter(), SettingsStore::in_memory());
        registry.create_setting("volume", volume()).unwrap();

        let outcome = registry.set_string_value("volume", "10", ThreadKind::Render);
        assert_eq!(outcome, Ok(SetOutcome::Deferred));
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 50);
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn test_reset_and_toggle() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();
        registry.create_setting("enabled", Setting::typed(ENABLED, false)).unwrap();

        registry.set_value("volume", 20, ThreadKind::Main).unwrap();
        assert!(registry.reset_setting("volume", true));
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 50);

        assert!(registry.toggle_setting("enabled", true));
        assert!(registry.setting("enabled").unwrap().get::<bool>());
        assert!(registry.toggle_setting("ENABLED", false));
        assert!(!registry.setting("enabled").unwrap().get::<bool>());

        assert!(!registry.toggle_setting("volume", true));
        assert!(!registry.toggle_setting("missing", true));
        assert!(!registry.reset_setting("missing", true));
    }

    #[test]
    fn test_reset_idempotent() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();
        registry.set_value("volume", 90, ThreadKind::Main).unwrap();

        registry.reset_to_default("volume", ThreadKind::Main).unwrap();
        let first = registry.setting("volume").unwrap().get_string_value().to_string();
        registry.reset_to_default("volume", ThreadKind::Main).unwrap();
        assert_eq!(registry.setting("volume").unwrap().get_string_value(), first);
    }

    #[test]
    fn test_reset_after_range_narrowed_keeps_value() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();
        registry.set_value("volume", 5, ThreadKind::Main).unwrap();
        registry.setting_mut("volume").unwrap().set_range(0, 10);

        assert!(registry.reset_to_default("volume", ThreadKind::Main).is_err());
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 5);
    }

    #[test]
    fn test_lock_with_value() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();

        assert!(registry.lock_with_value("volume", "101").is_err());
        assert!(!registry.setting("volume").unwrap().is_locked());

        registry.lock_with_value("volume", "30").unwrap();
        let setting = registry.setting("volume").unwrap();
        assert!(setting.is_locked());
        assert_eq!(setting.get::<i32>(), 30);

        assert_eq!(
            registry.set_string_value("volume", "40", ThreadKind::Main),
            Err(SettingError::Locked)
        );
    }

    #[test]
    fn test_callback_fires_once_per_write() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let mut registry = registry();
        registry
            .create_setting(
                "volume",
                volume().on_change(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        registry.set_value("volume", 1, ThreadKind::Main).unwrap();
        let _ = registry.set_value("volume", 1000, ThreadKind::Main);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.cfg");

        {
            let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
            registry.create_setting("volume", volume()).unwrap();
            registry.create_setting("enabled", Setting::typed(ENABLED, false)).unwrap();
            registry.create_setting("tint", Setting::typed(TINT, Color::rgb(0, 0, 0))).unwrap();
            registry.parse_variables();
            assert!(path.exists(), "defaults are written when the file is missing");

            registry.set_value("volume", 75, ThreadKind::Main).unwrap();
            registry.set_string_value("enabled", "1", ThreadKind::Main).unwrap();
            registry.set_string_value("tint", "#00FF00", ThreadKind::Main).unwrap();
        }

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry.create_setting("enabled", Setting::typed(ENABLED, false)).unwrap();
        registry.create_setting("tint", Setting::typed(TINT, Color::rgb(0, 0, 0))).unwrap();
        registry.parse_variables();

        assert_eq!(registry.setting("volume").unwrap().get_string_value(), "75");
        assert_eq!(registry.setting("enabled").unwrap().get_string_value(), "true");
        assert_eq!(registry.setting("tint").unwrap().get_string_value(), "#00FF00FF");
    }

    #[test]
    fn test_parse_skips_invalid_and_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.cfg");
        std::fs::write(&path, "volume loud\nghost 1\nenabled true\nnovalue\n").unwrap();

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry.create_setting("enabled", Setting::typed(ENABLED, false)).unwrap();
        registry.parse_variables();

        assert_eq!(registry.setting("volume").unwrap().get_string_value(), "50");
        assert!(registry.setting("enabled").unwrap().get::<bool>());
        // Load itself does not rewrite the file.
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("ghost 1"));
    }

    #[test]
    fn test_parse_respects_range_and_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.cfg");
        std::fs::write(&path, "volume 500\nenabled true\n").unwrap();

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry
            .create_setting("enabled", Setting::typed(ENABLED, false).flags(VariableFlags::LOCKED))
            .unwrap();
        registry.parse_variables();

        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 50);
        assert!(!registry.setting("enabled").unwrap().get::<bool>());
    }

    #[test]
    fn test_no_write_before_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.cfg");
        std::fs::write(&path, "volume 80\n").unwrap();

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry.set_value("volume", 10, ThreadKind::Main).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "volume 80\n");

        registry.parse_variables();
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 80);

        // Second parse is a no-op.
        std::fs::write(&path, "volume 90\n").unwrap();
        registry.parse_variables();
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 80);
    }

    #[test]
    fn test_line_break_value_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.cfg");

        {
            let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
            registry.create_setting("volume", volume()).unwrap();
            registry.create_setting("motd", Setting::new(GREET, SettingType::String, "hi")).unwrap();
            registry.parse_variables();

            let err = registry
                .set_string_value("motd", "hello\nvolume 99", ThreadKind::Main)
                .unwrap_err();
            assert!(matches!(err, SettingError::Invalid(ValueError::LineBreak { .. })));
            assert!(registry.set_string_value("motd", "hello\r", ThreadKind::Main).is_err());
            assert_eq!(registry.setting("motd").unwrap().get_string_value(), "hi");
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "motd hi\nvolume 50\n");

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry.create_setting("motd", Setting::new(GREET, SettingType::String, "hi")).unwrap();
        registry.parse_variables();
        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 50);
        assert_eq!(registry.setting("motd").unwrap().get_string_value(), "hi");
    }

    #[test]
    fn test_parse_skips_bad_utf8_line_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.cfg");
        std::fs::write(&path, b"volume 80\nmotd caf\xe9\n").unwrap();

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry.create_setting("motd", Setting::new(GREET, SettingType::String, "hi")).unwrap();
        registry.parse_variables();

        assert_eq!(registry.setting("volume").unwrap().get::<i32>(), 80);
        assert_eq!(registry.setting("motd").unwrap().get_string_value(), "hi");

        registry.set_string_value("motd", "x", ThreadKind::Main).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "motd x\nvolume 80\n");
    }

    #[test]
    fn test_unreadable_file_keeps_saving_off() {
        let dir = TempDir::new().unwrap();
        // A directory exists at the path but cannot be read as a file.
        let path = dir.path().join("settings.cfg");
        std::fs::create_dir(&path).unwrap();

        let mut registry = Registry::new(CommandQueue::new().submitter(), SettingsStore::new(&path));
        registry.create_setting("volume", volume()).unwrap();
        registry.parse_variables();
        assert!(!registry.store().is_loaded());

        registry.set_value("volume", 10, ThreadKind::Main).unwrap();
        assert!(!registry.write_variables());
        assert!(path.is_dir());
    }

    #[test]
    fn test_reset_all_settings() {
        let mut registry = registry();
        registry.create_setting("volume", volume()).unwrap();
        registry.create_setting("enabled", Setting::typed(ENABLED, false)).unwrap();
        registry.set_value("volume", 1, ThreadKind::Main).unwrap();
        registry.set_value("enabled", true, ThreadKind::Main).unwrap();
        assert_eq!(registry.modified_settings().count(), 2);

        assert_eq!(registry.reset_all_settings(), 2);
        assert_eq!(registry.modified_settings().count(), 0);
    }
}
