//! Base identity shared by settings and commands.
//!
//! A [`Variable`] only carries an id and flags. Its name lives in the
//! [`Registry`](super::Registry) so that duplicate detection and renaming stay
//! in one place.

use std::fmt::{self, Display};

/// Maximum length of a registered name, in characters.
pub const MAX_NAME_LENGTH: usize = 256;

/// Process-wide identifier of a setting or command.
///
/// Integrators declare their ids as constants:
///
/// ```
/// use bevy_runtime_vars::core::VariableId;
///
/// const UNLOAD_MODULE: VariableId = VariableId::new(1);
/// const MENU_KEYBIND: VariableId = VariableId::new(2);
/// assert_ne!(UNLOAD_MODULE, MENU_KEYBIND);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(u32);

impl VariableId {
    /// Id of the built-in `reset_setting` command.
    pub const RESET_SETTING: Self = Self(u32::MAX);

    /// Id of the built-in `toggle_setting` command.
    pub const TOGGLE_SETTING: Self = Self(u32::MAX - 1);

    /// Id of the built-in `engine_command` command.
    pub const ENGINE_COMMAND: Self = Self(u32::MAX - 2);

    /// Create an id from its raw value.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Flags controlling visibility and mutability of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariableFlags(u32);

impl VariableFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);

    /// Hidden from listings and creation logs.
    pub const HIDDEN: Self = Self(1 << 0);

    /// Value (or command) cannot be changed or invoked.
    pub const LOCKED: Self = Self(1 << 1);

    /// Check if a flag is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Combine two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags.
    #[inline]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Check if no flags are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set or clear `flag` depending on `enabled`.
    #[inline]
    pub fn set(&mut self, flag: Self, enabled: bool) {
        *self = if enabled {
            self.union(flag)
        } else {
            self.difference(flag)
        };
    }

    /// The raw bitmask.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for VariableFlags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for VariableFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Identity and flags of a setting or command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    id: VariableId,
    flags: VariableFlags,
}

impl Variable {
    /// Create a variable with no flags.
    pub const fn new(id: VariableId) -> Self {
        Self {
            id,
            flags: VariableFlags::NONE,
        }
    }

    #[inline]
    pub fn id(&self) -> VariableId {
        self.id
    }

    #[inline]
    pub fn flags(&self) -> VariableFlags {
        self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: VariableFlags) {
        self.flags = flags;
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.flags.contains(VariableFlags::LOCKED)
    }

    #[inline]
    pub fn set_locked(&mut self, locked: bool) {
        self.flags.set(VariableFlags::LOCKED, locked);
    }

    #[inline]
    pub fn set_hidden(&mut self, hidden: bool) {
        self.flags.set(VariableFlags::HIDDEN, hidden);
    }

    /// Check whether the variable is hidden.
    ///
    /// Builds with the `dev` feature report everything as visible unless
    /// `skip_dev_override` is set.
    pub fn is_hidden(&self, skip_dev_override: bool) -> bool {
        if cfg!(feature = "dev") && !skip_dev_override {
            return false;
        }
        self.flags.contains(VariableFlags::HIDDEN)
    }
}

/// Lower-case a name and cap it at [`MAX_NAME_LENGTH`] characters.
///
/// Returns the folded name and whether it had to be truncated.
pub(crate) fn fold_name(name: &str) -> (String, bool) {
    let lowered = name.trim().to_lowercase();
    match lowered.char_indices().nth(MAX_NAME_LENGTH) {
        Some((cut, _)) => (lowered[..cut].to_string(), true),
        None => (lowered, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut flags = VariableFlags::HIDDEN | VariableFlags::LOCKED;
        assert!(flags.contains(VariableFlags::HIDDEN));
        assert!(flags.contains(VariableFlags::LOCKED));

        flags.set(VariableFlags::LOCKED, false);
        assert!(!flags.contains(VariableFlags::LOCKED));
        assert!(flags.contains(VariableFlags::HIDDEN));

        flags.set(VariableFlags::HIDDEN, false);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_variable_lock_and_hide() {
        let mut var = Variable::new(VariableId::new(7));
        assert_eq!(var.id(), VariableId::new(7));
        assert!(!var.is_locked());

        var.set_locked(true);
        var.set_hidden(true);
        assert!(var.is_locked());
        assert!(var.is_hidden(true));
        assert_eq!(var.is_hidden(false), !cfg!(feature = "dev"));
    }

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("  Unload_Module "), ("unload_module".to_string(), false));

        let long = "A".repeat(MAX_NAME_LENGTH + 10);
        let (folded, truncated) = fold_name(&long);
        assert!(truncated);
        assert_eq!(folded.chars().count(), MAX_NAME_LENGTH);
    }
}
