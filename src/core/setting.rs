//! Typed, range-checked, persisted values.
//!
//! A [`Setting`] stores its value as a canonical string (see [`codec`](super::codec))
//! and exposes typed access through [`SettingValue`]. Value writes go through the
//! [`Registry`](super::Registry), which routes off-thread requests to the command
//! queue and persists after every accepted change.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::codec::{self, SettingType, SettingValue, ValueError};
use super::{Variable, VariableFlags, VariableId};

/// Maximum length of a stored value, in characters.
pub const MAX_VALUE_LENGTH: usize = 5120;

/// Callback fired after a setting accepts a new value.
///
/// Only one shape can be bound at a time.
#[derive(Clone, Default)]
pub enum SettingCallback {
    #[default]
    None,
    /// Called with no arguments.
    Simple(Arc<dyn Fn() + Send + Sync>),
    /// Called with the setting that changed.
    WithSelf(Arc<dyn Fn(&Setting) + Send + Sync>),
    /// Called with the new canonical value.
    WithString(Arc<dyn Fn(&str) + Send + Sync>),
    /// Called with the new value of a bool setting.
    WithBool(Arc<dyn Fn(bool) + Send + Sync>),
}

impl SettingCallback {
    #[inline]
    pub fn is_bound(&self) -> bool {
        !matches!(self, SettingCallback::None)
    }
}

impl fmt::Debug for SettingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            SettingCallback::None => "None",
            SettingCallback::Simple(_) => "Simple",
            SettingCallback::WithSelf(_) => "WithSelf",
            SettingCallback::WithString(_) => "WithString",
            SettingCallback::WithBool(_) => "WithBool",
        };
        f.write_str(shape)
    }
}

/// Why a setting refused a write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingError {
    #[error("setting is locked")]
    Locked,

    #[error(transparent)]
    Invalid(#[from] ValueError),

    #[error("no setting named \"{0}\"")]
    NotFound(String),

    #[error("setting \"{0}\" is not a bool")]
    NotBool(String),
}

/// Result of an accepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetChange {
    /// Value before the write.
    pub old: String,
    /// Value after the write.
    pub new: String,
    /// Whether the input was cut down to [`MAX_VALUE_LENGTH`].
    pub truncated: bool,
}

fn truncate_chars(value: &mut String, max: usize) -> bool {
    match value.char_indices().nth(max) {
        Some((cut, _)) => {
            value.truncate(cut);
            true
        }
        None => false,
    }
}

/// A named, typed value.
///
/// # Examples
///
/// ```
/// use bevy_runtime_vars::core::{Setting, SettingType, VariableId};
///
/// let fov = Setting::new(VariableId::new(10), SettingType::Int32, "90")
///     .description("Camera field of view")
///     .range(60, 120);
///
/// assert_eq!(fov.get::<i32>(), 90);
/// assert!(fov.has_range());
/// ```
#[derive(Clone)]
pub struct Setting {
    variable: Variable,
    ty: SettingType,
    description: Box<str>,
    default_value: String,
    current_value: String,
    range: Option<(String, String)>,
    callback: SettingCallback,
}

impl Setting {
    /// Create a setting holding `default`.
    ///
    /// A default that is not valid for `ty` is kept as given and a warning is logged.
    pub fn new(id: VariableId, ty: SettingType, default: impl Into<String>) -> Self {
        let mut default = default.into();
        match codec::validate(ty, &default) {
            Ok(()) => default = codec::canonicalize(ty, &default),
            Err(e) => {
                bevy::log::warn!("Setting {}: default {}", id, e);
                if codec::has_line_break(&default) {
                    default = default.replace(['\r', '\n'], " ");
                }
            }
        }
        if truncate_chars(&mut default, MAX_VALUE_LENGTH) {
            bevy::log::warn!("Setting {}: default value truncated to {} characters", id, MAX_VALUE_LENGTH);
        }
        Self {
            variable: Variable::new(id),
            ty,
            description: "".into(),
            current_value: default.clone(),
            default_value: default,
            range: None,
            callback: SettingCallback::None,
        }
    }

    /// Create a setting from a typed default.
    pub fn typed<T: SettingValue>(id: VariableId, default: T) -> Self {
        Self::new(id, T::TYPE, default.to_setting_string())
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

    /// Set an inclusive range.
    pub fn range<T: SettingValue>(mut self, min: T, max: T) -> Self {
        self.set_range(min, max);
        self
    }

    /// Bind a callback, replacing any previous one.
    pub fn callback(mut self, callback: SettingCallback) -> Self {
        self.callback = callback;
        self
    }

    pub fn on_change<F>(self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callback(SettingCallback::Simple(Arc::new(f)))
    }

    pub fn on_change_self<F>(self, f: F) -> Self
    where
        F: Fn(&Setting) + Send + Sync + 'static,
    {
        self.callback(SettingCallback::WithSelf(Arc::new(f)))
    }

    pub fn on_change_string<F>(self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callback(SettingCallback::WithString(Arc::new(f)))
    }

    pub fn on_change_bool<F>(self, f: F) -> Self
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.callback(SettingCallback::WithBool(Arc::new(f)))
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
    pub fn get_type(&self) -> SettingType {
        self.ty
    }

    #[inline]
    pub fn is_type(&self, ty: SettingType) -> bool {
        self.ty == ty
    }

    #[inline]
    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, desc: impl Into<Box<str>>) -> &mut Self {
        self.description = desc.into();
        self
    }

    /// The canonical current value.
    #[inline]
    pub fn get_string_value(&self) -> &str {
        &self.current_value
    }

    #[inline]
    pub fn get_default_value(&self) -> &str {
        &self.default_value
    }

    /// Check if the current value differs from default.
    #[inline]
    pub fn is_modified(&self) -> bool {
        self.current_value != self.default_value
    }

    /// Read the value as `T`.
    ///
    /// Returns `T::default()` when the declared type does not convert to `T`.
    pub fn get<T: SettingValue>(&self) -> T {
        T::from_setting(self.ty, &self.current_value).unwrap_or_default()
    }

    #[inline]
    pub fn get_callback(&self) -> &SettingCallback {
        &self.callback
    }

    pub fn set_callback(&mut self, callback: SettingCallback) -> &mut Self {
        self.callback = callback;
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

    /// Both bounds, if a range is set.
    pub fn get_range(&self) -> Option<(&str, &str)> {
        self.range.as_ref().map(|(min, max)| (min.as_str(), max.as_str()))
    }

    #[inline]
    pub fn has_range(&self) -> bool {
        self.range
            .as_ref()
            .is_some_and(|(min, max)| !min.is_empty() && !max.is_empty())
    }

    /// Set an inclusive range from typed bounds.
    pub fn set_range<T: SettingValue>(&mut self, min: T, max: T) -> &mut Self {
        self.set_range_str(&min.to_setting_string(), &max.to_setting_string())
    }

    /// Set an inclusive range from string bounds.
    ///
    /// Bounds that are not valid for the setting type leave the range unchanged.
    pub fn set_range_str(&mut self, min: &str, max: &str) -> &mut Self {
        match (codec::validate(self.ty, min), codec::validate(self.ty, max)) {
            (Ok(()), Ok(())) => {
                self.range = Some((
                    codec::canonicalize(self.ty, min),
                    codec::canonicalize(self.ty, max),
                ));
            }
            (Err(e), _) | (_, Err(e)) => {
                bevy::log::warn!("Setting {}: ignoring range bound, {}", self.id(), e);
            }
        }
        self
    }

    pub fn remove_range(&mut self) -> &mut Self {
        self.range = None;
        self
    }

    /// Check `raw` against the type and the range without writing it.
    pub fn check_value(&self, raw: &str) -> Result<(), SettingError> {
        codec::validate(self.ty, raw)?;
        if let Some((min, max)) = &self.range {
            if !codec::is_in_range(self.ty, raw, min, max) {
                return Err(ValueError::OutOfRange {
                    raw: raw.to_string(),
                    min: min.clone(),
                    max: max.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Validate, canonicalize and store `raw`, then fire the bound callback.
    ///
    /// Rejected writes leave the setting untouched.
    pub(crate) fn apply_string_value(&mut self, raw: &str) -> Result<SetChange, SettingError> {
        if self.is_locked() {
            return Err(SettingError::Locked);
        }
        self.check_value(raw)?;

        let mut value = codec::canonicalize(self.ty, raw);
        let truncated = truncate_chars(&mut value, MAX_VALUE_LENGTH);
        let old = std::mem::replace(&mut self.current_value, value);
        self.trigger_callback();

        Ok(SetChange {
            old,
            new: self.current_value.clone(),
            truncated,
        })
    }

    /// Store `raw` and lock the setting, only if it passes validation.
    pub(crate) fn apply_locked_value(&mut self, raw: &str) -> Result<SetChange, SettingError> {
        self.check_value(raw)?;
        self.set_locked(false);
        let result = self.apply_string_value(raw);
        self.set_locked(true);
        result
    }

    pub(crate) fn apply_default(&mut self) -> Result<SetChange, SettingError> {
        let default = self.default_value.clone();
        self.apply_string_value(&default)
    }

    fn trigger_callback(&self) {
        match &self.callback {
            SettingCallback::None => {}
            SettingCallback::Simple(f) => f(),
            SettingCallback::WithSelf(f) => f(self),
            SettingCallback::WithString(f) => f(&self.current_value),
            SettingCallback::WithBool(f) => f(self.get::<bool>()),
        }
    }
}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("id", &self.id())
            .field("type", &self.ty)
            .field("value", &self.current_value)
            .field("default", &self.default_value)
            .field("range", &self.range)
            .field("callback", &self.callback)
            .finish()
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.current_value, self.ty)?;
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        Ok(())
    }
}
