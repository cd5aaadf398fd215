//! Declared options and lookup by key or title.

use crate::config::{ConfigError, DuplicatePolicy};
use crate::value::TypedValue;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// A key or title that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("option not found: {0}")]
pub struct NotFound(pub TypedValue);

/// One declared command-line switch.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOption {
    key: TypedValue,
    title: TypedValue,
    description: TypedValue,
    expects_value: bool,
    value: Option<TypedValue>,
}

impl CliOption {
    pub fn new(
        key: TypedValue,
        title: TypedValue,
        description: TypedValue,
        expects_value: bool,
    ) -> Self {
        Self {
            key,
            title,
            description,
            expects_value,
            value: None,
        }
    }

    pub fn key(&self) -> &TypedValue {
        &self.key
    }

    pub fn title(&self) -> &TypedValue {
        &self.title
    }

    pub fn description(&self) -> &TypedValue {
        &self.description
    }

    pub fn expects_value(&self) -> bool {
        self.expects_value
    }

    /// The parsed value. Flags hold `Bool(true)` once they have been seen.
    pub fn value(&self) -> Option<&TypedValue> {
        self.value.as_ref()
    }

    pub(crate) fn set_value(&mut self, value: TypedValue) {
        self.value = Some(value);
    }
}

/// Diagnostics emitted when a registration replaces an earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationWarning {
    /// An option was already registered under this key.
    KeyOverwritten { key: TypedValue },
    /// The title pointed at a different key and now points at `key`.
    TitleOverwritten {
        title: TypedValue,
        previous_key: TypedValue,
        key: TypedValue,
    },
}

impl fmt::Display for RegistrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationWarning::KeyOverwritten { key } => {
                write!(f, "option key '{}' registered twice, keeping the latest", key)
            }
            RegistrationWarning::TitleOverwritten {
                title,
                previous_key,
                key,
            } => write!(
                f,
                "title '{}' moved from option '{}' to option '{}'",
                title, previous_key, key
            ),
        }
    }
}

/// Receives registration warnings.
pub type WarningHook = Box<dyn FnMut(&RegistrationWarning)>;

/// The set of declared options.
///
/// Options are indexed by key, with a second index from title to key.
/// Registration order is kept for help listings.
#[derive(Default)]
pub struct OptionRegistry {
    options: HashMap<TypedValue, CliOption>,
    titles: HashMap<TypedValue, TypedValue>,
    order: Vec<TypedValue>,
    policy: DuplicatePolicy,
    warning_hook: Option<WarningHook>,
}

impl fmt::Debug for OptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionRegistry")
            .field("options", &self.iter().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish()
    }
}

impl OptionRegistry {
    /// An empty registry that overwrites duplicates.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Change the duplicate policy. Applies to later registrations only.
    pub fn set_policy(&mut self, policy: DuplicatePolicy) {
        self.policy = policy;
    }

    /// Install a callback that observes overwritten registrations.
    pub fn set_warning_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&RegistrationWarning) + 'static,
    {
        self.warning_hook = Some(Box::new(hook));
    }

    /// Declare an option.
    ///
    /// Under [`DuplicatePolicy::Overwrite`] a repeated key replaces the
    /// earlier option (keeping its listing position) and a repeated title
    /// is re-pointed at the new key. Under [`DuplicatePolicy::Reject`]
    /// either conflict fails and the registry is left unchanged.
    pub fn register(
        &mut self,
        key: impl Into<TypedValue>,
        title: impl Into<TypedValue>,
        description: impl Into<TypedValue>,
        expects_value: bool,
    ) -> Result<(), ConfigError> {
        let key = key.into();
        let title = title.into();
        let description = description.into();

        let previous_key = self.titles.get(&title).cloned();
        if self.policy == DuplicatePolicy::Reject {
            if self.options.contains_key(&key) {
                return Err(ConfigError::DuplicateKey(key));
            }
            if previous_key.is_some() {
                return Err(ConfigError::DuplicateTitle(title));
            }
        }

        debug!(key = %key, title = %title, expects_value, "registering option");

        let option = CliOption::new(key.clone(), title.clone(), description, expects_value);
        match self.options.insert(key.clone(), option) {
            Some(previous) => {
                if previous.title != title && self.titles.get(&previous.title) == Some(&key) {
                    self.titles.remove(&previous.title);
                }
                self.emit(RegistrationWarning::KeyOverwritten { key: key.clone() });
            }
            None => self.order.push(key.clone()),
        }

        self.titles.insert(title.clone(), key.clone());
        if let Some(previous_key) = previous_key {
            if previous_key != key {
                self.emit(RegistrationWarning::TitleOverwritten {
                    title,
                    previous_key,
                    key,
                });
            }
        }

        Ok(())
    }

    /// Declare an option whose key is given as a raw token.
    ///
    /// The key goes through [`TypedValue::infer`], so `"3"` registers
    /// `Int(3)` and matches the token `3` on the command line.
    pub fn register_token(
        &mut self,
        key: &str,
        title: impl Into<TypedValue>,
        description: impl Into<TypedValue>,
        expects_value: bool,
    ) -> Result<(), ConfigError> {
        self.register(TypedValue::infer(key), title, description, expects_value)
    }

    pub fn lookup_by_key(&self, key: &TypedValue) -> Result<&CliOption, NotFound> {
        self.options
            .get(key)
            .ok_or_else(|| NotFound(key.clone()))
    }

    pub fn lookup_by_title(&self, title: &TypedValue) -> Result<&CliOption, NotFound> {
        self.titles
            .get(title)
            .and_then(|key| self.options.get(key))
            .ok_or_else(|| NotFound(title.clone()))
    }

    /// Resolve a key, falling back to a title.
    pub fn lookup(&self, title_or_key: &TypedValue) -> Result<&CliOption, NotFound> {
        self.lookup_by_key(title_or_key)
            .or_else(|_| self.lookup_by_title(title_or_key))
    }

    pub(crate) fn lookup_mut_by_key(&mut self, key: &TypedValue) -> Option<&mut CliOption> {
        self.options.get_mut(key)
    }

    pub fn contains_key(&self, key: &TypedValue) -> bool {
        self.options.contains_key(key)
    }

    /// True if `title_or_key` names a declared option.
    pub fn has(&self, title_or_key: &TypedValue) -> bool {
        self.lookup(title_or_key).is_ok()
    }

    /// Options in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CliOption> {
        self.order.iter().filter_map(|key| self.options.get(key))
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    fn emit(&mut self, warning: RegistrationWarning) {
        warn!("{}", warning);
        if let Some(hook) = self.warning_hook.as_mut() {
            hook(&warning);
        }
    }
}
