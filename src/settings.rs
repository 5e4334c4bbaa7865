//! Plugin settings and the stores they are read from.
//!
//! Settings live outside this crate (a CMS settings table, environment
//! variables, a config file). Anything that can answer a key lookup can be a
//! [`SettingsStore`]; [`resolve_settings`] turns the raw values into a
//! validated [`PluginSettings`].

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

use crate::error::DispatchError;
use crate::recipients::parse_recipients;

/// Setting key for the recipient list.
pub const TO_EMAIL: &str = "to_email";
/// Setting key for the sender name prefix.
pub const PREPEND_SENDER: &str = "prepend_sender";
/// Setting key for the subject prefix.
pub const PREPEND_SUBJECT: &str = "prepend_subject";

/// Read-only key/value access to plugin settings.
pub trait SettingsStore: Send + Sync {
    /// Look up a raw setting value.
    fn get(&self, key: &str) -> Option<String>;
}

/// Validated plugin settings for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// One or more recipients, comma or newline separated
    pub to_email: String,
    /// Prefix for the sender display name
    pub prepend_sender: Option<String>,
    /// Prefix for the subject line
    pub prepend_subject: Option<String>,
}

impl PluginSettings {
    /// The parsed recipient list.
    pub fn recipients(&self) -> Vec<String> {
        parse_recipients(&self.to_email)
    }
}

/// Read and validate plugin settings.
///
/// Fails with [`DispatchError::Configuration`] when the recipient setting is
/// missing, blank, or contains no addresses. Blank prefixes become `None`.
pub fn resolve_settings(store: &dyn SettingsStore) -> Result<PluginSettings, DispatchError> {
    let to_email = store
        .get(TO_EMAIL)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DispatchError::Configuration(format!("{} is not set", TO_EMAIL)))?;

    let recipients = parse_recipients(&to_email);
    if recipients.is_empty() {
        return Err(DispatchError::Configuration(format!(
            "{} contains no recipients",
            TO_EMAIL
        )));
    }
    for recipient in invalid_recipients(&recipients) {
        tracing::warn!(recipient = %recipient, "Configured recipient does not look like a valid address");
    }

    Ok(PluginSettings {
        to_email,
        prepend_sender: non_blank(store.get(PREPEND_SENDER)),
        prepend_subject: non_blank(store.get(PREPEND_SUBJECT)),
    })
}

/// Recipients that fail RFC 5322 validation. They are still attempted.
fn invalid_recipients(recipients: &[String]) -> impl Iterator<Item = &str> {
    recipients
        .iter()
        .map(String::as_str)
        .filter(|recipient| !EmailAddress::is_valid(recipient))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Settings read from `FORMMAIL_*` environment variables.
///
/// | Key | Variable |
/// |-----|----------|
/// | `to_email` | `FORMMAIL_TO_EMAIL` |
/// | `prepend_sender` | `FORMMAIL_PREPEND_SENDER` |
/// | `prepend_subject` | `FORMMAIL_PREPEND_SUBJECT` |
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn new() -> Self {
        Self {
            prefix: "FORMMAIL_".to_string(),
        }
    }

    /// Use a different variable prefix (e.g. one per site).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase())
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.var_name(key)).ok()
    }
}

/// In-process settings, for tests or settings loaded from a config file.
///
/// ```
/// use formmail::{MemorySettings, resolve_settings};
///
/// let store = MemorySettings::new()
///     .set("to_email", "sales@example.com, support@example.com")
///     .set("prepend_subject", "[Website]");
///
/// let settings = resolve_settings(&store).unwrap();
/// assert_eq!(settings.recipients().len(), 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl From<&PluginSettings> for MemorySettings {
    fn from(settings: &PluginSettings) -> Self {
        let mut store = Self::new().set(TO_EMAIL, settings.to_email.clone());
        if let Some(ref prefix) = settings.prepend_sender {
            store = store.set(PREPEND_SENDER, prefix.clone());
        }
        if let Some(ref prefix) = settings.prepend_subject {
            store = store.set(PREPEND_SUBJECT, prefix.clone());
        }
        store
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<S: SettingsStore + ?Sized> SettingsStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
