//! Settings resolution tests.

use std::sync::Arc;

use formmail::{
    parse_recipients, resolve_settings, EnvSettings, MemorySettings, PluginSettings, SettingsStore,
};

// ============================================================================
// Recipient parsing
// ============================================================================

#[test]
fn parses_mixed_separators() {
    assert_eq!(
        parse_recipients("a@x.com, b@y.com\nc@z.com"),
        vec!["a@x.com", "b@y.com", "c@z.com"]
    );
}

#[test]
fn drops_empty_entries() {
    assert_eq!(parse_recipients(",,a@x.com,\n\n , b@y.com,"), vec!["a@x.com", "b@y.com"]);
    assert!(parse_recipients(" , \n ").is_empty());
    assert!(parse_recipients("").is_empty());
}

#[test]
fn keeps_order_and_duplicates() {
    assert_eq!(
        parse_recipients("b@y.com,a@x.com,b@y.com"),
        vec!["b@y.com", "a@x.com", "b@y.com"]
    );
}

#[test]
fn windows_line_endings_are_trimmed() {
    assert_eq!(parse_recipients("a@x.com\r\nb@y.com"), vec!["a@x.com", "b@y.com"]);
}

// ============================================================================
// Stores
// ============================================================================

#[test]
fn env_settings_with_prefix() {
    std::env::set_var("SETTINGS_TEST_TO_EMAIL", "a@x.com\nb@y.com");
    std::env::set_var("SETTINGS_TEST_PREPEND_SUBJECT", "[Env]");

    let store = EnvSettings::with_prefix("SETTINGS_TEST_");
    let settings = resolve_settings(&store).unwrap();

    assert_eq!(settings.recipients(), vec!["a@x.com", "b@y.com"]);
    assert_eq!(settings.prepend_subject.as_deref(), Some("[Env]"));
    assert_eq!(settings.prepend_sender, None);

    std::env::remove_var("SETTINGS_TEST_TO_EMAIL");
    std::env::remove_var("SETTINGS_TEST_PREPEND_SUBJECT");
}

#[test]
fn shared_store_resolves() {
    let store: Arc<dyn SettingsStore> =
        Arc::new(MemorySettings::new().set("to_email", "a@x.com"));
    let settings = resolve_settings(&store).unwrap();
    assert_eq!(
        settings,
        PluginSettings {
            to_email: "a@x.com".into(),
            prepend_sender: None,
            prepend_subject: None,
        }
    );
}

#[test]
fn invalid_addresses_are_kept() {
    let store = MemorySettings::new().set("to_email", "not-an-address, a@x.com");
    let settings = resolve_settings(&store).unwrap();
    assert_eq!(settings.recipients(), vec!["not-an-address", "a@x.com"]);
}
