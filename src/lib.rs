//! # formmail
//!
//! Turn contact-form submissions into email for every configured recipient.
//!
//! ## Quick Start
//!
//! Set environment variables:
//! ```bash
//! FORMMAIL_TO_EMAIL=sales@example.com,support@example.com
//! FORMMAIL_PREPEND_SUBJECT=[Website]
//! FORMMAIL_TRANSPORT=smtp
//! SMTP_HOST=smtp.example.com
//! ```
//!
//! Send submissions from your form handler:
//! ```rust,ignore
//! use formmail::{send_message, Submission};
//!
//! let submission = Submission::new("Jan", "jan@example.com")
//!     .subject("Quote request")
//!     .message("Hello!");
//!
//! send_message(&submission).await?;
//! ```
//!
//! ## Explicit Dispatcher
//!
//! ```rust,ignore
//! use formmail::{Dispatcher, MemorySettings, BeforeSend, Cancellable};
//! use formmail::transports::LocalTransport;
//!
//! let settings = MemorySettings::new().set("to_email", "sales@example.com");
//! let dispatcher = Dispatcher::new(settings, LocalTransport::new())
//!     .on_before_send(|event: &mut BeforeSend| {
//!         if event.email.attachments.len() > 5 {
//!             event.cancel();
//!         }
//!     });
//!
//! let report = dispatcher.send_message(&submission).await?;
//! ```
//!
//! ## Pipeline
//!
//! For each submission: resolve settings, parse recipients, fire
//! `before_message_compile`, compose once, then for every recipient build a
//! fresh [`OutgoingEmail`], bind attachments, fire `before_send`, and call the
//! transport. The first error aborts the remaining recipients.
//!
//! ## Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `FORMMAIL_TO_EMAIL` | Recipients, comma or newline separated (required) |
//! | `FORMMAIL_PREPEND_SENDER` | Prefix for the sender display name |
//! | `FORMMAIL_PREPEND_SUBJECT` | Prefix for the subject line |
//! | `FORMMAIL_TRANSPORT` | `smtp`, `local`, `logger`, `logger_full` |
//! | `SMTP_HOST` | SMTP server host |
//! | `SMTP_PORT` | SMTP server port (default: 587) |
//! | `SMTP_USERNAME` | SMTP username |
//! | `SMTP_PASSWORD` | SMTP password |
//!
//! ## Feature Flags
//!
//! - `smtp` - SMTP transport via lettre
//! - `local` - LocalTransport and test assertions (default)
//! - `metrics` - Prometheus-style metrics (counters/histograms)
//!
//! ## Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `formmail_emails_total` | Counter | transport, status | Emails handed to the transport |
//! | `formmail_delivery_duration_seconds` | Histogram | transport | Per-recipient send duration |

/// The version of the formmail crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod address;
mod attachment;
mod compose;
mod dispatch;
mod email;
mod error;
mod hooks;
mod recipients;
mod settings;
mod submission;
mod template;
mod transport;

pub mod transports;

#[cfg(feature = "local")]
mod storage;

#[cfg(feature = "local")]
pub mod testing;

use parking_lot::RwLock;
use std::env;
use std::sync::Arc;

// Re-exports
pub use address::Address;
pub use attachment::{bind_attachments, Attachment, TransferEncoding};
pub use compose::{compose, escape_template_syntax, ComposedMessage, SEPARATOR, TEMPLATE_ESCAPES};
pub use dispatch::{Delivery, DispatchReport, Dispatcher};
pub use email::OutgoingEmail;
pub use error::DispatchError;
pub use hooks::{BeforeMessageCompile, BeforeSend, Cancellable, Hooks, Observer};
pub use recipients::parse_recipients;
pub use settings::{resolve_settings, EnvSettings, MemorySettings, PluginSettings, SettingsStore};
pub use submission::{Submission, UploadedFile};
pub use template::{
    render_email, Format, MailLayout, RenderedMessage, TemplateEngine, TemplateVariables,
    TeraEngine,
};
pub use transport::{DeliveryResult, Transport};

#[cfg(feature = "local")]
pub use storage::{MemoryStorage, Storage, StoredEmail};

// ============================================================================
// Global Dispatcher
// ============================================================================

/// Global dispatcher - swappable for testing
static DISPATCHER: RwLock<Option<Arc<Dispatcher>>> = RwLock::new(None);

/// Auto-detect a transport from enabled features and available variables.
fn detect_transport() -> Option<&'static str> {
    #[cfg(feature = "smtp")]
    if env::var("SMTP_HOST").is_ok() {
        return Some("smtp");
    }
    #[cfg(feature = "local")]
    {
        return Some("local");
    }
    #[allow(unreachable_code)]
    None
}

fn transport_name_from_env() -> Option<String> {
    match env::var("FORMMAIL_TRANSPORT") {
        Ok(t) => Some(t.to_lowercase()),
        Err(_) => detect_transport().map(|t| {
            tracing::debug!(transport = t, "Auto-detected email transport");
            t.to_string()
        }),
    }
}

/// Create a transport from environment variables.
pub(crate) fn create_transport_from_env() -> Result<Arc<dyn Transport>, DispatchError> {
    let name = transport_name_from_env().ok_or_else(|| {
        DispatchError::Configuration(
            "FORMMAIL_TRANSPORT not set and could not auto-detect. \
            Set FORMMAIL_TRANSPORT or SMTP_HOST."
                .into(),
        )
    })?;

    match name.as_str() {
        #[cfg(feature = "smtp")]
        "smtp" => {
            let host = env::var("SMTP_HOST")
                .map_err(|_| DispatchError::Configuration("SMTP_HOST not set".into()))?;
            let port: u16 = match env::var("SMTP_PORT") {
                Ok(p) => p.parse().map_err(|_| {
                    DispatchError::Configuration(format!("SMTP_PORT is not a port: {}", p))
                })?,
                Err(_) => 587,
            };
            let username = env::var("SMTP_USERNAME").unwrap_or_default();
            let password = env::var("SMTP_PASSWORD").unwrap_or_default();

            let mut builder = transports::SmtpTransport::new(&host, port);
            if !username.is_empty() {
                builder = builder.credentials(&username, &password);
            }
            Ok(Arc::new(builder.build()?))
        }
        #[cfg(not(feature = "smtp"))]
        "smtp" => Err(DispatchError::Configuration(
            "FORMMAIL_TRANSPORT=smtp but 'smtp' feature is not enabled. \
            Add `features = [\"smtp\"]` to Cargo.toml"
                .into(),
        )),

        #[cfg(feature = "local")]
        "local" => Ok(Arc::new(transports::LocalTransport::new())),
        #[cfg(not(feature = "local"))]
        "local" => Err(DispatchError::Configuration(
            "FORMMAIL_TRANSPORT=local but 'local' feature is not enabled. \
            Add `features = [\"local\"]` to Cargo.toml"
                .into(),
        )),

        "logger" => Ok(Arc::new(transports::LoggerTransport::new())),
        "logger_full" => Ok(Arc::new(transports::LoggerTransport::full())),

        other => Err(DispatchError::Configuration(format!(
            "Unknown FORMMAIL_TRANSPORT: {}. Valid transports are: smtp, local, logger, logger_full",
            other
        ))),
    }
}

/// Get or initialize the global dispatcher.
fn get_dispatcher() -> Result<Arc<Dispatcher>, DispatchError> {
    // Fast path: already configured
    if let Some(ref dispatcher) = *DISPATCHER.read() {
        return Ok(Arc::clone(dispatcher));
    }

    let created = Arc::new(Dispatcher::from_env()?);
    let mut guard = DISPATCHER.write();
    // Another caller may have won the race
    let dispatcher = guard.get_or_insert(created);
    Ok(Arc::clone(dispatcher))
}

/// Check whether the environment describes a usable setup.
///
/// Requires `FORMMAIL_TO_EMAIL` and a transport that is both selected (or
/// auto-detected) and enabled by a feature flag.
pub fn is_configured() -> bool {
    if env::var("FORMMAIL_TO_EMAIL").map_or(true, |v| v.trim().is_empty()) {
        return false;
    }
    match transport_name_from_env().as_deref() {
        #[cfg(feature = "smtp")]
        Some("smtp") => env::var("SMTP_HOST").is_ok(),
        #[cfg(feature = "local")]
        Some("local") => true,
        Some("logger") | Some("logger_full") => true,
        Some(other) => {
            tracing::warn!(
                transport = other,
                "FORMMAIL_TRANSPORT names a transport that is unknown or not enabled"
            );
            false
        }
        None => false,
    }
}

/// Initialize the global dispatcher from environment variables.
///
/// ```rust,ignore
/// // In main.rs
/// formmail::init().ok(); // Ignore error if email not configured
/// ```
pub fn init() -> Result<(), DispatchError> {
    if !is_configured() {
        return Err(DispatchError::Configuration(
            "formmail is not configured; set FORMMAIL_TO_EMAIL and a transport".into(),
        ));
    }
    get_dispatcher().map(|_| ())
}

/// Dispatch a submission with the global dispatcher.
///
/// Auto-configures from environment variables on first call.
pub async fn send_message(submission: &Submission) -> Result<DispatchReport, DispatchError> {
    get_dispatcher()?.send_message(submission).await
}

/// Set the global dispatcher. Later calls replace the previous one.
pub fn configure(dispatcher: Dispatcher) {
    *DISPATCHER.write() = Some(Arc::new(dispatcher));
}

/// Reset the global dispatcher (useful for tests).
///
/// The next `send_message()` re-initializes from env vars.
pub fn reset() {
    *DISPATCHER.write() = None;
}

/// The configured global dispatcher, if initialized.
pub fn dispatcher() -> Option<Arc<Dispatcher>> {
    DISPATCHER.read().clone()
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        send_message, BeforeMessageCompile, BeforeSend, Cancellable, DispatchError,
        DispatchReport, Dispatcher, MemorySettings, OutgoingEmail, PluginSettings,
        SettingsStore, Submission, Transport, UploadedFile,
    };
}
