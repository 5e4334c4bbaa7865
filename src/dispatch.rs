//! The dispatch driver: submission in, one email per recipient out.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

#[cfg(feature = "metrics")]
use std::time::Instant;

use crate::address::Address;
use crate::attachment::bind_attachments;
use crate::compose::{compose, ComposedMessage};
use crate::email::OutgoingEmail;
use crate::error::DispatchError;
use crate::hooks::{BeforeMessageCompile, BeforeSend, Hooks, Observer};
use crate::settings::{resolve_settings, EnvSettings, SettingsStore};
use crate::submission::Submission;
use crate::template::TemplateVariables;
use crate::transport::{DeliveryResult, Transport};

/// A successful send to one recipient.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub recipient: String,
    pub result: DeliveryResult,
}

/// Outcome of a dispatch that did not fail.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    /// Sends that reached the transport, in recipient order
    pub deliveries: Vec<Delivery>,
    /// Recipients whose send a `before_send` observer cancelled
    pub skipped: Vec<String>,
    /// A `before_message_compile` observer cancelled the whole dispatch
    pub cancelled: bool,
}

impl DispatchReport {
    pub fn sent_count(&self) -> usize {
        self.deliveries.len()
    }
}

/// Dispatches submissions through a settings store and a transport.
///
/// ```rust,ignore
/// use formmail::{Dispatcher, EnvSettings, Submission};
/// use formmail::transports::LoggerTransport;
///
/// let dispatcher = Dispatcher::new(EnvSettings::new(), LoggerTransport::new())
///     .on_before_send(|event: &mut formmail::BeforeSend| {
///         event.email.headers.insert("X-Form".into(), "contact".into());
///     });
///
/// dispatcher.send_message(&submission).await?;
/// ```
///
/// A dispatcher holds no per-call state, so one instance can serve
/// concurrent submissions.
pub struct Dispatcher {
    settings: Arc<dyn SettingsStore>,
    transport: Arc<dyn Transport>,
    before_message_compile: Hooks<BeforeMessageCompile>,
    before_send: Hooks<BeforeSend>,
}

impl Dispatcher {
    pub fn new(
        settings: impl SettingsStore + 'static,
        transport: impl Transport + 'static,
    ) -> Self {
        Self::with_arcs(Arc::new(settings), Arc::new(transport))
    }

    /// Create a dispatcher from shared settings and transport.
    pub fn with_arcs(settings: Arc<dyn SettingsStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
            before_message_compile: Hooks::new(),
            before_send: Hooks::new(),
        }
    }

    /// Settings from `FORMMAIL_*` variables, transport from
    /// `FORMMAIL_TRANSPORT` (see the crate docs).
    pub fn from_env() -> Result<Self, DispatchError> {
        let transport = crate::create_transport_from_env()?;
        Ok(Self::with_arcs(Arc::new(EnvSettings::new()), transport))
    }

    /// Register an observer fired once per submission, before composition.
    pub fn on_before_message_compile<O>(mut self, observer: O) -> Self
    where
        O: Observer<BeforeMessageCompile> + 'static,
    {
        self.before_message_compile.register(observer);
        self
    }

    /// Register an observer fired once per recipient, before sending.
    pub fn on_before_send<O>(mut self, observer: O) -> Self
    where
        O: Observer<BeforeSend> + 'static,
    {
        self.before_send.register(observer);
        self
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.provider_name()
    }

    /// Compose a submission and send it to every configured recipient.
    ///
    /// Recipients are processed in configured order. The first error aborts
    /// the remaining sends; recipients already sent to stay sent.
    pub async fn send_message(
        &self,
        submission: &Submission,
    ) -> Result<DispatchReport, DispatchError> {
        let span = tracing::info_span!(
            "formmail.send_message",
            transport = self.transport.provider_name(),
            from = %submission.from_email,
        );
        self.dispatch(submission).instrument(span).await
    }

    async fn dispatch(&self, submission: &Submission) -> Result<DispatchReport, DispatchError> {
        let settings = resolve_settings(self.settings.as_ref())?;
        let recipients = settings.recipients();
        if recipients.is_empty() {
            return Err(DispatchError::Configuration("no recipients configured".into()));
        }

        let mut report = DispatchReport::default();

        let mut compile = BeforeMessageCompile::new(submission.clone());
        if !self.before_message_compile.fire(&mut compile) {
            tracing::info!("Dispatch cancelled before message compile");
            report.cancelled = true;
            return Ok(report);
        }
        let submission = compile.submission;

        let composed = compose(&submission, &settings);
        let variables = TemplateVariables::new(&composed.subject, &composed.plain_body);
        tracing::debug!(
            recipients = recipients.len(),
            subject = %composed.subject,
            attachments = submission.attachments.iter().flatten().count(),
            "Message composed"
        );

        for recipient in recipients {
            let mut email = build_email(&recipient, &composed, &submission);
            bind_attachments(&mut email, &submission.attachments)?;

            let mut event = BeforeSend::new(recipient, email, variables.clone());
            if !self.before_send.fire(&mut event) {
                tracing::info!(recipient = %event.recipient, "Send cancelled by observer");
                report.skipped.push(event.recipient);
                continue;
            }

            let result = self.deliver(&event.email, &event.variables).await?;
            report.deliveries.push(Delivery {
                recipient: event.recipient,
                result,
            });
        }

        Ok(report)
    }

    async fn deliver(
        &self,
        email: &OutgoingEmail,
        variables: &TemplateVariables,
    ) -> Result<DeliveryResult, DispatchError> {
        #[cfg(feature = "metrics")]
        let start = Instant::now();

        let result = self.transport.send(email, variables).await;

        #[cfg(feature = "metrics")]
        {
            let provider = self.transport.provider_name();
            let status = if result.is_ok() { "success" } else { "error" };
            metrics::counter!("formmail_emails_total", "transport" => provider, "status" => status)
                .increment(1);
            metrics::histogram!("formmail_delivery_duration_seconds", "transport" => provider)
                .record(start.elapsed().as_secs_f64());
        }

        match &result {
            Ok(r) => {
                tracing::info!(to = %email.to.email, message_id = %r.message_id, "Email delivered")
            }
            Err(e) => tracing::error!(to = %email.to.email, error = %e, "Email delivery failed"),
        }

        result
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transport", &self.transport.provider_name())
            .field("before_message_compile", &self.before_message_compile)
            .field("before_send", &self.before_send)
            .finish()
    }
}

/// Build the email for one recipient.
///
/// The submitter is the From (with the prefixed display name), Reply-To and
/// envelope sender.
fn build_email(
    recipient: &str,
    composed: &ComposedMessage,
    submission: &Submission,
) -> OutgoingEmail {
    let mut email = OutgoingEmail::new(recipient)
        .from(Address::with_name(
            composed.from_name.as_str(),
            submission.from_email.as_str(),
        ))
        .reply_to(Address::with_name(
            submission.from_name.as_str(),
            submission.from_email.as_str(),
        ))
        .sender(submission.from_email.as_str())
        .subject(composed.subject.as_str())
        .text_body(composed.plain_body.as_str());
    if let Some(ref html) = composed.html_body {
        email = email.html_body(html.as_str());
    }
    email
}
