//! Logger transport that only logs emails.
//!
//! Useful for staging environments where nothing should leave the machine.
//! The layout is still rendered so template mistakes show up.

use async_trait::async_trait;

use crate::email::OutgoingEmail;
use crate::error::DispatchError;
use crate::template::{render_email, MailLayout, TemplateVariables, TeraEngine};
use crate::transport::{DeliveryResult, Transport};

/// Transport that emits tracing events instead of sending.
#[derive(Debug, Clone, Default)]
pub struct LoggerTransport {
    /// If true, log full email details. If false, just log recipient summary.
    log_full: bool,
    layout: MailLayout,
}

impl LoggerTransport {
    /// Brief output (recipient and subject).
    pub fn new() -> Self {
        Self::default()
    }

    /// Full email details, bodies at debug level.
    pub fn full() -> Self {
        Self {
            log_full: true,
            ..Self::default()
        }
    }

    pub fn log_full(mut self, full: bool) -> Self {
        self.log_full = full;
        self
    }

    pub fn layout(mut self, layout: MailLayout) -> Self {
        self.layout = layout;
        self
    }
}

#[async_trait]
impl Transport for LoggerTransport {
    async fn send(
        &self,
        email: &OutgoingEmail,
        variables: &TemplateVariables,
    ) -> Result<DeliveryResult, DispatchError> {
        let rendered = render_email(email, variables, &TeraEngine, &self.layout)?;
        let message_id = uuid::Uuid::new_v4().to_string();

        if self.log_full {
            tracing::info!(
                message_id = %message_id,
                from = ?email.from.as_ref().map(|a| a.formatted()),
                reply_to = ?email.reply_to.as_ref().map(|a| a.formatted()),
                to = %email.to.formatted(),
                subject = %rendered.subject,
                has_html = rendered.html.is_some(),
                attachments = email.attachments.len(),
                "Email logged (full)"
            );

            tracing::debug!(body = %rendered.text, "Text body");
            if let Some(ref html) = rendered.html {
                tracing::debug!(body = %html, "HTML body");
            }
        } else {
            tracing::info!(
                message_id = %message_id,
                to = %email.to.email,
                subject = %rendered.subject,
                "Email logged"
            );
        }

        Ok(DeliveryResult::new(message_id))
    }

    fn provider_name(&self) -> &'static str {
        "logger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> OutgoingEmail {
        OutgoingEmail::new("sales@example.com")
            .from(("Jan", "jan@example.com"))
            .subject("Quote")
            .text_body("Hello")
            .html_body("<p>Hello</p>")
    }

    #[tokio::test]
    async fn test_logger_brief() {
        let transport = LoggerTransport::new();
        let result = transport
            .send(&email(), &TemplateVariables::new("Quote", "Hello"))
            .await
            .unwrap();
        assert!(!result.message_id.is_empty());
    }

    #[tokio::test]
    async fn test_logger_full() {
        let transport = LoggerTransport::full();
        assert!(transport.log_full);
        let result = transport
            .send(&email(), &TemplateVariables::new("Quote", "Hello"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_logger_reports_template_errors() {
        let transport = LoggerTransport::new().layout(MailLayout::default().text("{% if %}"));
        let err = transport
            .send(&email(), &TemplateVariables::new("Quote", "Hello"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(LoggerTransport::new().provider_name(), "logger");
        assert!(!LoggerTransport::default().log_full(false).log_full);
    }
}
