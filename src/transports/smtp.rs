//! SMTP transport using lettre.
//!
//! # Example
//!
//! ```rust,ignore
//! use formmail::transports::SmtpTransport;
//!
//! // With authentication
//! let transport = SmtpTransport::new("smtp.example.com", 587)
//!     .credentials("username", "password")
//!     .build()?;
//!
//! // Without authentication (local relay)
//! let transport = SmtpTransport::localhost()?;
//! ```

use async_trait::async_trait;
use lettre::{
    message::{
        header::{ContentTransferEncoding, ContentType, HeaderName, HeaderValue},
        Attachment as LettreAttachment, Body, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;

use crate::address::Address;
use crate::attachment::{Attachment, TransferEncoding};
use crate::email::OutgoingEmail;
use crate::error::DispatchError;
use crate::template::{
    render_email, MailLayout, RenderedMessage, TemplateEngine, TemplateVariables, TeraEngine,
};
use crate::transport::{DeliveryResult, Transport};

/// SMTP transport.
pub struct SmtpTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    layout: MailLayout,
    engine: Arc<dyn TemplateEngine>,
}

impl SmtpTransport {
    /// Create a new SMTP transport builder with TLS (STARTTLS on port 587).
    pub fn new(host: &str, port: u16) -> SmtpBuilder {
        SmtpBuilder {
            host: host.to_string(),
            port,
            credentials: None,
            tls: TlsMode::StartTls,
            layout: MailLayout::default(),
            engine: Arc::new(TeraEngine),
        }
    }

    /// Create a new SMTP transport for localhost (no TLS, no auth).
    pub fn localhost() -> Result<Self, DispatchError> {
        Self::new("localhost", 25).no_tls().build()
    }

    /// Build a lettre Message from a rendered email.
    fn build_message(
        &self,
        email: &OutgoingEmail,
        rendered: RenderedMessage,
    ) -> Result<Message, DispatchError> {
        let from = email
            .from
            .as_ref()
            .ok_or_else(|| DispatchError::Transport("email has no from address".into()))?;

        let mut builder = Message::builder()
            .from(address_to_mailbox(from)?)
            .to(address_to_mailbox(&email.to)?)
            .subject(rendered.subject);

        if let Some(ref reply_to) = email.reply_to {
            builder = builder.reply_to(address_to_mailbox(reply_to)?);
        }
        if let Some(ref sender) = email.sender {
            builder = builder.sender(address_to_mailbox(sender)?);
        }

        let body = match rendered.html {
            Some(html) => MultiPart::alternative_plain_html(rendered.text, html),
            None => MultiPart::mixed().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(rendered.text),
            ),
        };

        let mut message = if email.attachments.is_empty() {
            builder.multipart(body)?
        } else {
            let mut multipart = MultiPart::mixed().multipart(body);
            for attachment in &email.attachments {
                multipart = multipart.singlepart(attachment_part(attachment)?);
            }
            builder.multipart(multipart)?
        };

        // Sorted so the wire order does not depend on HashMap iteration
        let mut headers: Vec<_> = email.headers.iter().collect();
        headers.sort();
        for (name, value) in headers {
            message.headers_mut().insert_raw(raw_header(name, value)?);
        }

        Ok(message)
    }
}

impl std::fmt::Debug for SmtpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpTransport")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    async fn send(
        &self,
        email: &OutgoingEmail,
        variables: &TemplateVariables,
    ) -> Result<DeliveryResult, DispatchError> {
        let rendered = render_email(email, variables, self.engine.as_ref(), &self.layout)?;
        let message = self.build_message(email, rendered)?;

        let response = self.transport.send(message).await?;

        // Extract message ID from SMTP response, or generate one
        let message_id = response
            .message()
            .next()
            .and_then(|m| m.lines().next())
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(DeliveryResult::new(message_id))
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}

/// TLS mode for SMTP connection.
#[derive(Debug, Clone, Copy)]
pub enum TlsMode {
    /// No TLS (dangerous, only for localhost)
    None,
    /// STARTTLS - upgrade to TLS after connecting (port 587)
    StartTls,
    /// Implicit TLS - connect with TLS from start (port 465)
    Tls,
}

/// Builder for SmtpTransport.
pub struct SmtpBuilder {
    host: String,
    port: u16,
    credentials: Option<Credentials>,
    tls: TlsMode,
    layout: MailLayout,
    engine: Arc<dyn TemplateEngine>,
}

impl SmtpBuilder {
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials::new(username.to_string(), password.to_string()));
        self
    }

    pub fn tls(mut self, mode: TlsMode) -> Self {
        self.tls = mode;
        self
    }

    /// Disable TLS (dangerous, only for localhost/testing).
    pub fn no_tls(mut self) -> Self {
        self.tls = TlsMode::None;
        self
    }

    /// Layout the subject and bodies are rendered into.
    pub fn layout(mut self, layout: MailLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    /// Build the transport.
    ///
    /// Fails with [`DispatchError::Configuration`] if TLS cannot be set up
    /// for the host. There is no fallback to plain SMTP.
    pub fn build(self) -> Result<SmtpTransport, DispatchError> {
        let tls_error = |e: lettre::transport::smtp::Error| {
            DispatchError::Configuration(format!(
                "TLS setup failed for SMTP host {}: {}",
                self.host, e
            ))
        };
        let builder = match self.tls {
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host),
            TlsMode::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)
                    .map_err(tls_error)?
            }
            TlsMode::Tls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host).map_err(tls_error)?
            }
        };

        let mut builder = builder.port(self.port);
        if let Some(creds) = self.credentials {
            builder = builder.credentials(creds);
        }

        Ok(SmtpTransport {
            transport: builder.build(),
            layout: self.layout,
            engine: self.engine,
        })
    }
}

fn attachment_part(attachment: &Attachment) -> Result<SinglePart, DispatchError> {
    let content_type: ContentType = attachment
        .content_type
        .parse()
        .or_else(|_| "application/octet-stream".parse())
        .map_err(|_| {
            DispatchError::Transport(format!(
                "invalid content type for {}: {}",
                attachment.filename, attachment.content_type
            ))
        })?;

    let encoding = match attachment.encoding {
        TransferEncoding::Base64 => ContentTransferEncoding::Base64,
    };
    let body = Body::new_with_encoding(attachment.data.clone(), encoding).map_err(|_| {
        DispatchError::Transport(format!("cannot encode attachment {}", attachment.filename))
    })?;

    Ok(LettreAttachment::new(attachment.filename.clone()).body(body, content_type))
}

fn raw_header(name: &str, value: &str) -> Result<HeaderValue, DispatchError> {
    let header_name = HeaderName::new_from_ascii(name.to_string())
        .map_err(|_| DispatchError::Transport(format!("invalid header name: {}", name)))?;
    Ok(HeaderValue::new(header_name, value.to_string()))
}

fn address_to_mailbox(addr: &Address) -> Result<Mailbox, DispatchError> {
    let email: lettre::Address = addr.email.parse()?;
    Ok(Mailbox::new(addr.name.clone(), email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(html: Option<&str>) -> RenderedMessage {
        RenderedMessage {
            subject: "Quote".into(),
            text: "Hello".into(),
            html: html.map(str::to_string),
        }
    }

    #[test]
    fn test_build_message_with_attachment() {
        let transport = SmtpTransport::localhost().unwrap();
        let email = OutgoingEmail::new("sales@example.com")
            .from(("Web: Jan", "jan@example.com"))
            .reply_to("jan@example.com")
            .sender("jan@example.com")
            .attachment(Attachment::from_bytes("cv.pdf", b"%PDF-1.4".to_vec()));

        let message = transport
            .build_message(&email, rendered(Some("<p>Hello</p>")))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: Quote"));
        assert!(raw.contains("Reply-To: jan@example.com"));
        assert!(raw.contains("Sender: jan@example.com"));
        assert!(raw.contains("filename=\"cv.pdf\""));
        assert!(raw.contains("Content-Transfer-Encoding: base64"));
        assert!(raw.contains("application/pdf"));
    }

    #[test]
    fn test_hook_headers_are_sent() {
        let transport = SmtpTransport::localhost().unwrap();
        let email = OutgoingEmail::new("sales@example.com")
            .from("jan@example.com")
            .header("X-Form", "contact")
            .header("X-Site", "main");

        let message = transport.build_message(&email, rendered(None)).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("X-Form: contact"));
        assert!(raw.contains("X-Site: main"));
    }

    #[test]
    fn test_invalid_header_name_is_transport_error() {
        let transport = SmtpTransport::localhost().unwrap();
        let email = OutgoingEmail::new("sales@example.com")
            .from("jan@example.com")
            .header("X Form", "contact");

        let err = transport.build_message(&email, rendered(None)).unwrap_err();
        assert!(err.to_string().contains("invalid header name"));
    }

    #[test]
    fn test_tls_setup_failure_is_configuration_error() {
        let err = SmtpTransport::new("not a host name", 587).build().unwrap_err();
        assert!(err.is_configuration());

        let err = SmtpTransport::new("not a host name", 465)
            .tls(TlsMode::Tls)
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_from_is_transport_error() {
        let transport = SmtpTransport::localhost().unwrap();
        let email = OutgoingEmail::new("sales@example.com");
        let err = transport.build_message(&email, rendered(None)).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_invalid_recipient_is_transport_error() {
        let transport = SmtpTransport::localhost().unwrap();
        let email = OutgoingEmail::new("not an address").from("jan@example.com");
        let err = transport.build_message(&email, rendered(None)).unwrap_err();
        assert!(err.is_transport());
    }
}
