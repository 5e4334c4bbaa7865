//! The outgoing email handed to a transport.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::address::Address;
use crate::attachment::Attachment;

/// One email to one recipient.
///
/// The dispatcher builds a fresh value per recipient, so hooks that alter an
/// email only ever affect that recipient's copy.
///
/// ```
/// use formmail::{Address, OutgoingEmail};
///
/// let email = OutgoingEmail::new("sales@example.com")
///     .from(Address::with_name("Jan", "jan@example.com"))
///     .subject("Quote request")
///     .text_body("Hello");
///
/// assert_eq!(email.to.email, "sales@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    /// Sender shown in the From header
    pub from: Option<Address>,
    /// Where replies go (the form submitter)
    pub reply_to: Option<Address>,
    /// Envelope sender (Sender header)
    pub sender: Option<Address>,
    /// The single destination
    pub to: Address,
    pub subject: String,
    /// Plain text body
    pub text_body: String,
    /// HTML body
    pub html_body: Option<String>,
    pub attachments: Vec<Attachment>,
    /// Custom headers, e.g. added by a `before_send` hook
    pub headers: HashMap<String, String>,
}

impl OutgoingEmail {
    /// Create an email to a single recipient.
    pub fn new(to: impl Into<Address>) -> Self {
        Self {
            from: None,
            reply_to: None,
            sender: None,
            to: to.into(),
            subject: String::new(),
            text_body: String::new(),
            html_body: None,
            attachments: Vec::new(),
            headers: HashMap::new(),
        }
    }

    pub fn from(mut self, addr: impl Into<Address>) -> Self {
        self.from = Some(addr.into());
        self
    }

    pub fn reply_to(mut self, addr: impl Into<Address>) -> Self {
        self.reply_to = Some(addr.into());
        self
    }

    /// Set the envelope sender.
    pub fn sender(mut self, addr: impl Into<Address>) -> Self {
        self.sender = Some(addr.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = body.into();
        self
    }

    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
