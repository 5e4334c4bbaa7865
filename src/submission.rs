//! Contact-form submission and uploaded file records.

use serde::{Deserialize, Serialize};

/// A file handed over by the upload handler.
///
/// formmail only reads `temp_path`; the upload handler owns the file and its
/// cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Where the upload handler stored the file
    pub temp_path: String,
    /// Filename as sent by the browser
    pub original_name: String,
    /// Declared MIME type (may be empty)
    pub mime_type: String,
}

impl UploadedFile {
    pub fn new(
        temp_path: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            temp_path: temp_path.into(),
            original_name: original_name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// What the end user typed into the contact form.
///
/// ```
/// use formmail::Submission;
///
/// let submission = Submission::new("Jan", "jan@example.com")
///     .subject("Quote request")
///     .message("Hello!");
/// ```
///
/// `attachments` is sparse: upload arrays commonly contain empty slots for
/// file inputs the user left blank, which are skipped when binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub from_name: String,
    pub from_email: String,
    pub from_phone: Option<String>,
    pub subject: String,
    /// Plain text message
    pub message: String,
    /// Optional HTML variant of the message
    pub html_message: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Option<UploadedFile>>,
}

impl Submission {
    /// Create a submission with the sender identity.
    pub fn new(from_name: impl Into<String>, from_email: impl Into<String>) -> Self {
        Self {
            from_name: from_name.into(),
            from_email: from_email.into(),
            ..Self::default()
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.from_phone = Some(phone.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn html_message(mut self, html: impl Into<String>) -> Self {
        self.html_message = Some(html.into());
        self
    }

    /// Add an uploaded file.
    pub fn attachment(mut self, file: UploadedFile) -> Self {
        self.attachments.push(Some(file));
        self
    }

    /// Add an empty upload slot.
    pub fn empty_attachment_slot(mut self) -> Self {
        self.attachments.push(None);
        self
    }

    /// The HTML message, if one was submitted and is not blank.
    pub fn html(&self) -> Option<&str> {
        self.html_message
            .as_deref()
            .filter(|html| !html.trim().is_empty())
    }
}
