//! Email attachments and binding uploaded files to an outgoing email.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::email::OutgoingEmail;
use crate::error::DispatchError;
use crate::submission::UploadedFile;

/// Content-Transfer-Encoding used for an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransferEncoding {
    /// Uploaded files are always sent base64 encoded
    #[default]
    Base64,
}

impl TransferEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base64 => "base64",
        }
    }
}

/// An email attachment.
///
/// ```
/// use formmail::Attachment;
///
/// let attachment = Attachment::from_bytes("report.pdf", b"%PDF".to_vec());
/// assert_eq!(attachment.content_type, "application/pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Filename shown to the recipient
    pub filename: String,
    /// MIME content type (e.g., "application/pdf", "image/png")
    pub content_type: String,
    /// Raw attachment data
    pub data: Vec<u8>,
    /// Where the data was read from, if it came from disk
    #[serde(default)]
    pub path: Option<String>,
    pub encoding: TransferEncoding,
}

impl Attachment {
    /// Create an attachment from raw bytes.
    ///
    /// Content type is guessed from the filename extension.
    pub fn from_bytes(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let content_type = guess_content_type(&filename);

        Self {
            filename,
            content_type,
            data,
            path: None,
            encoding: TransferEncoding::Base64,
        }
    }

    /// Create an attachment from an uploaded file.
    ///
    /// Reads the temp file in full; the handle is closed before returning.
    /// The original filename is kept and the declared MIME type wins over the
    /// guessed one unless it is blank.
    pub fn from_upload(file: &UploadedFile) -> Result<Self, DispatchError> {
        let data = read_file(Path::new(&file.temp_path))?;

        let content_type = if file.mime_type.trim().is_empty() {
            guess_content_type(&file.original_name)
        } else {
            file.mime_type.clone()
        };

        Ok(Self {
            filename: file.original_name.clone(),
            content_type,
            data,
            path: Some(file.temp_path.clone()),
            encoding: TransferEncoding::Base64,
        })
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Append one attachment per uploaded file to `email`.
///
/// Empty upload slots are skipped. If any file cannot be read the email is
/// left without that file and the error is returned; files bound before it
/// stay attached, but the caller aborts the dispatch anyway.
pub fn bind_attachments(
    email: &mut OutgoingEmail,
    files: &[Option<UploadedFile>],
) -> Result<(), DispatchError> {
    for file in files.iter().flatten() {
        let attachment = Attachment::from_upload(file)?;
        tracing::debug!(
            filename = %attachment.filename,
            content_type = %attachment.content_type,
            size = attachment.size(),
            encoding = attachment.encoding.as_str(),
            "Binding attachment"
        );
        email.attachments.push(attachment);
    }
    Ok(())
}

fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}

fn read_file(path: &Path) -> Result<Vec<u8>, DispatchError> {
    let to_error = |e: std::io::Error| {
        let message = if e.kind() == std::io::ErrorKind::NotFound {
            "file not found".to_string()
        } else {
            e.to_string()
        };
        DispatchError::attachment(path.display().to_string(), message)
    };

    let mut file = File::open(path).map_err(to_error)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(to_error)?;
    Ok(data)
}
