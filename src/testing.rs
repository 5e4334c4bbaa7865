//! Testing utilities and assertion helpers.
//!
//! Assertions over the emails a [`LocalTransport`] captured.
//!
//! # Example
//!
//! ```rust,ignore
//! use formmail::transports::LocalTransport;
//! use formmail::testing::*;
//!
//! #[tokio::test]
//! async fn test_contact_form() {
//!     let transport = LocalTransport::new();
//!     let dispatcher = Dispatcher::new(settings, transport.clone());
//!
//!     dispatcher.send_message(&submission).await.unwrap();
//!
//!     assert_email_count(&transport, 2);
//!     assert_email_to(&transport, "sales@example.com");
//!     assert_no_emails_to(&transport, "admin@example.com");
//!     assert_email_html_matches(&transport, r"<hr>.*Hello");
//! }
//! ```

use regex::Regex;

use crate::storage::StoredEmail;
use crate::transports::LocalTransport;

// ============================================================================
// Helper Functions
// ============================================================================

/// Format a list of emails for error messages.
fn format_email_summary(emails: &[StoredEmail]) -> String {
    if emails.is_empty() {
        return "  (no emails sent)".to_string();
    }

    emails
        .iter()
        .enumerate()
        .map(|(i, stored)| {
            let e = &stored.email;
            let from = e
                .from
                .as_ref()
                .map(|a| a.email.as_str())
                .unwrap_or("<none>");
            format!(
                "  {}. To: {}, From: {}, Subject: \"{}\"",
                i + 1,
                e.to.email,
                from,
                e.subject
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn last_or_panic(transport: &LocalTransport) -> StoredEmail {
    transport
        .last_email()
        .expect("Expected at least one email to be sent, but none were sent")
}

fn preview(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(500)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

// ============================================================================
// Basic Assertions
// ============================================================================

/// Assert that at least one email was sent.
///
/// # Panics
///
/// Panics if no emails were sent.
pub fn assert_email_sent(transport: &LocalTransport) {
    assert!(
        transport.has_emails(),
        "Expected at least one email to be sent, but none were sent"
    );
}

/// Assert that no emails were sent.
///
/// # Panics
///
/// Panics if any email was sent.
pub fn assert_no_emails_sent(transport: &LocalTransport) {
    let emails = transport.emails();
    assert!(
        emails.is_empty(),
        "Expected no emails to be sent, but {} were sent.\n\nEmails sent:\n{}",
        emails.len(),
        format_email_summary(&emails)
    );
}

/// Assert that exactly N emails were sent.
///
/// # Panics
///
/// Panics if the count doesn't match.
pub fn assert_email_count(transport: &LocalTransport, expected: usize) {
    let actual = transport.email_count();
    assert!(
        actual == expected,
        "Expected {} email(s) to be sent, but {} were sent.\n\nEmails sent:\n{}",
        expected,
        actual,
        format_email_summary(&transport.emails())
    );
}

/// Assert that an email was sent to a specific address.
///
/// # Panics
///
/// Panics if no email was sent to the address.
pub fn assert_email_to(transport: &LocalTransport, email: &str) {
    assert!(
        transport.sent_to(email),
        "Expected an email to be sent to '{}'.\n\nEmails sent:\n{}",
        email,
        format_email_summary(&transport.emails())
    );
}

/// Assert that no email was sent to a specific address.
///
/// # Panics
///
/// Panics if an email was sent to the address.
pub fn assert_no_emails_to(transport: &LocalTransport, email: &str) {
    let emails = transport.emails();
    let found = emails
        .iter()
        .find(|stored| stored.email.to.email.eq_ignore_ascii_case(email));

    if let Some(found_email) = found {
        panic!(
            "Expected no email to be sent to '{}', but found one.\n\nMatching email:\n  Subject: \"{}\"\n\nAll emails:\n{}",
            email,
            found_email.email.subject,
            format_email_summary(&emails)
        );
    }
}

/// Assert that an email with the exact subject was sent.
///
/// # Panics
///
/// Panics if no email with the subject was found.
pub fn assert_email_subject(transport: &LocalTransport, subject: &str) {
    let emails = transport.emails();
    let found = emails.iter().any(|stored| stored.email.subject == subject);

    assert!(
        found,
        "Expected an email with subject '{}'.\n\nEmails sent:\n{}",
        subject,
        format_email_summary(&emails)
    );
}

/// Get the last email sent, or panic if none.
///
/// # Panics
///
/// Panics if no emails were sent.
pub fn get_last_email(transport: &LocalTransport) -> StoredEmail {
    last_or_panic(transport)
}

/// Assert the last email has a text body containing text.
///
/// # Panics
///
/// Panics if no email was sent or the text body doesn't contain text.
pub fn assert_email_text_contains(transport: &LocalTransport, text: &str) {
    let last = last_or_panic(transport);
    let body = last.email.text_body.as_str();

    assert!(
        body.contains(text),
        "Expected text body to contain '{}', but it didn't.\n\nLast email:\n{}\n\nText body (first 500 chars):\n{}",
        text,
        format_email_summary(std::slice::from_ref(&last)),
        preview(body)
    );
}

/// Assert the last email's HTML body matches a regex pattern.
///
/// # Panics
///
/// Panics if no email was sent, the pattern is invalid, or the HTML body
/// doesn't match.
pub fn assert_email_html_matches(transport: &LocalTransport, pattern: &str) {
    let last = last_or_panic(transport);
    let html = last.email.html_body.as_deref().unwrap_or("");
    let re = Regex::new(pattern).expect("Invalid regex pattern");

    assert!(
        re.is_match(html),
        "Expected HTML body to match pattern '{}', but it didn't.\n\nLast email:\n{}\n\nHTML body (first 500 chars):\n{}",
        pattern,
        format_email_summary(std::slice::from_ref(&last)),
        preview(html)
    );
}

/// Assert the last email has an attachment with the given filename.
///
/// # Panics
///
/// Panics if no email was sent or no attachment with that name exists.
pub fn assert_email_has_attachment(transport: &LocalTransport, filename: &str) {
    let last = last_or_panic(transport);
    let has_attachment = last.email.attachments.iter().any(|a| a.filename == filename);

    let attachment_list = last
        .email
        .attachments
        .iter()
        .map(|a| a.filename.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    assert!(
        has_attachment,
        "Expected email to have attachment '{}'.\n\nLast email:\n{}\n\nAttachments: [{}]",
        filename,
        format_email_summary(std::slice::from_ref(&last)),
        attachment_list
    );
}
