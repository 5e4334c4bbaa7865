//! Message composition.
//!
//! Turns a [`Submission`] plus [`PluginSettings`] into the subject, sender
//! name and bodies shared by every recipient. Composition is plain text
//! assembly; the templating engine only sees the result through
//! [`TemplateVariables`](crate::TemplateVariables).

use serde::{Deserialize, Serialize};

use crate::settings::PluginSettings;
use crate::submission::Submission;

/// Line between the header fields and the free-text message.
pub const SEPARATOR: &str = "----------------------------------------";

/// Template delimiters and the inert look-alikes that replace them.
///
/// The replacements are HTML character references, so a browser or mail
/// client shows the original characters while a template engine sees no
/// delimiter.
pub const TEMPLATE_ESCAPES: [(&str, &str); 4] = [
    ("{{", "&#123;&#123;"),
    ("}}", "&#125;&#125;"),
    ("{%", "&#123;&#37;"),
    ("%}", "&#37;&#125;"),
];

/// Subject, sender name and bodies for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedMessage {
    /// Display name for the From header
    pub from_name: String,
    pub subject: String,
    pub plain_body: String,
    /// Present only when the submission carried an HTML message
    pub html_body: Option<String>,
}

/// Compose the message for a submission.
///
/// ```
/// use formmail::{compose, PluginSettings, Submission};
///
/// let settings = PluginSettings {
///     to_email: "sales@example.com".into(),
///     prepend_sender: Some("Re:".into()),
///     prepend_subject: None,
/// };
/// let submission = Submission::new("Jan", "jan@example.com").subject("Hi");
///
/// let composed = compose(&submission, &settings);
/// assert_eq!(composed.from_name, "Re: Jan");
/// assert_eq!(composed.subject, "Hi");
/// ```
pub fn compose(submission: &Submission, settings: &PluginSettings) -> ComposedMessage {
    let subject = join_prefix(
        settings.prepend_subject.as_deref(),
        " - ",
        &submission.subject,
    );
    let from_name = join_prefix(
        settings.prepend_sender.as_deref(),
        " ",
        &submission.from_name,
    );

    let plain_body = plain_body(submission, &from_name, &subject);
    let html_body = submission.html().map(|html| {
        escape_template_syntax(&html_body(submission, &from_name, &subject, html))
    });

    ComposedMessage {
        from_name,
        subject,
        plain_body,
        html_body,
    }
}

/// Replace template delimiters with inert look-alikes.
///
/// Applied to every HTML body, whatever its origin.
///
/// ```
/// use formmail::escape_template_syntax;
///
/// assert_eq!(escape_template_syntax("{{7*7}}"), "&#123;&#123;7*7&#125;&#125;");
/// ```
pub fn escape_template_syntax(input: &str) -> String {
    TEMPLATE_ESCAPES
        .iter()
        .fold(input.to_string(), |acc, (token, inert)| acc.replace(token, inert))
}

fn join_prefix(prefix: Option<&str>, glue: &str, value: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() && !value.is_empty() => {
            format!("{}{}{}", prefix, glue, value)
        }
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => value.to_string(),
    }
}

/// Header lines use the prefixed sender name and subject.
fn plain_body(submission: &Submission, from_name: &str, subject: &str) -> String {
    format!(
        "Name: {}\nEmail: {}\nPhone: {}\nSubject: {}\n{}\n{}",
        from_name,
        submission.from_email,
        submission.from_phone.as_deref().unwrap_or_default(),
        subject,
        SEPARATOR,
        submission.message,
    )
}

fn html_body(
    submission: &Submission,
    from_name: &str,
    subject: &str,
    html_message: &str,
) -> String {
    let field = |label: &str, value: &str| {
        format!("<p><strong>{}:</strong> {}</p>\n", label, escape_html(value))
    };

    let mut body = String::new();
    body.push_str(&field("Name", from_name));
    body.push_str(&field("Email", &submission.from_email));
    body.push_str(&field(
        "Phone",
        submission.from_phone.as_deref().unwrap_or_default(),
    ));
    body.push_str(&field("Subject", subject));
    body.push_str("<hr>\n");
    body.push_str(html_message);
    body
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(sender: Option<&str>, subject: Option<&str>) -> PluginSettings {
        PluginSettings {
            to_email: "sales@example.com".into(),
            prepend_sender: sender.map(str::to_string),
            prepend_subject: subject.map(str::to_string),
        }
    }

    #[test]
    fn test_sender_prefix() {
        let submission = Submission::new("Jan", "jan@example.com");

        let composed = compose(&submission, &settings(Some("Re:"), None));
        assert_eq!(composed.from_name, "Re: Jan");

        let composed = compose(&submission, &settings(None, None));
        assert_eq!(composed.from_name, "Jan");

        let composed = compose(&submission, &settings(Some(""), None));
        assert_eq!(composed.from_name, "Jan");
    }

    #[test]
    fn test_subject_prefix() {
        let submission = Submission::new("Jan", "jan@example.com").subject("Quote");

        let composed = compose(&submission, &settings(None, Some("[Web]")));
        assert_eq!(composed.subject, "[Web] - Quote");

        let composed = compose(&submission, &settings(None, None));
        assert_eq!(composed.subject, "Quote");
    }

    #[test]
    fn test_prefix_without_value() {
        let submission = Submission::new("", "jan@example.com");
        let composed = compose(&submission, &settings(Some("Web"), Some("[Web]")));
        assert_eq!(composed.from_name, "Web");
        assert_eq!(composed.subject, "[Web]");
    }

    #[test]
    fn test_plain_body_layout() {
        let submission = Submission::new("Jan", "jan@example.com")
            .phone("555-0100")
            .subject("Quote")
            .message("Line one\nLine two");

        let composed = compose(&submission, &settings(Some("Re:"), Some("[Web]")));
        assert_eq!(
            composed.plain_body,
            format!(
                "Name: Re: Jan\nEmail: jan@example.com\nPhone: 555-0100\nSubject: [Web] - Quote\n{}\nLine one\nLine two",
                SEPARATOR
            )
        );
        assert_eq!(composed.html_body, None);
    }

    #[test]
    fn test_plain_body_without_prefixes() {
        let submission = Submission::new("Jan", "jan@example.com")
            .subject("Quote")
            .message("Hi");

        let composed = compose(&submission, &settings(None, None));
        assert!(composed.plain_body.starts_with("Name: Jan\n"));
        assert!(composed.plain_body.contains("\nSubject: Quote\n"));
    }

    #[test]
    fn test_html_body_uses_prefixed_fields() {
        let submission = Submission::new("Jan", "jan@example.com")
            .subject("Quote")
            .html_message("<p>Hi</p>");

        let html = compose(&submission, &settings(Some("Re:"), Some("[Web]")))
            .html_body
            .unwrap();
        assert!(html.starts_with("<p><strong>Name:</strong> Re: Jan</p>\n"));
        assert!(html.contains("<p><strong>Subject:</strong> [Web] - Quote</p>\n<hr>"));
    }

    #[test]
    fn test_plain_body_without_phone() {
        let submission = Submission::new("Jan", "jan@example.com").message("Hi");
        let composed = compose(&submission, &settings(None, None));
        assert!(composed.plain_body.contains("Phone: \n"));
    }

    #[test]
    fn test_html_body_escapes_template_syntax() {
        let submission = Submission::new("Jan", "jan@example.com")
            .message("{{7*7}}")
            .html_message("<p>{{7*7}} {% if x %}y{% endif %}</p>");

        let html = compose(&submission, &settings(None, None)).html_body.unwrap();
        assert!(html.contains("&#123;&#123;7*7&#125;&#125;"));
        assert!(html.contains("&#123;&#37; if x &#37;&#125;"));
        assert!(!html.contains("{{"));
        assert!(!html.contains("{%"));
        assert!(!html.contains("49"));
    }

    #[test]
    fn test_html_body_escapes_header_fields() {
        let submission = Submission::new("<b>Jan</b> {{name}}", "jan@example.com")
            .html_message("<p>Hello</p>");

        let html = compose(&submission, &settings(None, None)).html_body.unwrap();
        assert!(html.contains("&lt;b&gt;Jan&lt;/b&gt; &#123;&#123;name&#125;&#125;"));
        assert!(html.contains("<hr>\n<p>Hello</p>"));
    }

    #[test]
    fn test_escape_table() {
        assert_eq!(escape_template_syntax("{{"), "&#123;&#123;");
        assert_eq!(escape_template_syntax("}}"), "&#125;&#125;");
        assert_eq!(escape_template_syntax("{%"), "&#123;&#37;");
        assert_eq!(escape_template_syntax("%}"), "&#37;&#125;");
        assert_eq!(escape_template_syntax("{ x } % y"), "{ x } % y");
    }

    #[test]
    fn test_escape_leaves_no_delimiters() {
        let escaped = escape_template_syntax("{{{%}}%}{{%}");
        for (token, _) in TEMPLATE_ESCAPES {
            assert!(!escaped.contains(token), "{} left in {}", token, escaped);
        }
    }
}
