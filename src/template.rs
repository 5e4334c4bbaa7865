//! Rendering the final subject and bodies.
//!
//! Transports do not send composed text verbatim. They render a
//! [`MailLayout`] with two variables, `subject` and `body`, through a
//! [`TemplateEngine`]. The default engine is Tera.
//!
//! # Example
//!
//! ```
//! use formmail::{MailLayout, OutgoingEmail, TemplateVariables, TeraEngine, render_email};
//!
//! let layout = MailLayout::default().subject("[Contact] {{ subject }}");
//! let email = OutgoingEmail::new("sales@example.com").text_body("Hello");
//! let vars = TemplateVariables::new("Quote", "Hello");
//!
//! let rendered = render_email(&email, &vars, &TeraEngine, &layout).unwrap();
//! assert_eq!(rendered.subject, "[Contact] Quote");
//! ```

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use crate::email::OutgoingEmail;
use crate::error::DispatchError;

/// The two named variables every layout can use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateVariables {
    pub subject: String,
    pub body: String,
}

impl TemplateVariables {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Same subject, different body.
    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self {
            subject: self.subject.clone(),
            body: body.into(),
        }
    }
}

/// Output format of a rendered template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Html,
}

/// A templating engine that substitutes [`TemplateVariables`].
pub trait TemplateEngine: Send + Sync {
    /// Render `template` with `vars`.
    ///
    /// Errors are reported as [`DispatchError::Transport`].
    fn render(
        &self,
        template: &str,
        vars: &TemplateVariables,
        format: Format,
    ) -> Result<String, DispatchError>;
}

/// Tera-backed engine.
///
/// HTML templates are auto-escaped; use `| safe` for the HTML body.
#[derive(Debug, Clone, Copy, Default)]
pub struct TeraEngine;

impl TemplateEngine for TeraEngine {
    fn render(
        &self,
        template: &str,
        vars: &TemplateVariables,
        format: Format,
    ) -> Result<String, DispatchError> {
        let mut context = Context::new();
        context.insert("subject", &vars.subject);
        context.insert("body", &vars.body);
        Ok(Tera::one_off(template, &context, format == Format::Html)?)
    }
}

/// Layout templates for the subject and both bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailLayout {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl Default for MailLayout {
    fn default() -> Self {
        Self {
            subject: "{{ subject }}".to_string(),
            text: "{{ body }}".to_string(),
            html: "{{ body | safe }}".to_string(),
        }
    }
}

impl MailLayout {
    pub fn subject(mut self, template: impl Into<String>) -> Self {
        self.subject = template.into();
        self
    }

    pub fn text(mut self, template: impl Into<String>) -> Self {
        self.text = template.into();
        self
    }

    pub fn html(mut self, template: impl Into<String>) -> Self {
        self.html = template.into();
        self
    }
}

/// Final text ready to put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Render an email's layout.
///
/// The text layout gets `body` from `vars`. The HTML layout, rendered only
/// when the email has an HTML body, gets that HTML body as `body`.
pub fn render_email(
    email: &OutgoingEmail,
    vars: &TemplateVariables,
    engine: &dyn TemplateEngine,
    layout: &MailLayout,
) -> Result<RenderedMessage, DispatchError> {
    let subject = engine.render(&layout.subject, vars, Format::Text)?;
    let text = engine.render(&layout.text, vars, Format::Text)?;
    let html = match email.html_body {
        Some(ref html) => {
            let html_vars = vars.with_body(html.as_str());
            Some(engine.render(&layout.html, &html_vars, Format::Html)?)
        }
        None => None,
    };

    Ok(RenderedMessage {
        subject,
        text,
        html,
    })
}
