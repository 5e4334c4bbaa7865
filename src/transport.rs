//! Transport trait and delivery result types.
//!
//! The dispatcher stores its transport as `Arc<dyn Transport>` so the
//! concrete transport can be chosen at runtime from environment variables.
//! `#[async_trait]` keeps the trait object-safe.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::email::OutgoingEmail;
use crate::error::DispatchError;
use crate::template::TemplateVariables;

/// Result of a successful send to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    /// Message ID assigned by the transport
    pub message_id: String,
}

impl DeliveryResult {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
        }
    }
}

/// Something that can deliver an [`OutgoingEmail`].
///
/// The transport renders the final subject and bodies from `variables`
/// (see [`render_email`](crate::render_email)) and performs the delivery.
/// Any failure, including template rendering, is a
/// [`DispatchError::Transport`].
///
/// # Example
///
/// ```ignore
/// use formmail::transports::LoggerTransport;
///
/// let transport = LoggerTransport::new();
/// let result = transport.send(&email, &variables).await?;
/// println!("Sent with ID: {}", result.message_id);
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one email to its single recipient.
    async fn send(
        &self,
        email: &OutgoingEmail,
        variables: &TemplateVariables,
    ) -> Result<DeliveryResult, DispatchError>;

    /// Get the transport name (for logging/metrics).
    fn provider_name(&self) -> &'static str {
        "unknown"
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        email: &OutgoingEmail,
        variables: &TemplateVariables,
    ) -> Result<DeliveryResult, DispatchError> {
        (**self).send(email, variables).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
