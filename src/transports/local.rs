//! Local transport for development and testing.
//!
//! Renders each email like a real transport would, then keeps it in memory
//! for programmatic assertions.
//!
//! # Testing Usage
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
//! }
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::email::OutgoingEmail;
use crate::error::DispatchError;
use crate::storage::{MemoryStorage, Storage, StoredEmail};
use crate::template::{render_email, MailLayout, TemplateEngine, TemplateVariables, TeraEngine};
use crate::transport::{DeliveryResult, Transport};

/// Transport that stores emails in memory.
///
/// Clones share storage and failure state.
#[derive(Clone)]
pub struct LocalTransport {
    storage: Arc<MemoryStorage>,
    layout: MailLayout,
    engine: Arc<dyn TemplateEngine>,
    /// If set, send() fails with this message (for testing error paths).
    fail_with: Arc<RwLock<Option<String>>>,
}

impl LocalTransport {
    /// Create a local transport with fresh storage.
    pub fn new() -> Self {
        Self::with_storage(MemoryStorage::shared())
    }

    /// Create a local transport with existing storage.
    pub fn with_storage(storage: Arc<MemoryStorage>) -> Self {
        Self {
            storage,
            layout: MailLayout::default(),
            engine: Arc::new(TeraEngine),
            fail_with: Arc::new(RwLock::new(None)),
        }
    }

    pub fn layout(mut self, layout: MailLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn engine(mut self, engine: impl TemplateEngine + 'static) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn storage(&self) -> Arc<MemoryStorage> {
        Arc::clone(&self.storage)
    }

    // =========================================================================
    // Failure Simulation (for testing)
    // =========================================================================

    /// Make every following send fail with `message`.
    pub fn set_failure(&self, message: impl Into<String>) {
        *self.fail_with.write() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.fail_with.write() = None;
    }

    // =========================================================================
    // Email Access (for testing assertions)
    // =========================================================================

    /// All captured emails, in send order.
    pub fn emails(&self) -> Vec<StoredEmail> {
        self.storage.all()
    }

    /// The most recently sent email.
    pub fn last_email(&self) -> Option<StoredEmail> {
        self.storage.all().pop()
    }

    pub fn email_count(&self) -> usize {
        self.storage.count()
    }

    pub fn has_emails(&self) -> bool {
        self.storage.count() > 0
    }

    pub fn clear(&self) {
        self.storage.clear();
    }

    /// Remove and return all captured emails.
    pub fn flush(&self) -> Vec<StoredEmail> {
        self.storage.flush()
    }

    /// Check if an email was sent to a specific address.
    pub fn sent_to(&self, email: &str) -> bool {
        self.storage
            .all()
            .iter()
            .any(|stored| stored.email.to.email.eq_ignore_ascii_case(email))
    }

    /// Find emails matching a predicate.
    pub fn find_emails<F>(&self, predicate: F) -> Vec<StoredEmail>
    where
        F: Fn(&StoredEmail) -> bool,
    {
        self.storage
            .all()
            .into_iter()
            .filter(|stored| predicate(stored))
            .collect()
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalTransport")
            .field("emails", &self.storage.count())
            .field("layout", &self.layout)
            .field("fail_with", &*self.fail_with.read())
            .finish()
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(
        &self,
        email: &OutgoingEmail,
        variables: &TemplateVariables,
    ) -> Result<DeliveryResult, DispatchError> {
        if let Some(ref message) = *self.fail_with.read() {
            return Err(DispatchError::Transport(message.clone()));
        }

        let rendered = render_email(email, variables, self.engine.as_ref(), &self.layout)?;
        let message_id = self
            .storage
            .push(email.clone(), variables.clone(), rendered);
        Ok(DeliveryResult::new(message_id))
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
