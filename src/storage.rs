//! Storage trait and in-memory implementation for the local transport.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::email::OutgoingEmail;
use crate::template::{RenderedMessage, TemplateVariables};

/// A captured email with what the transport would have put on the wire.
#[derive(Debug, Clone)]
pub struct StoredEmail {
    /// Unique identifier (doubles as the message ID).
    pub id: String,
    pub email: OutgoingEmail,
    /// Variables the layout was rendered with.
    pub variables: TemplateVariables,
    pub rendered: RenderedMessage,
    /// When the email was "sent" (stored).
    pub sent_at: DateTime<Utc>,
}

/// Trait for captured email storage backends.
pub trait Storage: Send + Sync {
    /// Store an email and return its ID.
    fn push(
        &self,
        email: OutgoingEmail,
        variables: TemplateVariables,
        rendered: RenderedMessage,
    ) -> String;

    /// Get an email by ID.
    fn get(&self, id: &str) -> Option<StoredEmail>;

    /// Get all stored emails, oldest first.
    fn all(&self) -> Vec<StoredEmail>;

    /// Clear all stored emails.
    fn clear(&self);

    fn count(&self) -> usize;

    /// Remove and return all stored emails, oldest first.
    fn flush(&self) -> Vec<StoredEmail>;
}

/// Thread-safe in-memory storage.
///
/// Emails are kept in send order, which is also recipient order for a
/// single dispatch.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    emails: RwLock<HashMap<String, StoredEmail>>,
    /// Insertion order of email IDs.
    order: RwLock<Vec<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage wrapped in an Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Storage for MemoryStorage {
    fn push(
        &self,
        email: OutgoingEmail,
        variables: TemplateVariables,
        rendered: RenderedMessage,
    ) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let stored = StoredEmail {
            id: id.clone(),
            email,
            variables,
            rendered,
            sent_at: Utc::now(),
        };

        let mut emails = self.emails.write();
        let mut order = self.order.write();
        emails.insert(id.clone(), stored);
        order.push(id.clone());

        id
    }

    fn get(&self, id: &str) -> Option<StoredEmail> {
        self.emails.read().get(id).cloned()
    }

    fn all(&self) -> Vec<StoredEmail> {
        let emails = self.emails.read();
        self.order
            .read()
            .iter()
            .filter_map(|id| emails.get(id).cloned())
            .collect()
    }

    fn clear(&self) {
        let mut emails = self.emails.write();
        let mut order = self.order.write();
        emails.clear();
        order.clear();
    }

    fn count(&self) -> usize {
        self.emails.read().len()
    }

    fn flush(&self) -> Vec<StoredEmail> {
        let mut emails = self.emails.write();
        let mut order = self.order.write();

        let result: Vec<StoredEmail> = order
            .drain(..)
            .filter_map(|id| emails.remove(&id))
            .collect();
        emails.clear();
        result
    }
}
