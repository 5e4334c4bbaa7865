//! Email address type with optional display name.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An email address with an optional display name.
///
/// Addresses coming from a form submission are not trusted to be valid, so
/// construction never fails. Use [`Address::is_valid`] to check one.
///
/// ```
/// use formmail::Address;
///
/// let addr = Address::with_name("Jan", "jan@example.com");
/// assert_eq!(addr.formatted(), "Jan <jan@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name (e.g., "Jan Novak")
    pub name: Option<String>,
    /// Email address (e.g., "jan@example.com")
    pub email: String,
}

impl Address {
    /// Create a new address with just an email.
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        if !Self::basic_sanity_check(&email) {
            tracing::warn!(email = %email, "Creating address with potentially invalid email");
        }
        Self { name: None, email }
    }

    /// Create a new address with a display name.
    ///
    /// An empty name is treated as no name at all.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        let mut addr = Self::new(email);
        if !name.is_empty() {
            addr.name = Some(name);
        }
        addr
    }

    fn basic_sanity_check(email: &str) -> bool {
        !email.is_empty() && email.contains('@')
    }

    /// RFC 5321/5322 validation of the address part.
    pub fn is_valid(&self) -> bool {
        EmailAddress::is_valid(&self.email)
    }

    /// Format as "Name <email>" or just "email" if no name.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

impl From<(&str, &str)> for Address {
    fn from((name, email): (&str, &str)) -> Self {
        Self::with_name(name, email)
    }
}
