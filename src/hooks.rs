//! Extension hooks fired while a submission is dispatched.
//!
//! Two extension points exist:
//!
//! - [`BeforeMessageCompile`] fires once per submission, before the message
//!   is composed. Observers may edit the submission or cancel the dispatch.
//! - [`BeforeSend`] fires once per recipient, before the transport call.
//!   Observers may edit the email or cancel the send for that recipient.
//!
//! # Example
//!
//! ```rust,ignore
//! use formmail::{BeforeSend, Cancellable, Dispatcher};
//!
//! let dispatcher = Dispatcher::new(settings, transport)
//!     .on_before_send(|event: &mut BeforeSend| {
//!         if event.recipient.ends_with("@blocked.example") {
//!             event.cancel();
//!         }
//!     });
//! ```

use std::fmt;

use crate::email::OutgoingEmail;
use crate::submission::Submission;
use crate::template::TemplateVariables;

/// An event that observers can cancel.
pub trait Cancellable {
    /// Mark the event cancelled. Remaining observers are not invoked.
    fn cancel(&mut self);

    fn is_cancelled(&self) -> bool;
}

/// Fired before a submission is composed into a message.
#[derive(Debug, Clone)]
pub struct BeforeMessageCompile {
    /// Copy of the submission; edits here are what gets composed
    pub submission: Submission,
    cancelled: bool,
}

impl BeforeMessageCompile {
    pub fn new(submission: Submission) -> Self {
        Self {
            submission,
            cancelled: false,
        }
    }
}

impl Cancellable for BeforeMessageCompile {
    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Fired before an email is handed to the transport.
#[derive(Debug, Clone)]
pub struct BeforeSend {
    /// The recipient this email is addressed to
    pub recipient: String,
    pub email: OutgoingEmail,
    /// Variables the transport will render the layout with
    pub variables: TemplateVariables,
    cancelled: bool,
}

impl BeforeSend {
    pub fn new(
        recipient: impl Into<String>,
        email: OutgoingEmail,
        variables: TemplateVariables,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            email,
            variables,
            cancelled: false,
        }
    }
}

impl Cancellable for BeforeSend {
    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Code registered at an extension point.
///
/// For simple cases, use a closure:
///
/// ```rust,ignore
/// dispatcher.on_before_send(|event: &mut BeforeSend| {
///     event.email.headers.insert("X-Form".into(), "contact".into());
/// })
/// ```
///
/// For observers with their own state, implement the trait on a struct.
pub trait Observer<E>: Send + Sync {
    fn observe(&self, event: &mut E);
}

impl<E, F> Observer<E> for F
where
    F: Fn(&mut E) + Send + Sync,
{
    fn observe(&self, event: &mut E) {
        (self)(event)
    }
}

/// Ordered list of observers for one extension point.
pub struct Hooks<E> {
    observers: Vec<Box<dyn Observer<E>>>,
}

impl<E: Cancellable> Hooks<E> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Append an observer. Observers run in registration order.
    pub fn register<O>(&mut self, observer: O)
    where
        O: Observer<E> + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Invoke observers in order until one cancels the event.
    ///
    /// Returns `true` if the event was not cancelled.
    pub fn fire(&self, event: &mut E) -> bool {
        for observer in &self.observers {
            observer.observe(event);
            if event.is_cancelled() {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<E: Cancellable> Default for Hooks<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Hooks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Rename(&'static str);

    impl Observer<BeforeMessageCompile> for Rename {
        fn observe(&self, event: &mut BeforeMessageCompile) {
            event.submission.from_name = self.0.to_string();
        }
    }

    #[test]
    fn test_runs_in_registration_order() {
        let mut hooks: Hooks<BeforeMessageCompile> = Hooks::new();
        assert!(hooks.is_empty());
        hooks.register(Rename("first"));
        assert!(!hooks.is_empty());
        hooks.register(|event: &mut BeforeMessageCompile| {
            event.submission.from_name.push_str("-second");
        });

        let mut event = BeforeMessageCompile::new(Submission::new("Jan", "jan@example.com"));
        assert!(hooks.fire(&mut event));
        assert_eq!(event.submission.from_name, "first-second");
    }

    #[test]
    fn test_cancel_stops_remaining_observers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut hooks: Hooks<BeforeMessageCompile> = Hooks::new();
        hooks.register(|event: &mut BeforeMessageCompile| event.cancel());
        let counter = Arc::clone(&calls);
        hooks.register(move |_: &mut BeforeMessageCompile| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let mut event = BeforeMessageCompile::new(Submission::default());
        assert!(!hooks.fire(&mut event));
        assert!(event.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_hooks_pass_through() {
        let hooks: Hooks<BeforeSend> = Hooks::default();
        assert!(hooks.is_empty());

        let mut event = BeforeSend::new(
            "a@x.com",
            OutgoingEmail::new("a@x.com"),
            TemplateVariables::new("s", "b"),
        );
        assert!(hooks.fire(&mut event));
        assert!(!event.is_cancelled());
    }
}
