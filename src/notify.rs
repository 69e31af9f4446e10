// src/notify.rs

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::HrError;

// --- Notifications ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    Success,
    Info,
    Error,
}

/// A transient, user-facing message. Every operation that completes or fails produces
/// exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: NotificationSeverity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: NotificationSeverity::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: NotificationSeverity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NotificationSeverity::Error,
            message: message.into(),
        }
    }

    /// The error notification for a failed operation, using the backend's wording when
    /// it sent one.
    pub fn from_error(err: &HrError, fallback: &str) -> Self {
        Self::error(err.user_message(fallback))
    }
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: Notification);
}

/// Reports the outcome of an operation: `success_message` on `Ok`, the error's user
/// message (or `fallback`) on `Err`. The result is passed through unchanged.
pub fn report<T>(
    notifier: &dyn Notifier,
    result: Result<T, HrError>,
    success_message: impl FnOnce(&T) -> String,
    fallback: &str,
) -> Result<T, HrError> {
    match &result {
        Ok(value) => notifier.send(Notification::success(success_message(value))),
        Err(err) => notifier.send(Notification::from_error(err, fallback)),
    }
    result
}

// --- Console ---

/// Prints successes and info to stdout, errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(&self, notification: Notification) {
        match notification.severity {
            NotificationSeverity::Success => println!("✓ {}", notification.message),
            NotificationSeverity::Info => println!("{}", notification.message),
            NotificationSeverity::Error => eprintln!("✗ {}", notification.message),
        }
    }
}

// --- Recording ---

#[derive(Debug, Default, Clone)]
pub struct NotificationCriteria {
    pub severity: Option<NotificationSeverity>,
    pub message_contains: Option<String>,
}

impl NotificationCriteria {
    pub fn severity(severity: NotificationSeverity) -> Self {
        Self {
            severity: Some(severity),
            ..Default::default()
        }
    }

    pub fn containing(mut self, text: &str) -> Self {
        self.message_contains = Some(text.to_string());
        self
    }

    fn matches(&self, notification: &Notification) -> bool {
        if let Some(severity) = &self.severity {
            if notification.severity != *severity {
                return false;
            }
        }
        if let Some(text) = &self.message_contains {
            if !notification.message.contains(text.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Keeps every notification in memory. Used by tests and by callers that render
/// notifications themselves.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    notifications_sent: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.notifications_sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn clear(&self) {
        self.sent().clear();
    }

    pub fn count(&self, criteria: &NotificationCriteria) -> usize {
        self.sent().iter().filter(|n| criteria.matches(n)).count()
    }

    pub fn expect_notification(&self, criteria: NotificationCriteria) {
        let sent = self.sent();
        assert!(
            sent.iter().any(|n| criteria.matches(n)),
            "Expected notification matching {:?} not found in {:?}",
            criteria,
            *sent
        );
    }

    pub fn expect_no_notification(&self, criteria: NotificationCriteria) {
        let sent = self.sent();
        assert!(
            !sent.iter().any(|n| criteria.matches(n)),
            "Unexpected notification matching {:?} found in {:?}",
            criteria,
            *sent
        );
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: Notification) {
        debug!("Notification recorded: {:?}", notification);
        self.sent().push(notification);
    }
}
