use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Notifier, NotifyError};

/// A message captured by [`RecordingNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// In-memory notifier for tests
///
/// Records every successful send. While failing is switched on, sends
/// return `NotifyError::Transport` and record nothing.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<SentEmail> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last_to(&self, recipient: &str) -> Option<SentEmail> {
        self.sent().into_iter().rev().find(|m| m.recipient == recipient)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_verification_email(
        &self,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("notifier switched to failing".to_string()));
        }

        let message = SentEmail {
            recipient: email.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        match self.sent.lock() {
            Ok(mut sent) => sent.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_fails_on_demand() {
        let notifier = RecordingNotifier::new();
        notifier.send_verification_email("a@x.com", "s", "b1").await.unwrap();

        notifier.set_failing(true);
        assert!(notifier.send_verification_email("a@x.com", "s", "b2").await.is_err());

        notifier.set_failing(false);
        notifier.send_verification_email("b@x.com", "s", "b3").await.unwrap();

        assert_eq!(notifier.sent().len(), 2);
        assert_eq!(notifier.last_to("a@x.com").unwrap().body, "b1");
    }
}
