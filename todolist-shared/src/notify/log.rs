use async_trait::async_trait;

use super::{Notifier, NotifyError};

/// Logs verification emails instead of sending them
///
/// Used when no email API is configured, so a developer can read the code
/// from the server log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification_email(
        &self,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        tracing::info!(recipient = %email, subject, body, "Verification email (not sent)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let result = LogNotifier::new()
            .send_verification_email("a@x.com", "Verify your account", "<p>123456</p>")
            .await;
        assert!(result.is_ok());
    }
}
