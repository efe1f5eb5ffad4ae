/// Outbound verification email
///
/// The verification engine only knows the [`Notifier`] port. Adapters:
///
/// - [`http::HttpNotifier`]: POSTs the message to an HTTP email API
/// - [`log::LogNotifier`]: writes the message to the log, for local runs
/// - [`recording::RecordingNotifier`]: keeps messages in memory and can be
///   told to fail
///
/// # Example
///
/// ```
/// use todolist_shared::notify::{recording::RecordingNotifier, Notifier};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let notifier = RecordingNotifier::new();
/// notifier
///     .send_verification_email("alice@example.com", "Verify your account", "<p>123456</p>")
///     .await?;
///
/// assert_eq!(notifier.sent().len(), 1);
/// # Ok(())
/// # }
/// ```

pub mod http;
pub mod log;
pub mod recording;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Request could not be built or sent
    #[error("Email request failed: {0}")]
    Transport(String),

    /// Email API answered with a non-success status
    #[error("Email API rejected the message with status {0}")]
    Rejected(u16),

    /// Adapter configuration is unusable
    #[error("Invalid email configuration: {0}")]
    Config(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one verification email; `body` is HTML
    async fn send_verification_email(
        &self,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError>;
}
