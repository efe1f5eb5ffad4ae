use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use super::{Notifier, NotifyError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Email API client
///
/// Sends `POST {base_url}/email` with a JSON body and a bearer token.
pub struct HttpNotifier {
    http_client: Client,
    endpoint: Url,
    sender: String,
    api_token: String,
}

impl HttpNotifier {
    /// # Errors
    ///
    /// Returns `NotifyError::Config` if `base_url` does not parse or the
    /// HTTP client cannot be built
    pub fn new(base_url: &str, sender: String, api_token: String) -> Result<Self, NotifyError> {
        // A relative join keeps the base path only when it ends in '/'
        let base = if base_url.ends_with('/') {
            Url::parse(base_url)
        } else {
            Url::parse(&format!("{}/", base_url))
        }
        .map_err(|e| NotifyError::Config(e.to_string()))?;
        let endpoint = base
            .join("email")
            .map_err(|e| NotifyError::Config(e.to_string()))?;

        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            sender,
            api_token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[derive(Serialize, Debug)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}

#[async_trait]
impl Notifier for HttpNotifier {
    #[tracing::instrument(name = "Sending verification email", skip_all)]
    async fn send_verification_email(
        &self,
        email: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let request_body = SendEmailRequest {
            from: &self.sender,
            to: email,
            subject,
            html_body: body,
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_token)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Email API rejected message");
            return Err(NotifyError::Rejected(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_for(base_url: &str) -> String {
        HttpNotifier::new(
            base_url,
            "no-reply@todolist.local".to_string(),
            "token".to_string(),
        )
        .unwrap()
        .endpoint()
        .to_string()
    }

    #[test]
    fn test_endpoint_is_joined_to_base() {
        assert_eq!(endpoint_for("https://mail.example.com"), "https://mail.example.com/email");
        assert_eq!(endpoint_for("https://mail.example.com/"), "https://mail.example.com/email");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        assert_eq!(endpoint_for("https://api.x/v1"), "https://api.x/v1/email");
        assert_eq!(
            endpoint_for("https://mail.example.com/api/"),
            "https://mail.example.com/api/email"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpNotifier::new("not a url", String::new(), String::new());
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_transport_error() {
        // Port 9 (discard) on localhost is closed in test environments
        let notifier = HttpNotifier::new(
            "http://127.0.0.1:9",
            "no-reply@todolist.local".to_string(),
            "token".to_string(),
        )
        .unwrap();

        let result = notifier
            .send_verification_email("a@x.com", "Verify your account", "<p>123456</p>")
            .await;
        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }
}
